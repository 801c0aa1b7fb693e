mod cone;
mod cuboid;
mod octahedron;
mod plane;
mod sphere;
mod torus;

use std::fmt::Debug;

pub use cone::{Cone, ConeLanes};
pub use cuboid::{Cuboid, CuboidLanes};
pub use octahedron::{Octahedron, OctahedronLanes};
pub use plane::{Plane, PlaneLanes};
pub use sphere::{Sphere, SphereLanes};
pub use torus::{Torus, TorusLanes};

use crate::{
    error::{SphereError, SphereResult},
    geometry::{FloatType, SimdFloatType, WorldVector, WorldVector4},
    scene::shape::{ShapeKind, ShapeType},
};

/// Kind specific part of a shape: its parameters, its signed distance function
/// and the 4-wide kernel working on the struct-of-arrays form of the parameters.
///
/// All distances are evaluated in the local frame of the shape, translation and
/// rotation are already applied by the caller.
pub trait Primitive: Clone + Debug + PartialEq + Into<ShapeKind> {
    /// Parameter columns of a whole batch of this kind.
    type Lanes: Clone + Debug + Default + Send + Sync;

    const SHAPE_TYPE: ShapeType;

    /// Parameters stored into unused batch slots.
    /// Together with the sentinel position they keep the slot far away from any query point.
    fn sentinel() -> Self;

    /// Kind specific part of a shape, if the shape is of this kind.
    fn from_kind(kind: &ShapeKind) -> Option<&Self>;

    fn validate(&self) -> SphereResult {
        Ok(())
    }

    fn store(&self, lanes: &mut Self::Lanes, slot: usize);

    fn distance(&self, local: &WorldVector) -> FloatType;

    /// Sign preserving square of the distance, `d * |d|`.
    fn distance_squared(&self, local: &WorldVector) -> FloatType;

    /// Distances of the four shapes stored in `group` of the columns.
    fn batch_distance(lanes: &Self::Lanes, group: usize, local: &WorldVector4) -> SimdFloatType;
}

fn check_size(what: &str, value: FloatType) -> SphereResult {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(SphereError::InvalidParams(format!(
            "{what} must not be negative, got {value}"
        )))
    }
}
