use simba::simd::WideF64x4;
use wide::f64x4;

use crate::{
    error::SphereResult,
    geometry::{FloatType, SimdFloatType, WorldVector, WorldVector4},
    scene::{batch::Column, shape::{ShapeKind, ShapeType}},
    util::simba::length3,
};

use super::{Primitive, check_size};

/// Axis aligned box (in its local frame), centered at the shape position.
#[derive(Clone, Debug, PartialEq)]
pub struct Cuboid {
    /// Half sizes along each axis.
    pub extents: WorldVector,
}

#[derive(Clone, Debug, Default)]
pub struct CuboidLanes {
    extent_x: Column,
    extent_y: Column,
    extent_z: Column,
}

impl Cuboid {
    /// Per axis distance outside of the box, zero for axes where the point is within the slab.
    fn outside(&self, local: &WorldVector) -> WorldVector {
        (local.abs() - self.extents).map(|c| c.max(0.0))
    }
}

impl Primitive for Cuboid {
    type Lanes = CuboidLanes;

    const SHAPE_TYPE: ShapeType = ShapeType::Box;

    fn sentinel() -> Self {
        Cuboid {
            extents: WorldVector::zeros(),
        }
    }

    fn from_kind(kind: &ShapeKind) -> Option<&Self> {
        match kind {
            ShapeKind::Box(p) => Some(p),
            _ => None,
        }
    }

    fn validate(&self) -> SphereResult {
        check_size("box extent x", self.extents.x)?;
        check_size("box extent y", self.extents.y)?;
        check_size("box extent z", self.extents.z)
    }

    fn store(&self, lanes: &mut CuboidLanes, slot: usize) {
        lanes.extent_x.set(slot, self.extents.x);
        lanes.extent_y.set(slot, self.extents.y);
        lanes.extent_z.set(slot, self.extents.z);
    }

    fn distance(&self, local: &WorldVector) -> FloatType {
        self.outside(local).norm()
    }

    fn distance_squared(&self, local: &WorldVector) -> FloatType {
        self.outside(local).norm_squared()
    }

    #[inline(always)]
    fn batch_distance(lanes: &CuboidLanes, group: usize, local: &WorldVector4) -> SimdFloatType {
        let zero = f64x4::ZERO;
        let x = (local.x.0.abs() - lanes.extent_x.group(group)).max(zero);
        let y = (local.y.0.abs() - lanes.extent_y.group(group)).max(zero);
        let z = (local.z.0.abs() - lanes.extent_z.group(group)).max(zero);
        WideF64x4(length3(x, y, z))
    }
}
