use simba::simd::WideF64x4;
use wide::{CmpLt as _, f64x4};

use crate::{
    error::SphereResult,
    geometry::{FloatType, SimdFloatType, WorldVector, WorldVector4},
    scene::{batch::Column, shape::{ShapeKind, ShapeType}},
    util::simba::{clamp, length3},
};

use super::{Primitive, check_size};

const FRAC_1_SQRT_3: FloatType = 0.577_350_269_189_625_8;

/// Regular octahedron with vertices on the local axes.
#[derive(Clone, Debug, PartialEq)]
pub struct Octahedron {
    /// Distance from the center to a vertex.
    pub size: FloatType,
}

#[derive(Clone, Debug, Default)]
pub struct OctahedronLanes {
    size: Column,
}

enum Feature {
    /// Vector from the nearest point on an edge or vertex.
    Edge(WorldVector),
    /// Signed distance from the plane of the nearest face.
    Face(FloatType),
}

impl Octahedron {
    fn nearest_feature(&self, local: &WorldVector) -> Feature {
        let s = self.size;
        let a = local.abs();
        let m = a.x + a.y + a.z - s;

        let q = if 3.0 * a.x < m {
            a
        } else if 3.0 * a.y < m {
            WorldVector::new(a.y, a.z, a.x)
        } else if 3.0 * a.z < m {
            WorldVector::new(a.z, a.x, a.y)
        } else {
            return Feature::Face(m * FRAC_1_SQRT_3);
        };

        let k = (0.5 * (q.z - q.y + s)).max(0.0).min(s);
        Feature::Edge(WorldVector::new(q.x, q.y - s + k, q.z - k))
    }
}

impl Primitive for Octahedron {
    type Lanes = OctahedronLanes;

    const SHAPE_TYPE: ShapeType = ShapeType::Octahedron;

    fn sentinel() -> Self {
        Octahedron { size: 0.0 }
    }

    fn from_kind(kind: &ShapeKind) -> Option<&Self> {
        match kind {
            ShapeKind::Octahedron(p) => Some(p),
            _ => None,
        }
    }

    fn validate(&self) -> SphereResult {
        check_size("octahedron size", self.size)
    }

    fn store(&self, lanes: &mut OctahedronLanes, slot: usize) {
        lanes.size.set(slot, self.size);
    }

    fn distance(&self, local: &WorldVector) -> FloatType {
        match self.nearest_feature(local) {
            Feature::Edge(v) => v.norm(),
            Feature::Face(d) => d,
        }
    }

    fn distance_squared(&self, local: &WorldVector) -> FloatType {
        match self.nearest_feature(local) {
            Feature::Edge(v) => v.norm_squared(),
            Feature::Face(d) => d * d.abs(),
        }
    }

    /// All three axis permutations are evaluated and blended, priority x, y, z
    /// as in the scalar version.
    #[inline(always)]
    fn batch_distance(
        lanes: &OctahedronLanes,
        group: usize,
        local: &WorldVector4,
    ) -> SimdFloatType {
        let s = lanes.size.group(group);
        let ax = local.x.0.abs();
        let ay = local.y.0.abs();
        let az = local.z.0.abs();
        let m = ax + ay + az - s;

        let three = f64x4::splat(3.0);
        let use_x = (three * ax).cmp_lt(m);
        let use_y = (three * ay).cmp_lt(m);
        let use_z = (three * az).cmp_lt(m);

        let qx = use_x.blend(ax, use_y.blend(ay, az));
        let qy = use_x.blend(ay, use_y.blend(az, ax));
        let qz = use_x.blend(az, use_y.blend(ax, ay));

        let k = clamp(f64x4::splat(0.5) * (qz - qy + s), f64x4::ZERO, s);
        let edge = length3(qx, qy - s + k, qz - k);
        let face = m * f64x4::splat(FRAC_1_SQRT_3);

        WideF64x4((use_x | use_y | use_z).blend(edge, face))
    }
}
