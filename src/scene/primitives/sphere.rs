use simba::simd::WideF64x4;

use crate::{
    error::SphereResult,
    geometry::{FloatType, SimdFloatType, WorldVector, WorldVector4},
    scene::{batch::Column, shape::{ShapeKind, ShapeType}},
    util::simba::length3,
};

use super::{Primitive, check_size};

#[derive(Clone, Debug, PartialEq)]
pub struct Sphere {
    pub radius: FloatType,
}

#[derive(Clone, Debug, Default)]
pub struct SphereLanes {
    radius: Column,
}

impl Primitive for Sphere {
    type Lanes = SphereLanes;

    const SHAPE_TYPE: ShapeType = ShapeType::Sphere;

    fn sentinel() -> Self {
        Sphere { radius: 0.0 }
    }

    fn from_kind(kind: &ShapeKind) -> Option<&Self> {
        match kind {
            ShapeKind::Sphere(p) => Some(p),
            _ => None,
        }
    }

    fn validate(&self) -> SphereResult {
        check_size("sphere radius", self.radius)
    }

    fn store(&self, lanes: &mut SphereLanes, slot: usize) {
        lanes.radius.set(slot, self.radius);
    }

    fn distance(&self, local: &WorldVector) -> FloatType {
        local.norm() - self.radius
    }

    fn distance_squared(&self, local: &WorldVector) -> FloatType {
        let d = local.norm() - self.radius;
        d * d.abs()
    }

    #[inline(always)]
    fn batch_distance(lanes: &SphereLanes, group: usize, local: &WorldVector4) -> SimdFloatType {
        WideF64x4(length3(local.x.0, local.y.0, local.z.0) - lanes.radius.group(group))
    }
}
