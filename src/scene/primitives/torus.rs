use simba::simd::WideF64x4;

use crate::{
    error::SphereResult,
    geometry::{FloatType, PlaneVector, SimdFloatType, WorldVector, WorldVector4},
    scene::{batch::Column, shape::{ShapeKind, ShapeType}},
    util::simba::length2,
};

use super::{Primitive, check_size};

/// Torus lying in the local xz plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Torus {
    /// Radius of the circle going through the middle of the tube.
    pub r1: FloatType,
    /// Radius of the tube.
    pub r2: FloatType,
}

#[derive(Clone, Debug, Default)]
pub struct TorusLanes {
    r1: Column,
    r2: Column,
}

impl Torus {
    fn tube_center_offset(&self, local: &WorldVector) -> PlaneVector {
        PlaneVector::new(PlaneVector::new(local.x, local.z).norm() - self.r1, local.y)
    }
}

impl Primitive for Torus {
    type Lanes = TorusLanes;

    const SHAPE_TYPE: ShapeType = ShapeType::Torus;

    fn sentinel() -> Self {
        Torus { r1: 0.0, r2: 0.0 }
    }

    fn from_kind(kind: &ShapeKind) -> Option<&Self> {
        match kind {
            ShapeKind::Torus(p) => Some(p),
            _ => None,
        }
    }

    fn validate(&self) -> SphereResult {
        check_size("torus r1", self.r1)?;
        check_size("torus r2", self.r2)
    }

    fn store(&self, lanes: &mut TorusLanes, slot: usize) {
        lanes.r1.set(slot, self.r1);
        lanes.r2.set(slot, self.r2);
    }

    fn distance(&self, local: &WorldVector) -> FloatType {
        self.tube_center_offset(local).norm() - self.r2
    }

    fn distance_squared(&self, local: &WorldVector) -> FloatType {
        let d = self.distance(local);
        d * d.abs()
    }

    #[inline(always)]
    fn batch_distance(lanes: &TorusLanes, group: usize, local: &WorldVector4) -> SimdFloatType {
        let qx = length2(local.x.0, local.z.0) - lanes.r1.group(group);
        WideF64x4(length2(qx, local.y.0) - lanes.r2.group(group))
    }
}
