use simba::simd::WideF64x4;
use wide::{CmpLt as _, f64x4};

use crate::{
    error::SphereResult,
    geometry::{FloatType, PlaneVector, SimdFloatType, WorldVector, WorldVector4},
    scene::{batch::Column, shape::{ShapeKind, ShapeType}},
    util::simba::{clamp, length2, length2_squared},
};

use super::{Primitive, check_size};

/// Capped cone (frustum) along the local y axis, centered at the shape position.
///
/// `k1` and `k2` describe the slanted side in the (radial, y) half plane and
/// are derived from the form once at construction.
/// Degenerate cones (zero height and equal radii) divide by zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Cone {
    /// Radius of the bottom cap (at y = -height).
    r1: FloatType,
    /// Radius of the top cap (at y = +height).
    r2: FloatType,
    /// Half of the height.
    height: FloatType,

    k1: PlaneVector,
    k2: PlaneVector,
    k2_dot_inv: FloatType,
}

#[derive(Clone, Debug, Default)]
pub struct ConeLanes {
    r1: Column,
    r2: Column,
    height: Column,
    k2_x: Column,
    k2_dot_inv: Column,
}

impl Cone {
    pub fn new(r1: FloatType, r2: FloatType, height: FloatType) -> Self {
        let k1 = PlaneVector::new(r2, height);
        let k2 = PlaneVector::new(r2 - r1, 2.0 * height);
        Cone {
            r1,
            r2,
            height,
            k1,
            k2,
            k2_dot_inv: 1.0 / k2.norm_squared(),
        }
    }

    /// `[r1, r2, height]`, in the order used by the scene description.
    pub fn form(&self) -> [FloatType; 3] {
        [self.r1, self.r2, self.height]
    }

    /// Sign of the distance and its square.
    fn signed_distance_squared(&self, local: &WorldVector) -> (FloatType, FloatType) {
        let q = PlaneVector::new(PlaneVector::new(local.x, local.z).norm(), local.y);

        let cap_radius = if q.y < 0.0 { self.r1 } else { self.r2 };
        let ca = PlaneVector::new(q.x - q.x.min(cap_radius), q.y.abs() - self.height);

        let t = ((self.k1 - q).dot(&self.k2) * self.k2_dot_inv).clamp(0.0, 1.0);
        let cb = q - self.k1 + self.k2 * t;

        let sign = if cb.x < 0.0 && ca.y < 0.0 { -1.0 } else { 1.0 };
        (sign, ca.norm_squared().min(cb.norm_squared()))
    }
}

impl Primitive for Cone {
    type Lanes = ConeLanes;

    const SHAPE_TYPE: ShapeType = ShapeType::Cone;

    /// Unit height keeps `k2` non-zero in the padding slots.
    fn sentinel() -> Self {
        Cone::new(0.0, 0.0, 1.0)
    }

    fn from_kind(kind: &ShapeKind) -> Option<&Self> {
        match kind {
            ShapeKind::Cone(p) => Some(p),
            _ => None,
        }
    }

    fn validate(&self) -> SphereResult {
        check_size("cone r1", self.r1)?;
        check_size("cone r2", self.r2)?;
        check_size("cone height", self.height)
    }

    fn store(&self, lanes: &mut ConeLanes, slot: usize) {
        lanes.r1.set(slot, self.r1);
        lanes.r2.set(slot, self.r2);
        lanes.height.set(slot, self.height);
        lanes.k2_x.set(slot, self.k2.x);
        lanes.k2_dot_inv.set(slot, self.k2_dot_inv);
    }

    fn distance(&self, local: &WorldVector) -> FloatType {
        let (sign, squared) = self.signed_distance_squared(local);
        sign * squared.sqrt()
    }

    fn distance_squared(&self, local: &WorldVector) -> FloatType {
        let (sign, squared) = self.signed_distance_squared(local);
        sign * squared
    }

    /// `k1 = (r2, height)` and `k2.y = 2 * height` are rebuilt from the stored columns.
    #[inline(always)]
    fn batch_distance(lanes: &ConeLanes, group: usize, local: &WorldVector4) -> SimdFloatType {
        let zero = f64x4::ZERO;
        let r1 = lanes.r1.group(group);
        let r2 = lanes.r2.group(group);
        let h = lanes.height.group(group);
        let k2x = lanes.k2_x.group(group);
        let k2y = h + h;

        let qx = length2(local.x.0, local.z.0);
        let qy = local.y.0;

        let cap_radius = qy.cmp_lt(zero).blend(r1, r2);
        let cax = qx - qx.min(cap_radius);
        let cay = qy.abs() - h;

        let t = clamp(
            (h - qy).mul_add(k2y, (r2 - qx) * k2x) * lanes.k2_dot_inv.group(group),
            zero,
            f64x4::ONE,
        );
        let cbx = k2x.mul_add(t, qx - r2);
        let cby = k2y.mul_add(t, qy - h);

        let sign = (cbx.cmp_lt(zero) & cay.cmp_lt(zero))
            .blend(f64x4::splat(-1.0), f64x4::ONE);
        let squared = length2_squared(cax, cay).min(length2_squared(cbx, cby));

        WideF64x4(sign * squared.sqrt())
    }
}
