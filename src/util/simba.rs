//! Small helpers over the simba wrapped `wide` vectors, used by the batch kernels.
//! Kernels work on the inner `wide::f64x4` directly, simba doesn't expose FMA and
//! blending in a way that is guaranteed to stay branch free.

use simba::simd::{SimdValue, WideF64x4};
use wide::f64x4;

use crate::geometry::{FloatType, LANES, SimdFloatType, WorldPoint, WorldVector4};

/// Broadcasts a point into all lanes.
pub fn splat_point(p: &WorldPoint) -> WorldVector4 {
    WorldVector4::new(
        SimdFloatType::splat(p.x),
        SimdFloatType::splat(p.y),
        SimdFloatType::splat(p.z),
    )
}

/// Dot product as a chain of fused multiply-adds.
#[inline(always)]
pub fn fma_dot(a: &WorldVector4, b: &WorldVector4) -> SimdFloatType {
    WideF64x4(a.z.0.mul_add(b.z.0, a.y.0.mul_add(b.y.0, a.x.0 * b.x.0)))
}

/// Squared length of a 2D vector given by components.
#[inline(always)]
pub fn length2_squared(x: f64x4, y: f64x4) -> f64x4 {
    x.mul_add(x, y * y)
}

#[inline(always)]
pub fn length2(x: f64x4, y: f64x4) -> f64x4 {
    length2_squared(x, y).sqrt()
}

/// Squared length of a 3D vector given by components.
#[inline(always)]
pub fn length3_squared(x: f64x4, y: f64x4, z: f64x4) -> f64x4 {
    x.mul_add(x, y.mul_add(y, z * z))
}

#[inline(always)]
pub fn length3(x: f64x4, y: f64x4, z: f64x4) -> f64x4 {
    length3_squared(x, y, z).sqrt()
}

#[inline(always)]
pub fn clamp(v: f64x4, min: f64x4, max: f64x4) -> f64x4 {
    v.max(min).min(max)
}

/// Copies the lanes into a slice of exactly `LANES` elements.
#[inline(always)]
pub fn store(v: SimdFloatType, out: &mut [FloatType]) {
    out.copy_from_slice(&v.0.to_array()[..LANES]);
}

pub fn simd_element_iter<T: SimdValue>(value: T) -> impl Iterator<Item = T::Element> {
    (0..T::LANES).map(move |i| value.extract(i))
}
