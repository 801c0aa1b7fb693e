mod rotation;

use nalgebra::{Point3, Vector2, Vector3};
use simba::simd::WideF64x4;

pub use rotation::Rotation;

pub type FloatType = f64;
pub type SimdFloatType = WideF64x4;

/// Number of shapes evaluated by one SIMD batch kernel call.
pub const LANES: usize = 4;

pub type WorldPoint = Point3<FloatType>;
pub type WorldVector = Vector3<FloatType>;
pub type WorldVector4 = Vector3<SimdFloatType>;
pub type PlaneVector = Vector2<FloatType>;

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,
    /// Normalized direction of the ray
    pub direction: WorldVector,
}

impl Ray {
    /// Creates a new ray, normalizing the direction.
    /// Direction must be non-zero, otherwise the ray is full of NaNs.
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        Ray {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn point_at(&self, distance: FloatType) -> WorldPoint {
        self.origin + self.direction * distance
    }
}

/// Mirrors `direction` about the (normalized) `normal`.
pub fn reflect(direction: &WorldVector, normal: &WorldVector) -> WorldVector {
    direction - normal * (2.0 * direction.dot(normal))
}

#[cfg(test)]
pub mod test {
    use super::*;
    use assert2::assert;
    use proptest::prelude::*;
    use test_strategy::proptest;

    pub fn simple_float() -> BoxedStrategy<FloatType> {
        (-1e3..1e3).boxed()
    }

    pub fn world_point() -> impl Strategy<Value = WorldPoint> {
        (simple_float(), simple_float(), simple_float()).prop_map(|(x, y, z)| WorldPoint::new(x, y, z))
    }

    pub fn nonzero_world_vector() -> impl Strategy<Value = WorldVector> {
        (simple_float(), simple_float(), simple_float())
            .prop_map(|(x, y, z)| WorldVector::new(x, y, z))
            .prop_filter("vector is zero", |v| v.norm() > 1e-6)
    }

    #[proptest]
    fn ray_direction_is_normalized(
        #[strategy(world_point())] origin: WorldPoint,
        #[strategy(nonzero_world_vector())] direction: WorldVector,
    ) {
        let ray = Ray::new(origin, direction);
        prop_assert!((ray.direction.norm() - 1.0).abs() < 1e-9);
    }

    #[proptest]
    fn reflection_keeps_length_and_flips_normal_component(
        #[strategy(nonzero_world_vector())] direction: WorldVector,
        #[strategy(nonzero_world_vector())] normal: WorldVector,
    ) {
        let normal = normal.normalize();
        let reflected = reflect(&direction, &normal);

        let tolerance = 1e-9 * direction.norm().max(1.0);
        prop_assert!((reflected.norm() - direction.norm()).abs() < tolerance);
        prop_assert!((reflected.dot(&normal) + direction.dot(&normal)).abs() < tolerance);
    }

    #[test]
    fn point_at() {
        let ray = Ray::new(WorldPoint::new(1.0, 2.0, 3.0), WorldVector::new(0.0, 0.0, 2.0));
        assert!(ray.point_at(5.0) == WorldPoint::new(1.0, 2.0, 8.0));
    }
}
