use simba::simd::WideF64x4;

use crate::{
    geometry::{FloatType, SimdFloatType, WorldVector, WorldVector4},
    scene::{
        batch::{Column, SENTINEL},
        shape::{ShapeKind, ShapeType},
    },
};

use super::Primitive;

/// Infinite plane `dot(p, normal) = displacement`.
///
/// The distance is unsigned, rays can hit the plane from both sides.
/// Normal is expected to be unit length, it is used as given.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    pub normal: WorldVector,
    pub displacement: FloatType,
}

#[derive(Clone, Debug, Default)]
pub struct PlaneLanes {
    normal_x: Column,
    normal_y: Column,
    normal_z: Column,
    displacement: Column,
}

impl Primitive for Plane {
    type Lanes = PlaneLanes;

    const SHAPE_TYPE: ShapeType = ShapeType::Plane;

    /// Zero normal makes the distance independent of the point.
    fn sentinel() -> Self {
        Plane {
            normal: WorldVector::zeros(),
            displacement: -SENTINEL,
        }
    }

    fn from_kind(kind: &ShapeKind) -> Option<&Self> {
        match kind {
            ShapeKind::Plane(p) => Some(p),
            _ => None,
        }
    }

    fn store(&self, lanes: &mut PlaneLanes, slot: usize) {
        lanes.normal_x.set(slot, self.normal.x);
        lanes.normal_y.set(slot, self.normal.y);
        lanes.normal_z.set(slot, self.normal.z);
        lanes.displacement.set(slot, self.displacement);
    }

    fn distance(&self, local: &WorldVector) -> FloatType {
        (local.dot(&self.normal) - self.displacement).abs()
    }

    fn distance_squared(&self, local: &WorldVector) -> FloatType {
        let d = local.dot(&self.normal) - self.displacement;
        d * d
    }

    #[inline(always)]
    fn batch_distance(lanes: &PlaneLanes, group: usize, local: &WorldVector4) -> SimdFloatType {
        let dot = local.z.0.mul_add(
            lanes.normal_z.group(group),
            local.y.0.mul_add(
                lanes.normal_y.group(group),
                local.x.0 * lanes.normal_x.group(group),
            ),
        );
        WideF64x4((dot - lanes.displacement.group(group)).abs())
    }
}

#[cfg(test)]
mod test {
    use assert2::assert;
    use proptest::prop_assert;
    use test_case::test_case;
    use test_strategy::proptest;

    use super::*;
    use crate::scene::primitives::test::{
        check_batch_matches_scalar, check_squared_matches, local_point, unit_vector,
    };

    fn floor() -> Plane {
        Plane {
            normal: WorldVector::new(0.0, 1.0, 0.0),
            displacement: -1.0,
        }
    }

    #[test_case(WorldVector::new(0.0, -1.0, 0.0), 0.0 ; "on_plane")]
    #[test_case(WorldVector::new(5.0, 2.0, -7.0), 3.0 ; "above")]
    #[test_case(WorldVector::new(0.0, -4.0, 0.0), 3.0 ; "below")]
    fn known_distances(point: WorldVector, expected: FloatType) {
        assert!((floor().distance(&point) - expected).abs() < 1e-12);
    }

    #[test]
    fn sentinel_is_far_from_everything() {
        let sentinel = Plane::sentinel();
        assert!(sentinel.distance(&WorldVector::new(1e3, -1e3, 1e3)) == SENTINEL);
    }

    #[proptest]
    fn surface_points_are_at_zero(
        #[strategy(unit_vector())] normal: WorldVector,
        #[strategy(-50.0..50.0)] displacement: FloatType,
        #[strategy(local_point())] point: WorldVector,
    ) {
        let plane = Plane {
            normal,
            displacement,
        };
        // Project the point onto the plane
        let surface = point - normal * (point.dot(&normal) - displacement);
        prop_assert!(plane.distance(&surface) <= 1e-9);
    }

    #[proptest]
    fn squared_is_signed_square(
        #[strategy(unit_vector())] normal: WorldVector,
        #[strategy(-50.0..50.0)] displacement: FloatType,
        #[strategy(local_point())] point: WorldVector,
    ) {
        check_squared_matches(
            &Plane {
                normal,
                displacement,
            },
            &point,
        )?;
    }

    #[proptest]
    fn batch_matches_scalar(
        #[strategy(unit_vector())] n0: WorldVector,
        #[strategy(unit_vector())] n1: WorldVector,
        #[strategy(-50.0..50.0)] displacement: FloatType,
        #[strategy(local_point())] point: WorldVector,
    ) {
        let shapes = [
            Plane {
                normal: n0,
                displacement,
            },
            Plane {
                normal: n1,
                displacement: -displacement,
            },
            floor(),
            Plane::sentinel(),
        ];
        check_batch_matches_scalar(&shapes, &point)?;
    }
}
