use std::f64::consts::PI;

use crate::{
    geometry::{FloatType, Ray, WorldPoint, WorldVector, reflect},
    instrumentation::Instrumentation,
    renderer::worker::{MarchOutcome, Worker},
    scene::{Shape, ShapeIdx},
    util::{BLACK, Color, clamp_max},
};

/// Offset for the central differences of the normal estimate.
const NORMAL_DELTA: FloatType = 1e-5;
/// Reflected rays start this far above the surface.
const REFLECTION_BIAS: FloatType = 1e-4;
/// Shadow rays start this far above the surface.
const SHADOW_BIAS: FloatType = 1e-3;
/// Perturbation of the shadow ray direction per soft shadow circle.
const SHADOW_DELTA: FloatType = 1e-2;
/// How much all shadow rays together can darken a point.
const MAX_SHADOW_PENALTY: FloatType = 0.6;
/// Weight of the narrow specular lobe, the rest is split between the other two.
const SPECULAR_BIAS: FloatType = 0.3;
/// Reflections that escape into the background only count this much.
const ESCAPED_REFLECTION_FACTOR: f32 = 0.25;

impl<I: Instrumentation> Worker<'_, I> {
    /// Color of the point `ray.point_at(distance)` on a shape.
    /// `path_length` includes the distance along this ray.
    pub(super) fn shade(
        &mut self,
        ray: &Ray,
        shape_idx: ShapeIdx,
        distance: FloatType,
        path_length: FloatType,
        depth: u32,
    ) -> Color {
        let scene = self.scene;
        let shape = scene.shape(shape_idx);
        let light = scene.light();

        let point = ray.point_at(distance);
        let normal = self.normal(shape, &point);

        let to_light = light.position - point;
        let light_distance = to_light.norm();
        let light_direction = to_light / light_distance;

        let intensity = light.emission * (1.0 / (4.0 * PI * light_distance)) as f32;
        let n_dot_l = normal.dot(&light_direction);

        let mut local = shape.color();
        if n_dot_l > 0.0 {
            let specular =
                specular_weight(&normal, &light_direction, &ray.direction, shape.shininess());
            local = local + intensity * (n_dot_l + specular) as f32;
        }

        let mut color = local;
        if shape.reflection() > 0.0 {
            self.instrumentation.reflection_ray();
            let reflected = Ray::new(
                point + normal * REFLECTION_BIAS,
                reflect(&ray.direction, &normal),
            );
            let reflected_color = self.trace(&reflected, path_length, depth + 1);

            let mut weight = shape.reflection() as f32;
            if reflected_color == BLACK {
                weight *= ESCAPED_REFLECTION_FACTOR;
            }
            color = local * (1.0 - weight) + reflected_color * weight;
        }

        clamp_max(color, 1.0) * self.shadow(&point, &normal, &light_direction, light_distance)
    }

    /// Normalized gradient of the shape's distance function.
    fn normal(&mut self, shape: &Shape, point: &WorldPoint) -> WorldVector {
        self.instrumentation.normal_estimate();
        WorldVector::from_fn(|axis, _| {
            let mut offset = WorldVector::zeros();
            offset[axis] = NORMAL_DELTA;
            shape.distance(&(point + offset)) - shape.distance(&(point - offset))
        })
        .normalize()
    }

    /// Multiplicative darkening from shadow rays toward the light, in `[1 - MAX_SHADOW_PENALTY, 1]`.
    fn shadow(
        &mut self,
        point: &WorldPoint,
        normal: &WorldVector,
        light_direction: &WorldVector,
        light_distance: FloatType,
    ) -> f32 {
        let origin = point + normal * SHADOW_BIAS;
        let circles = self.settings.shadow_circles;
        let penalty = MAX_SHADOW_PENALTY / FloatType::from(1 + 4 * circles);

        let mut weight = 1.0;
        if self.occluded(&origin, *light_direction, light_distance) {
            weight -= penalty;
        }

        let (a, b) = perturbation_axes(light_direction);
        for circle in 1..=circles {
            let offset = FloatType::from(circle) * SHADOW_DELTA;
            for (axis, sign) in [(a, 1.0), (a, -1.0), (b, 1.0), (b, -1.0)] {
                let mut direction = *light_direction;
                direction[axis] += sign * offset;
                if self.occluded(&origin, direction, light_distance) {
                    weight -= penalty;
                }
            }
        }

        weight as f32
    }

    fn occluded(&mut self, origin: &WorldPoint, direction: WorldVector, limit: FloatType) -> bool {
        self.instrumentation.shadow_ray();
        let ray = Ray::new(*origin, direction);
        matches!(
            self.march(&ray, 0.0, limit).outcome,
            MarchOutcome::Hit { .. }
        )
    }
}

/// Blend of three Phong lobes with exponents `4k`, `k` and `k / 4`.
fn specular_weight(
    normal: &WorldVector,
    light_direction: &WorldVector,
    ray_direction: &WorldVector,
    shininess: FloatType,
) -> FloatType {
    if shininess <= 0.0 {
        return 0.0;
    }

    let mirrored = normal * (2.0 * normal.dot(light_direction)) - light_direction;
    let s = mirrored.dot(&-ray_direction).max(0.0);

    let central = s.powf(4.0 * shininess);
    let middle = s.powf(shininess);
    let broad = s.powf(shininess / 4.0);
    SPECULAR_BIAS * central + (1.0 - SPECULAR_BIAS) * (middle + broad) / 2.0
}

/// The two axes in which the light direction has the smaller magnitude.
fn perturbation_axes(light_direction: &WorldVector) -> (usize, usize) {
    match light_direction.iamax() {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    }
}

#[cfg(test)]
mod test {
    use assert2::assert;
    use proptest::prop_assert;
    use test_case::test_case;
    use test_strategy::proptest;

    use super::*;
    use crate::{
        camera::Camera,
        geometry::test::nonzero_world_vector,
        instrumentation::{MarchCounters, NoInstrumentation},
        renderer::RenderSettings,
        scene::{
            PointLight, Scene,
            primitives::{Plane, Sphere},
        },
    };

    fn scene_with(shapes: impl IntoIterator<Item = Shape>) -> Scene {
        let mut scene = Scene::new(
            Camera::builder().fov(30.0).build(),
            PointLight {
                position: WorldPoint::new(0.0, 10.0, 0.0),
                emission: Color::new(10.0, 10.0, 10.0),
            },
        );
        for shape in shapes {
            assert!(scene.add_shape(shape).is_ok());
        }
        scene
    }

    fn floor() -> Shape {
        Shape::builder()
            .kind(Plane {
                normal: WorldVector::new(0.0, 1.0, 0.0),
                displacement: -1.0,
            })
            .color(Color::new(0.2, 0.2, 0.2))
            .build()
    }

    fn ball(y: FloatType) -> Shape {
        Shape::builder()
            .kind(Sphere { radius: 1.0 })
            .position(WorldPoint::new(0.0, y, 5.0))
            .build()
    }

    #[test_case(WorldVector::new(1.0, 0.2, 0.1), (1, 2))]
    #[test_case(WorldVector::new(0.1, -3.0, 0.5), (0, 2))]
    #[test_case(WorldVector::new(0.1, 0.2, -0.5), (0, 1))]
    fn perturbation_axes_skip_the_largest(direction: WorldVector, expected: (usize, usize)) {
        assert!(perturbation_axes(&direction) == expected);
    }

    #[test]
    fn specular_is_off_without_shininess() {
        let n = WorldVector::new(0.0, 0.0, -1.0);
        assert!(specular_weight(&n, &n, &-n, 0.0) == 0.0);
        assert!(specular_weight(&n, &n, &-n, -3.0) == 0.0);
    }

    #[test]
    fn specular_peaks_in_mirror_direction() {
        let n = WorldVector::new(0.0, 0.0, -1.0);
        // Light straight behind the camera, mirror direction is exactly toward the viewer.
        let peak = specular_weight(&n, &n, &-n, 10.0);
        assert!((peak - 1.0).abs() < 1e-12);

        let l = WorldVector::new(0.0, 0.5, -1.0).normalize();
        let off = specular_weight(&n, &l, &-n, 10.0);
        assert!(off < peak);
        assert!(off > 0.0);
    }

    #[proptest]
    fn sphere_normal_points_away_from_center(#[strategy(nonzero_world_vector())] direction: WorldVector) {
        let scene = scene_with([ball(0.0)]);
        let settings = RenderSettings::default();
        let mut worker = Worker::<NoInstrumentation>::new(&scene, &settings);

        let expected = direction.normalize();
        let point = WorldPoint::new(0.0, 0.0, 5.0) + expected;
        let normal = worker.normal(scene.shape(ShapeIdx::new(0)), &point);
        prop_assert!((normal - expected).norm() < 1e-6);
    }

    #[test]
    fn unoccluded_point_has_full_weight() {
        let scene = scene_with([floor()]);
        let settings = RenderSettings::default();
        let mut worker = Worker::<NoInstrumentation>::new(&scene, &settings);

        let point = WorldPoint::new(0.0, -1.0, 5.0);
        let to_light = WorldPoint::new(0.0, 10.0, 0.0) - point;
        let weight = worker.shadow(
            &point,
            &WorldVector::new(0.0, 1.0, 0.0),
            &to_light.normalize(),
            to_light.norm(),
        );
        assert!(weight == 1.0);
    }

    #[test_case(0)]
    #[test_case(2)]
    fn ball_casts_shadow_on_floor(circles: u32) {
        // Ball directly between the floor point and the light.
        let light_position = WorldPoint::new(0.0, 10.0, 5.0);
        let mut scene = Scene::new(
            Camera::builder().fov(30.0).build(),
            PointLight {
                position: light_position,
                emission: Color::new(10.0, 10.0, 10.0),
            },
        );
        assert!(scene.add_shape(floor()).is_ok());
        assert!(scene.add_shape(ball(3.0)).is_ok());

        let settings = RenderSettings::builder().shadow_circles(circles).build();
        let mut worker = Worker::<MarchCounters>::new(&scene, &settings);

        let point = WorldPoint::new(0.0, -1.0, 5.0);
        let to_light = light_position - point;
        let weight = worker.shadow(
            &point,
            &WorldVector::new(0.0, 1.0, 0.0),
            &to_light.normalize(),
            to_light.norm(),
        );

        // All perturbed rays pass within the ball too.
        assert!((weight - (1.0 - MAX_SHADOW_PENALTY as f32)).abs() < 1e-6);
        assert!(worker.into_results().instrumentation.shadow_rays == u64::from(1 + 4 * circles));
    }

    #[test]
    fn lit_side_is_brighter_than_base_color() {
        let base = Color::new(0.2, 0.3, 0.4);
        let shape = Shape::builder()
            .kind(Sphere { radius: 1.0 })
            .position(WorldPoint::new(0.0, 0.0, 5.0))
            .color(base)
            .shininess(15.0)
            .build();
        let scene = scene_with([shape]);
        let settings = RenderSettings::default();
        let mut worker = Worker::<NoInstrumentation>::new(&scene, &settings);

        let ray = Ray::new(WorldPoint::origin(), WorldVector::new(0.0, 0.0, 1.0));
        let color = worker.shade(&ray, ShapeIdx::new(0), 4.0, 4.0, 0);
        assert!(color.r > base.r);
        assert!(color.g > base.g);
        assert!(color.b > base.b);
        assert!(color.b <= 1.0);
    }

    #[test]
    fn light_behind_surface_leaves_shadowed_base_color() {
        let base = Color::new(0.2, 0.3, 0.4);
        // Seen from below, the light above the ball is behind the bottom point
        // and the ball itself blocks the shadow ray.
        let shape = Shape::builder()
            .kind(Sphere { radius: 1.0 })
            .position(WorldPoint::new(0.0, 3.0, 0.0))
            .color(base)
            .shininess(15.0)
            .build();
        let scene = scene_with([shape]);
        let settings = RenderSettings::default();
        let mut worker = Worker::<NoInstrumentation>::new(&scene, &settings);

        let ray = Ray::new(WorldPoint::origin(), WorldVector::new(0.0, 1.0, 0.0));
        let color = worker.shade(&ray, ShapeIdx::new(0), 2.0, 2.0, 0);
        let expected = base * (1.0 - MAX_SHADOW_PENALTY as f32);
        assert!((color.r - expected.r).abs() < 1e-6);
        assert!((color.g - expected.g).abs() < 1e-6);
        assert!((color.b - expected.b).abs() < 1e-6);
    }

    #[test]
    fn escaped_reflection_darkens() {
        let base = Color::new(0.2, 0.3, 0.4);
        let make = |reflection| {
            Shape::builder()
                .kind(Sphere { radius: 1.0 })
                .position(WorldPoint::new(0.0, 0.0, 5.0))
                .color(base)
                .reflection(reflection)
                .build()
        };
        let settings = RenderSettings::default();
        let ray = Ray::new(WorldPoint::origin(), WorldVector::new(0.0, 0.0, 1.0));

        let matte_scene = scene_with([make(0.0)]);
        let matte = Worker::<NoInstrumentation>::new(&matte_scene, &settings).shade(
            &ray,
            ShapeIdx::new(0),
            4.0,
            4.0,
            0,
        );
        let mirror_scene = scene_with([make(1.0)]);
        let mirror = Worker::<NoInstrumentation>::new(&mirror_scene, &settings).shade(
            &ray,
            ShapeIdx::new(0),
            4.0,
            4.0,
            0,
        );

        // The reflected ray escapes, so only a quarter of the weight goes to black.
        assert!((mirror.r - matte.r * 0.75).abs() < 1e-6);
        assert!((mirror.b - matte.b * 0.75).abs() < 1e-6);
    }
}
