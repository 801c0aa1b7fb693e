use crate::{
    geometry::{FloatType, PlaneVector, Ray},
    image_buffer::Pixel,
    instrumentation::Instrumentation,
    renderer::RenderSettings,
    scene::{DistanceBuffer, Scene, ShapeIdx},
    util::{BLACK, Color, Stats},
};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarchOutcome {
    Hit { shape: ShapeIdx, distance: FloatType },
    Escaped,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct March {
    pub outcome: MarchOutcome,
    pub steps: u32,
}

/// What a single render thread needs besides the shared scene.
pub struct Worker<'a, I: Instrumentation> {
    pub(super) scene: &'a Scene,
    pub(super) settings: &'a RenderSettings,
    buffer: DistanceBuffer,
    stats: Stats,
    pub(super) instrumentation: I,
    truncated_reflections: u64,
}

/// Everything a worker collected, merged over all workers at the end of a render.
#[derive(Clone, Debug, Default)]
pub struct WorkerResults<I> {
    pub stats: Stats,
    pub instrumentation: I,
    pub truncated_reflections: u64,
}

impl<I: Instrumentation> WorkerResults<I> {
    pub fn merge(&mut self, other: Self) {
        self.stats = self.stats.merge(&other.stats);
        self.instrumentation.merge(other.instrumentation);
        self.truncated_reflections += other.truncated_reflections;
    }
}

impl<'a, I: Instrumentation> Worker<'a, I> {
    pub fn new(scene: &'a Scene, settings: &'a RenderSettings) -> Self {
        Worker {
            scene,
            settings,
            buffer: DistanceBuffer::for_field(scene.distance_field()),
            stats: Stats::default(),
            instrumentation: I::default(),
            truncated_reflections: 0,
        }
    }

    pub fn render_pixels(&mut self, pixels: &[Pixel]) -> Vec<Color> {
        pixels
            .iter()
            .map(|pixel| self.primary_color(&pixel.camera_coords))
            .collect()
    }

    pub fn primary_color(&mut self, camera_coords: &PlaneVector) -> Color {
        let ray = self.scene.camera().ray(camera_coords);
        self.trace(&ray, 0.0, 0)
    }

    /// Color seen along a ray.
    /// `distance_so_far` is the length of the path before this ray (for reflections),
    /// `depth` the number of reflections so far.
    pub fn trace(&mut self, ray: &Ray, distance_so_far: FloatType, depth: u32) -> Color {
        if depth > self.settings.max_reflection_depth {
            self.truncated_reflections += 1;
            return BLACK;
        }

        let march = self.march(ray, distance_so_far, self.settings.max_distance);
        self.stats.add_sample(march.steps);

        match march.outcome {
            MarchOutcome::Hit { shape, distance } => {
                self.shade(ray, shape, distance, distance_so_far + distance, depth)
            }
            MarchOutcome::Escaped => BLACK,
        }
    }

    /// Sphere traces along the ray until a surface is closer than the (relative) threshold,
    /// or until the ray travels further than `limit` or the total path gets longer than
    /// `max_distance`.
    ///
    /// Between full scans only the nearest shape from the last scan is evaluated.
    /// This is valid as long as the ray hasn't traveled further than the second nearest
    /// distance since that scan.
    pub fn march(&mut self, ray: &Ray, distance_so_far: FloatType, limit: FloatType) -> March {
        let scene = self.scene;
        let settings = self.settings;

        let Some(scan) = scene.nearest_two(&ray.origin, &mut self.buffer) else {
            return March {
                outcome: MarchOutcome::Escaped,
                steps: 0,
            };
        };
        self.instrumentation
            .full_scan(scene.distance_field().buffer_len());

        let mut nearest = scan.nearest;
        let mut second_distance = scan.second_distance;
        let mut d = scan.nearest_distance;
        let mut t: FloatType = 0.0;
        let mut traveled: FloatType = 0.0;

        for steps in 0..settings.max_steps {
            if d <= settings.trace_threshold * t {
                return March {
                    outcome: MarchOutcome::Hit {
                        shape: nearest,
                        distance: t,
                    },
                    steps,
                };
            }

            t += d;
            traveled += d;
            if distance_so_far + t > settings.max_distance || t > limit {
                return March {
                    outcome: MarchOutcome::Escaped,
                    steps: steps + 1,
                };
            }

            let point = ray.point_at(t);
            if traveled > second_distance {
                let Some(scan) = scene.nearest_two(&point, &mut self.buffer) else {
                    break;
                };
                self.instrumentation
                    .full_scan(scene.distance_field().buffer_len());
                nearest = scan.nearest;
                second_distance = scan.second_distance;
                d = scan.nearest_distance;
                traveled = 0.0;
            } else {
                self.instrumentation.cached_step();
                d = scene.shape(nearest).distance(&point);
            }
        }

        March {
            outcome: MarchOutcome::Escaped,
            steps: settings.max_steps,
        }
    }

    pub fn into_results(self) -> WorkerResults<I> {
        WorkerResults {
            stats: self.stats,
            instrumentation: self.instrumentation,
            truncated_reflections: self.truncated_reflections,
        }
    }
}
