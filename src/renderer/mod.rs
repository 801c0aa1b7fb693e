mod machinery;
mod shading;
mod worker;

use std::{num::NonZeroUsize, path::Path, sync::Arc};

use crate::{
    error::SphereResult,
    geometry::FloatType,
    image_buffer::Image,
    instrumentation::{Instrumentation, NoInstrumentation},
    scene::Scene,
};

pub use machinery::{RenderOutput, RenderProgress, TileProgress, render};
pub use worker::{March, MarchOutcome, Worker, WorkerResults};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WorkerCount {
    /// One worker pinned to each core.
    #[default]
    Auto,
    Manual(NonZeroUsize),
}

#[derive(Copy, Clone, Debug, PartialEq, bon::Builder)]
pub struct RenderSettings {
    /// Height of the row bands handed out to workers.
    #[builder(default = 8)]
    pub tile_rows: u32,
    #[builder(default)]
    pub workers: WorkerCount,

    /// Longest path a ray (including its reflections) can travel.
    #[builder(default = 100.0)]
    pub max_distance: FloatType,
    /// A march hits when the distance is at most `trace_threshold * t`.
    #[builder(default = 1e-7)]
    pub trace_threshold: FloatType,
    /// March steps before a ray is treated as escaped.
    #[builder(default = 100_000)]
    pub max_steps: u32,

    /// Rings of four extra shadow rays each.
    #[builder(default = 0)]
    pub shadow_circles: u32,
    #[builder(default = 32)]
    pub max_reflection_depth: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Owns a scene and the last rendered image.
pub struct Renderer {
    scene: Arc<Scene>,
    settings: RenderSettings,
    image: Option<Image>,
}

impl Renderer {
    pub fn new(scene: Scene, settings: RenderSettings) -> Self {
        Renderer {
            scene: Arc::new(scene),
            settings,
            image: None,
        }
    }

    pub fn from_scene_file(path: impl AsRef<Path>, settings: RenderSettings) -> SphereResult<Self> {
        Ok(Self::new(Scene::load(path)?, settings))
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// The image from the last `render_scene` call.
    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    /// Renders the scene and writes the result to `output` unless `suppress_output` is set.
    pub fn render_scene(
        &mut self,
        output: impl AsRef<Path>,
        width: u32,
        height: u32,
        suppress_output: bool,
    ) -> SphereResult {
        let image = self.render(width, height)?;
        if !suppress_output {
            image.save(output)?;
        }
        self.image = Some(image);
        Ok(())
    }

    /// Renders the scene, blocking until done.
    pub fn render(&self, width: u32, height: u32) -> SphereResult<Image> {
        Ok(self
            .render_with::<NoInstrumentation>(width, height)?
            .image)
    }

    pub fn render_with<I: Instrumentation>(
        &self,
        width: u32,
        height: u32,
    ) -> SphereResult<RenderOutput<I>> {
        Ok(self.start(width, height, |_| {})?.wait())
    }

    /// Starts rendering in the background, `finished_tile_callback` is called from the workers.
    pub fn start<I: Instrumentation>(
        &self,
        width: u32,
        height: u32,
        finished_tile_callback: impl Fn(TileProgress) + Send + Sync + 'static,
    ) -> SphereResult<RenderProgress<I>> {
        render(
            Arc::clone(&self.scene),
            self.settings,
            width,
            height,
            finished_tile_callback,
        )
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert2::{assert, let_assert};

    use super::*;
    use crate::{
        camera::Camera,
        geometry::{WorldPoint, WorldVector},
        instrumentation::MarchCounters,
        scene::{
            PointLight, Shape,
            primitives::{Plane, Sphere},
        },
        util::{BLACK, Color},
    };

    fn sphere_scene(reflection: FloatType) -> Scene {
        let mut scene = Scene::new(
            Camera::builder().fov(30.0).build(),
            PointLight {
                position: WorldPoint::new(0.0, 10.0, 0.0),
                emission: Color::new(10.0, 10.0, 10.0),
            },
        );
        let sphere = Shape::builder()
            .kind(Sphere { radius: 1.0 })
            .position(WorldPoint::new(0.0, 0.0, 5.0))
            .color(Color::new(0.2, 0.3, 0.4))
            .shininess(15.0)
            .reflection(reflection)
            .build();
        assert!(scene.add_shape(sphere).is_ok());
        scene
    }

    fn brightness(color: Color) -> f32 {
        color.r + color.g + color.b
    }

    #[test]
    fn default_settings() {
        let settings = RenderSettings::default();
        assert!(settings.tile_rows == 8);
        assert!(settings.workers == WorkerCount::Auto);
        assert!(settings.max_distance == 100.0);
        assert!(settings.trace_threshold == 1e-7);
        assert!(settings.shadow_circles == 0);
    }

    #[test]
    fn sphere_in_center() {
        let renderer = Renderer::new(sphere_scene(0.0), RenderSettings::default());
        let_assert!(Ok(image) = renderer.render(10, 10));

        assert!(image.width() == 10);
        assert!(image.height() == 10);
        assert!(image.pixel(5, 5).color != BLACK);
        assert!(image.pixel(0, 0).color == BLACK);
        assert!(image.pixel(9, 9).color == BLACK);
    }

    #[test]
    fn mirror_into_nothing_is_darker() {
        let matte = Renderer::new(sphere_scene(0.0), RenderSettings::default());
        let mirror = Renderer::new(sphere_scene(1.0), RenderSettings::default());
        let_assert!(Ok(matte) = matte.render(10, 10));
        let_assert!(Ok(mirror) = mirror.render(10, 10));

        assert!(brightness(mirror.pixel(5, 5).color) < brightness(matte.pixel(5, 5).color));
    }

    #[test]
    fn worker_count_does_not_change_the_image() {
        let one = RenderSettings::builder()
            .workers(WorkerCount::Manual(NonZeroUsize::MIN))
            .tile_rows(3)
            .build();
        let_assert!(Ok(single) = Renderer::new(sphere_scene(0.5), one).render(16, 12));
        let_assert!(Ok(auto) = Renderer::new(sphere_scene(0.5), RenderSettings::default()).render(16, 12));

        assert!(single.pixels() == auto.pixels());
    }

    #[test]
    fn callback_sees_every_tile() {
        let renderer = Renderer::new(
            sphere_scene(0.0),
            RenderSettings::builder().tile_rows(4).build(),
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let_assert!(
            Ok(progress) = renderer.start::<NoInstrumentation>(8, 10, {
                let calls = Arc::clone(&calls);
                move |progress| {
                    assert!(progress.total == 3);
                    assert!(progress.finished <= progress.total);
                    calls.fetch_add(1, Ordering::Relaxed);
                }
            })
        );
        let _ = progress.wait();
        assert!(calls.load(Ordering::Relaxed) == 3);
    }

    #[test]
    fn progress_reaches_total_when_finished() {
        let renderer = Renderer::new(
            sphere_scene(0.0),
            RenderSettings::builder().tile_rows(2).build(),
        );
        let_assert!(Ok(progress) = renderer.start::<NoInstrumentation>(4, 7, |_| {}));
        assert!(progress.progress().total == 4);

        while !progress.is_finished() {
            std::thread::yield_now();
        }
        let done = TileProgress { finished: 4, total: 4 };
        assert!(progress.progress() == done);
        let _ = progress.wait();
    }

    #[test]
    fn counters_are_collected() {
        let mut scene = sphere_scene(0.0);
        let floor = Shape::builder()
            .kind(Plane {
                normal: WorldVector::new(0.0, 1.0, 0.0),
                displacement: -1.0,
            })
            .build();
        assert!(scene.add_shape(floor).is_ok());

        let renderer = Renderer::new(scene, RenderSettings::default());
        let_assert!(Ok(output) = renderer.render_with::<MarchCounters>(8, 8));

        // One primary ray per pixel, one shadow ray per hit.
        assert!(output.results.stats.count >= 64);
        assert!(output.results.instrumentation.full_scans >= 64);
        assert!(output.results.instrumentation.shadow_rays > 0);
        assert!(output.results.instrumentation.reflection_rays == 0);
    }

    #[test]
    fn render_scene_writes_file() {
        let path = std::env::temp_dir().join(format!("spheretrace-render-{}.ppm", std::process::id()));
        let mut renderer = Renderer::new(sphere_scene(0.0), RenderSettings::default());

        let_assert!(Ok(()) = renderer.render_scene(&path, 6, 4, false));
        let_assert!(Some(image) = renderer.image());
        assert!(image.width() == 6);
        let_assert!(Ok(bytes) = std::fs::read(&path));
        assert!(bytes.len() == b"P6\n6 4\n255\n".len() + 6 * 4 * 3);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn suppressed_output_keeps_image() {
        let path = std::env::temp_dir().join("spheretrace-never-written.ppm");
        let mut renderer = Renderer::new(sphere_scene(0.0), RenderSettings::default());

        let_assert!(Ok(()) = renderer.render_scene(&path, 4, 4, true));
        assert!(renderer.image().is_some());
        assert!(!path.exists());
    }
}
