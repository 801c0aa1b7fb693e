use std::{
    ops::Range,
    panic,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use core_affinity::CoreId;
use tracing::{info, warn};

use crate::{
    error::{SphereError, SphereResult},
    image_buffer::Image,
    instrumentation::Instrumentation,
    renderer::{
        RenderSettings, WorkerCount,
        worker::{Worker, WorkerResults},
    },
    scene::Scene,
};

/// Number of finished and total tiles.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileProgress {
    pub finished: usize,
    pub total: usize,
}

/// Result of a finished render.
#[derive(Clone, Debug)]
pub struct RenderOutput<I> {
    pub image: Image,
    pub results: WorkerResults<I>,
}

/// Starts rendering the scene in background threads.
/// The image is split into bands of `settings.tile_rows` rows that the workers pick up one by one.
pub fn render<I, F>(
    scene: Arc<Scene>,
    settings: RenderSettings,
    width: u32,
    height: u32,
    finished_tile_callback: F,
) -> SphereResult<RenderProgress<I>>
where
    I: Instrumentation,
    F: Fn(TileProgress) + Send + Sync + 'static,
{
    let image = Image::new(scene.camera().fov(), width, height);
    let tiles = tile_ordering(height, settings.tile_rows);
    let cores = worker_cores(settings.workers);

    info!(
        width,
        height,
        tiles = tiles.len(),
        workers = cores.len(),
        shapes = scene.shapes().len(),
        "Starting render"
    );

    let state = Arc::new(RenderState {
        scene,
        settings,
        image: Mutex::new(image),
        tiles,
        next_tile_index: AtomicUsize::new(0),
        finished_tiles: AtomicUsize::new(0),
        results: Mutex::new(WorkerResults::default()),
        started: Instant::now(),
    });
    let finished_tile_callback = Arc::new(finished_tile_callback);

    let threads = cores
        .into_iter()
        .enumerate()
        .map(|(worker_id, core)| {
            let state = Arc::clone(&state);
            let finished_tile_callback = Arc::clone(&finished_tile_callback);

            thread::Builder::new()
                .name(format!("worker{worker_id}"))
                .spawn(move || {
                    if let Some(core) = core {
                        core_affinity::set_for_current(core);
                    }

                    let mut worker = Worker::<I>::new(&state.scene, &state.settings);

                    while let Some(tile) = state.get_next_tile() {
                        let pixels = lock(&state.image).rows(tile.clone()).to_vec();
                        let colors = worker.render_pixels(&pixels);
                        lock(&state.image).set_colors(tile.start, &colors);

                        let finished = state.finished_tiles.fetch_add(1, Ordering::AcqRel) + 1;
                        (finished_tile_callback)(TileProgress {
                            finished,
                            total: state.tiles.len(),
                        });
                    }

                    lock(&state.results).merge(worker.into_results());
                })
                .map_err(SphereError::WorkerSpawn)
        })
        .collect::<SphereResult<Vec<_>>>()?;

    Ok(RenderProgress {
        render_state: state,
        threads,
    })
}

pub struct RenderProgress<I> {
    render_state: Arc<RenderState<I>>,
    threads: Vec<JoinHandle<()>>,
}

impl<I: Instrumentation> RenderProgress<I> {
    pub fn progress(&self) -> TileProgress {
        TileProgress {
            finished: self.render_state.finished_tiles.load(Ordering::Acquire),
            total: self.render_state.tiles.len(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.threads.iter().all(|handle| handle.is_finished())
    }

    /// Blocks until all workers are done and returns the image.
    /// A panic in a worker is propagated to the caller.
    pub fn wait(self) -> RenderOutput<I> {
        for handle in self.threads {
            if let Err(payload) = handle.join() {
                panic::resume_unwind(payload);
            }
        }

        let state = &self.render_state;
        let image = std::mem::take(&mut *lock(&state.image));
        let results = std::mem::take(&mut *lock(&state.results));

        info!(
            elapsed = ?state.started.elapsed(),
            "Render finished; {}",
            results.stats
        );
        if results.truncated_reflections > 0 {
            warn!(
                count = results.truncated_reflections,
                max_depth = state.settings.max_reflection_depth,
                "Reflection recursion was cut off"
            );
        }

        RenderOutput { image, results }
    }
}

struct RenderState<I> {
    scene: Arc<Scene>,
    settings: RenderSettings,

    image: Mutex<Image>,

    tiles: Vec<Range<u32>>,
    next_tile_index: AtomicUsize,
    finished_tiles: AtomicUsize,

    results: Mutex<WorkerResults<I>>,
    started: Instant,
}

impl<I> RenderState<I> {
    fn get_next_tile(&self) -> Option<Range<u32>> {
        let id = self.next_tile_index.fetch_add(1, Ordering::AcqRel);
        self.tiles.get(id).cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Row bands covering the whole image, top to bottom.
fn tile_ordering(height: u32, tile_rows: u32) -> Vec<Range<u32>> {
    let tile_rows = tile_rows.max(1);
    (0..height)
        .step_by(tile_rows as usize)
        .map(|start| start..(start + tile_rows).min(height))
        .collect()
}

/// One entry per worker thread, with the core to pin it to if there is one.
fn worker_cores(count: WorkerCount) -> Vec<Option<CoreId>> {
    let cores = core_affinity::get_core_ids().unwrap_or_default();
    match count {
        WorkerCount::Auto if !cores.is_empty() => cores.into_iter().map(Some).collect(),
        WorkerCount::Auto => vec![None; num_cpus::get()],
        WorkerCount::Manual(n) => (0..n.get()).map(|i| cores.get(i).copied()).collect(),
    }
}
