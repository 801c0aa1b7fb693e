//! Command line renderer.
//!
//! Usage:
//!   sphere-cli <scene.json> [--output image.ppm] [--width 640] [--height 480]
//!              [--shadow-circles 0] [--workers N] [--tile-rows 8] [--counters] [--no-output]
//!
//! The output format follows the file extension, `.ppm` is written directly,
//! anything else goes through the `image` crate.

use std::{env, num::NonZeroUsize, path::PathBuf, thread, time::Duration};

use anyhow::{Context, bail};
use indicatif::{ProgressBar, ProgressStyle};
use spheretrace::{
    RenderSettings, Renderer, WorkerCount,
    instrumentation::{Instrumentation, MarchCounters, NoInstrumentation},
    renderer::RenderOutput,
};
use tracing::info;

struct Args {
    scene: PathBuf,
    output: PathBuf,
    width: u32,
    height: u32,
    settings: RenderSettings,
    counters: bool,
    suppress_output: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut scene = None;
    let mut output = PathBuf::from("out.ppm");
    let mut width = 640;
    let mut height = 480;
    let mut settings = RenderSettings::default();
    let mut counters = false;
    let mut suppress_output = false;

    let mut i = 0;
    while i < args.len() {
        let value = args.get(i + 1).map(String::as_str);
        match (args[i].as_str(), value) {
            ("--output" | "-o", Some(value)) => {
                output = value.into();
                i += 2;
            }
            ("--width", Some(value)) => {
                width = value.parse().context("parse --width")?;
                i += 2;
            }
            ("--height", Some(value)) => {
                height = value.parse().context("parse --height")?;
                i += 2;
            }
            ("--shadow-circles", Some(value)) => {
                settings.shadow_circles = value.parse().context("parse --shadow-circles")?;
                i += 2;
            }
            ("--workers", Some(value)) => {
                let count: NonZeroUsize = value.parse().context("parse --workers")?;
                settings.workers = WorkerCount::Manual(count);
                i += 2;
            }
            ("--tile-rows", Some(value)) => {
                settings.tile_rows = value.parse().context("parse --tile-rows")?;
                i += 2;
            }
            ("--counters", _) => {
                counters = true;
                i += 1;
            }
            ("--no-output", _) => {
                suppress_output = true;
                i += 1;
            }
            (arg, _) if arg.starts_with('-') => bail!("unknown or incomplete option {arg}"),
            (arg, _) => {
                if scene.replace(PathBuf::from(arg)).is_some() {
                    bail!("more than one scene file given");
                }
                i += 1;
            }
        }
    }

    let Some(scene) = scene else {
        bail!("usage: sphere-cli <scene.json> [--output image.ppm] [--width W] [--height H]");
    };
    if width == 0 || height == 0 {
        bail!("image size must not be zero");
    }

    Ok(Args {
        scene,
        output,
        width,
        height,
        settings,
        counters,
        suppress_output,
    })
}

/// Renders with a progress bar.
fn render_with_progress<I: Instrumentation>(
    renderer: &Renderer,
    args: &Args,
) -> anyhow::Result<RenderOutput<I>> {
    let bar = ProgressBar::no_length().with_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} tiles, {elapsed}")
            .context("progress bar template")?,
    );
    let progress = renderer
        .start::<I>(args.width, args.height, {
            let bar = bar.clone();
            move |progress| {
                bar.update(|state| {
                    state.set_len(progress.total as u64);
                    state.set_pos(progress.finished as u64);
                })
            }
        })
        .context("start rendering")?;
    bar.set_length(progress.progress().total as u64);

    while !progress.is_finished() {
        thread::sleep(Duration::from_millis(50));
    }
    let output = progress.wait();
    bar.finish();
    Ok(output)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args()?;
    info!(scene = ?args.scene, output = ?args.output, width = args.width, height = args.height, "Loading scene");

    let renderer = Renderer::from_scene_file(&args.scene, args.settings)
        .with_context(|| format!("load scene {:?}", args.scene))?;

    let image = if args.counters {
        let output = render_with_progress::<MarchCounters>(&renderer, &args)?;
        info!("{}", output.results.instrumentation);
        output.image
    } else {
        render_with_progress::<NoInstrumentation>(&renderer, &args)?.image
    };

    if !args.suppress_output {
        image
            .save(&args.output)
            .with_context(|| format!("write {:?}", args.output))?;
        info!(output = ?args.output, "Image written");
    }

    Ok(())
}
