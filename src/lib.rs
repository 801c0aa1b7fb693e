mod camera;
pub mod error;
pub mod geometry;
mod image_buffer;
pub mod instrumentation;
pub mod renderer;
pub mod scene;
pub mod util;

pub use camera::Camera;
pub use error::{SphereError, SphereResult};
pub use image_buffer::{Image, Pixel};
pub use renderer::{RenderSettings, Renderer, WorkerCount};
pub use scene::{PointLight, Scene, Shape, ShapeKind};
