use std::path::PathBuf;

/// Errors reported while constructing a scene or writing the rendered image.
/// Tracing itself can't fail, a ray that finds nothing is simply black.
#[derive(Debug, thiserror::Error)]
pub enum SphereError {
    #[error("The scene description file {path:?} could not be opened")]
    SceneFileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The scene description contains invalid parameters: {0}")]
    InvalidParams(String),

    #[error("The scene description contains syntax errors and could not be parsed: {0}")]
    JsonSyntaxError(#[from] serde_json::Error),

    #[error("Could not write the image to {path:?}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not encode the image")]
    ImageEncoding(#[from] image::ImageError),

    #[error("Could not start a render worker thread")]
    WorkerSpawn(#[source] std::io::Error),
}

pub type SphereResult<T = ()> = Result<T, SphereError>;
