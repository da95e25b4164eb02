use std::path::PathBuf;

use thiserror::Error;

use juliabrot_render::{JobId, RenderError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Core(#[from] juliabrot_core::CoreError),

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid render request in {}", path.display())]
    Request {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize render request")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to save image")]
    Image(#[from] image::ImageError),

    #[error("render job {0} exited without producing an image")]
    JobLost(JobId),
}

/// Format an error and its whole `source()` chain on one line.
pub fn chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
