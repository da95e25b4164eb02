use thiserror::Error;

/// Errors originating from the rendering pipeline.
///
/// All of these are raised before any pixel is computed; per-pixel faults
/// are absorbed by the color mapper instead.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid image dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("invalid dimension {value:?}: expected a positive whole number")]
    InvalidDimension { value: String },

    #[error("invalid color {value:?}: expected #rrggbb")]
    InvalidColor { value: String },

    #[error("failed to start render thread")]
    Spawn(#[source] std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("PNG encoding failed")]
    Png(#[from] png::EncodingError),

    #[error(transparent)]
    Core(#[from] juliabrot_core::CoreError),
}
