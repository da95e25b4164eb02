pub mod complex;
pub mod error;
pub mod fractal;
pub mod viewport;

// Re-export primary types for convenience.
pub use complex::Complex;
pub use error::CoreError;
pub use fractal::{evaluate, FractalParams, FractalVariant, ESCAPE_RADIUS_SQ};
pub use viewport::{map_pixel, slow_zoom_factor, Viewport, DEFAULT_ZOOM_SPEED};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
