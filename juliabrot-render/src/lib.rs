pub mod buffer;
pub mod color;
pub mod error;
pub mod export;
pub mod job;
pub mod preview;
pub mod progressive;
pub mod request;
pub mod resolution;
pub mod settings;

pub use buffer::{checked_byte_len, RenderBuffer, MAX_PIXELS};
pub use color::{color_for, hsl_to_rgb, ColorScheme, GradientStops, Rgb, StopSelection};
pub use error::RenderError;
pub use export::{encode_png, export_png};
pub use job::{
    estimate_remaining, format_clock, ImageSink, JobController, JobId, JobStatus, JobUpdate,
    MemorySink, ProgressReport, RenderJob,
};
pub use preview::render_preview;
pub use progressive::{
    CancelToken, ControlChannel, NeverCancel, ProgressiveRender, RenderEvent, RenderState,
    StepOutcome, CHUNK_SIZE,
};
pub use request::{CustomColors, RenderRequest, SchemeTag, VariantTag};
pub use resolution::{parse_dimension, ResolutionPreset};
pub use settings::RenderSettings;

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
