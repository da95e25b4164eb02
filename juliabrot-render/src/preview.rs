use std::time::Instant;

use tracing::{debug, warn};

use crate::buffer::RenderBuffer;
use crate::settings::RenderSettings;

/// Render the whole image synchronously on the calling thread.
///
/// This is the live-preview pass: no chunking, no yielding, no cancellation.
/// It keeps no state between calls, so a parameter change simply means
/// calling it again with new settings. Only suitable for canvas-sized images;
/// use [`ProgressiveRender`](crate::ProgressiveRender) for anything large.
/// Fails only if the image is too large to allocate.
pub fn render_preview(settings: &RenderSettings) -> crate::Result<RenderBuffer> {
    let start = Instant::now();
    if !settings.scheme().is_supported() {
        warn!("Unsupported color scheme: every pixel will render black");
    }

    let mut buffer = RenderBuffer::new(settings.width(), settings.height())?;
    for index in 0..settings.total_pixels() {
        buffer.set_linear(index, settings.color_at(index));
    }

    debug!(
        width = settings.width(),
        height = settings.height(),
        elapsed_us = start.elapsed().as_micros(),
        "Preview render complete"
    );
    Ok(buffer)
}
