use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::buffer::RenderBuffer;
use crate::settings::RenderSettings;

/// Pixels computed per scheduling step before progress is reported and the
/// host gets control back.
pub const CHUNK_SIZE: usize = 1350;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Polled by the scheduler at the start of every chunk.
pub trait CancelToken {
    fn is_cancelled(&self) -> bool;
}

/// A token that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelToken for NeverCancel {
    #[inline]
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl CancelToken for AtomicBool {
    #[inline]
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// The render context's end of its control channel.
///
/// Nothing is ever sent on the channel: the controller cancels by dropping
/// its sender, which disconnects this receiver.
#[derive(Debug)]
pub struct ControlChannel {
    rx: mpsc::Receiver<()>,
}

impl ControlChannel {
    pub fn new(rx: mpsc::Receiver<()>) -> Self {
        Self { rx }
    }

    /// A connected pair: keep the sender alive for as long as the render
    /// should run.
    pub fn pair() -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx))
    }
}

impl CancelToken for ControlChannel {
    fn is_cancelled(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}

// ---------------------------------------------------------------------------
// Events and state
// ---------------------------------------------------------------------------

/// Messages from a render context to whoever drives it.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// One chunk finished. `pixels` is the size of that chunk; summed over a
    /// completed render these add up to the image's pixel count.
    Progress { percent_complete: f64, pixels: usize },

    /// The image is finished. Sent once, after the final 100 % progress
    /// event; nothing follows it.
    Complete { image: RenderBuffer },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl RenderState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// What a single [`ProgressiveRender::step`] did.
#[derive(Debug)]
pub enum StepOutcome {
    /// A chunk was rendered and pixels remain.
    Chunk { percent_complete: f64, pixels: usize },

    /// The final chunk was rendered; the buffer is handed over.
    Finished { pixels: usize, image: RenderBuffer },

    /// Cancellation was observed before the chunk started.
    Cancelled,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// A full-image render broken into fixed-size chunks of linear pixel indices.
///
/// Pixels are visited in row-major order, each exactly once. The caller (or
/// [`run`](Self::run)) decides what happens between chunks.
#[derive(Debug)]
pub struct ProgressiveRender {
    settings: RenderSettings,
    buffer: Option<RenderBuffer>,
    rendered: usize,
    total: usize,
    chunk_size: usize,
    state: RenderState,
    started: Option<Instant>,
}

impl ProgressiveRender {
    /// Allocate the output buffer. Fails if the image is too large.
    pub fn new(settings: RenderSettings) -> crate::Result<Self> {
        Ok(Self {
            buffer: Some(RenderBuffer::new(settings.width(), settings.height())?),
            rendered: 0,
            total: settings.total_pixels(),
            chunk_size: CHUNK_SIZE,
            state: RenderState::Idle,
            started: None,
            settings,
        })
    }

    /// Override the chunk size (minimum 1).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn rendered_pixels(&self) -> usize {
        self.rendered
    }

    pub fn total_pixels(&self) -> usize {
        self.total
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn percent_complete(&self) -> f64 {
        self.rendered as f64 / self.total as f64 * 100.0
    }

    /// Render the next chunk.
    ///
    /// Returns `None` once the render is in a terminal state. Cancellation is
    /// only checked here, before any pixel of the chunk is touched.
    pub fn step(&mut self, cancel: &impl CancelToken) -> Option<StepOutcome> {
        if self.state.is_terminal() {
            return None;
        }
        if cancel.is_cancelled() {
            self.abandon();
            return Some(StepOutcome::Cancelled);
        }
        if self.state == RenderState::Idle {
            self.begin();
        }

        let start = self.rendered;
        let end = (start + self.chunk_size).min(self.total);
        let Some(buffer) = self.buffer.as_mut() else {
            self.abandon();
            return Some(StepOutcome::Cancelled);
        };

        let settings = &self.settings;
        buffer
            .span_mut(start, end)
            .par_chunks_mut(RenderBuffer::BYTES_PER_PIXEL)
            .enumerate()
            .for_each(|(i, pixel)| {
                pixel.copy_from_slice(&settings.color_at(start + i).to_rgba());
            });

        let pixels = end - start;
        self.rendered = end;

        if self.rendered < self.total {
            return Some(StepOutcome::Chunk {
                percent_complete: self.percent_complete(),
                pixels,
            });
        }

        self.state = RenderState::Completed;
        let elapsed_ms = self.started.map_or(0, |t| t.elapsed().as_millis());
        info!(
            width = self.settings.width(),
            height = self.settings.height(),
            elapsed_ms,
            "Progressive render complete"
        );
        let Some(image) = self.buffer.take() else {
            self.abandon();
            return Some(StepOutcome::Cancelled);
        };
        Some(StepOutcome::Finished { pixels, image })
    }

    /// Drive the render to a terminal state, yielding the thread after every
    /// chunk.
    ///
    /// `emit` receives each event; returning `false` (the receiving side is
    /// gone) cancels the render at that point.
    pub fn run(
        mut self,
        cancel: &impl CancelToken,
        mut emit: impl FnMut(RenderEvent) -> bool,
    ) -> RenderState {
        while let Some(outcome) = self.step(cancel) {
            match outcome {
                StepOutcome::Chunk {
                    percent_complete,
                    pixels,
                } => {
                    if !emit(RenderEvent::Progress {
                        percent_complete,
                        pixels,
                    }) {
                        debug!(rendered = self.rendered, "Event receiver closed");
                        self.abandon();
                        break;
                    }
                }
                StepOutcome::Finished { pixels, image } => {
                    let delivered = emit(RenderEvent::Progress {
                        percent_complete: 100.0,
                        pixels,
                    }) && emit(RenderEvent::Complete { image });
                    if !delivered {
                        warn!("Event receiver closed before completion was delivered");
                        self.state = RenderState::Cancelled;
                    }
                    break;
                }
                StepOutcome::Cancelled => break,
            }
            std::thread::yield_now();
        }
        self.state
    }

    fn begin(&mut self) {
        self.state = RenderState::Running;
        self.started = Some(Instant::now());
        if !self.settings.scheme().is_supported() {
            warn!("Unsupported color scheme: every pixel will render black");
        }
        debug!(
            total = self.total,
            chunk_size = self.chunk_size,
            variant = self.settings.variant().label(),
            "Starting progressive render"
        );
    }

    fn abandon(&mut self) {
        self.state = RenderState::Cancelled;
        self.buffer = None;
        info!(
            rendered = self.rendered,
            total = self.total,
            "Progressive render cancelled"
        );
    }
}
