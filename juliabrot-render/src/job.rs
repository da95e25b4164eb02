use std::fmt;
use std::sync::mpsc::{self, RecvError, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::progressive::{
    ControlChannel, ProgressiveRender, RenderEvent, RenderState, CHUNK_SIZE,
};
use crate::request::RenderRequest;
use crate::settings::RenderSettings;

pub type JobId = u64;

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// The controller's record of one high-resolution render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub id: JobId,
    pub settings: RenderSettings,
    pub rendered_pixel_count: usize,
    pub total_pixel_count: usize,
    pub status: JobStatus,
}

impl RenderJob {
    fn new(id: JobId, settings: RenderSettings) -> Self {
        Self {
            id,
            total_pixel_count: settings.total_pixels(),
            settings,
            rendered_pixel_count: 0,
            status: JobStatus::Pending,
        }
    }
}

// ---------------------------------------------------------------------------
// Persist collaborator
// ---------------------------------------------------------------------------

/// Receives each finished image. Where it goes (file, screen, memory) is up
/// to the implementation.
pub trait ImageSink {
    fn persist(&mut self, job: &RenderJob, image: RenderBuffer) -> crate::Result<()>;
}

/// Keeps finished images in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub images: Vec<(JobId, RenderBuffer)>,
}

impl ImageSink for MemorySink {
    fn persist(&mut self, job: &RenderJob, image: RenderBuffer) -> crate::Result<()> {
        self.images.push((job.id, image));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Progress timing
// ---------------------------------------------------------------------------

/// Remaining time extrapolated linearly from progress so far.
///
/// `None` while nothing has been rendered yet.
pub fn estimate_remaining(elapsed: Duration, percent_complete: f64) -> Option<Duration> {
    if percent_complete <= 0.0 || !percent_complete.is_finite() {
        return None;
    }
    let elapsed_s = elapsed.as_secs_f64();
    let estimated_total = elapsed_s / percent_complete * 100.0;
    Some(Duration::from_secs_f64((estimated_total - elapsed_s).max(0.0)))
}

/// `"{m}m {s}s"`, or `"--"` when unknown.
pub fn format_clock(duration: Option<Duration>) -> String {
    match duration {
        Some(d) => {
            let secs = d.as_secs();
            format!("{}m {}s", secs / 60, secs % 60)
        }
        None => "--".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    pub job_id: JobId,
    pub percent_complete: f64,
    pub rendered_pixels: usize,
    pub total_pixels: usize,
    pub elapsed: Duration,
    pub remaining: Option<Duration>,
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0}% | Elapsed: {}, Remaining: {}",
            self.percent_complete,
            format_clock(Some(self.elapsed)),
            format_clock(self.remaining),
        )
    }
}

/// What the controller observed while draining the active job's events.
#[derive(Debug, Clone, PartialEq)]
pub enum JobUpdate {
    Progress(ProgressReport),
    /// The image was handed to the sink.
    Completed { job_id: JobId, elapsed: Duration },
    /// The render context exited without finishing.
    Lost { job_id: JobId },
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

struct ActiveJob {
    job: RenderJob,
    /// Dropping this disconnects the render context's [`ControlChannel`].
    control: mpsc::Sender<()>,
    events: mpsc::Receiver<RenderEvent>,
    handle: JoinHandle<RenderState>,
    started: Instant,
}

/// Owns at most one high-resolution render at a time.
///
/// Each job runs on its own thread and talks to the controller only through
/// channels. Starting a job while another is live tears the old one down
/// first; there is no queue.
pub struct JobController {
    active: Option<ActiveJob>,
    last: Option<RenderJob>,
    next_id: JobId,
    chunk_size: usize,
}

impl JobController {
    pub fn new() -> Self {
        Self {
            active: None,
            last: None,
            next_id: 1,
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Chunk size handed to every job this controller starts.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Validate `request` and start rendering it, replacing any live job.
    ///
    /// An invalid request is rejected before anything else happens, so a
    /// job that is already running keeps running.
    pub fn start(&mut self, request: &RenderRequest) -> crate::Result<JobId> {
        let settings = request.to_settings()?;
        self.start_with(settings)
    }

    /// Start rendering an already-validated snapshot, replacing any live job.
    ///
    /// The output buffer is allocated first; if that fails the live job is
    /// left untouched.
    pub fn start_with(&mut self, settings: RenderSettings) -> crate::Result<JobId> {
        let render = ProgressiveRender::new(settings)?.with_chunk_size(self.chunk_size);
        self.launch(settings, move |control, events| {
            render.run(&control, |event| events.send(event).is_ok())
        })
    }

    /// Replace any live job with a new render context running `body` on its
    /// own thread.
    fn launch<F>(&mut self, settings: RenderSettings, body: F) -> crate::Result<JobId>
    where
        F: FnOnce(ControlChannel, mpsc::Sender<RenderEvent>) -> RenderState + Send + 'static,
    {
        if let Some(replaced) = self.teardown() {
            debug!(job_id = replaced, "Replaced by new render job");
        }

        let id = self.next_id;
        self.next_id += 1;
        let mut job = RenderJob::new(id, settings);

        let (control, control_channel) = ControlChannel::pair();
        let (event_tx, events) = mpsc::channel::<RenderEvent>();

        let handle = thread::Builder::new()
            .name(format!("render-job-{id}"))
            .spawn(move || body(control_channel, event_tx))
            .map_err(RenderError::Spawn)?;

        job.status = JobStatus::Running;
        info!(
            job_id = id,
            width = settings.width(),
            height = settings.height(),
            max_iterations = settings.max_iterations(),
            variant = settings.variant().label(),
            scheme = settings.scheme().tag(),
            "Render job started"
        );

        self.active = Some(ActiveJob {
            job,
            control,
            events,
            handle,
            started: Instant::now(),
        });
        Ok(id)
    }

    /// Tear down the live job, if any. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        match self.teardown() {
            Some(id) => {
                info!(job_id = id, "Render job cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// The live job, or else the most recently finished one.
    pub fn job(&self) -> Option<&RenderJob> {
        self.active.as_ref().map(|a| &a.job).or(self.last.as_ref())
    }

    /// Handle the next pending event without blocking.
    ///
    /// Returns `Ok(None)` when nothing is pending or no job is live.
    pub fn poll<S: ImageSink>(&mut self, sink: &mut S) -> crate::Result<Option<JobUpdate>> {
        let Some(active) = self.active.take() else {
            return Ok(None);
        };
        match active.events.try_recv() {
            Ok(event) => self.handle_event(active, Some(event), sink).map(Some),
            Err(TryRecvError::Empty) => {
                self.active = Some(active);
                Ok(None)
            }
            Err(TryRecvError::Disconnected) => self.handle_event(active, None, sink).map(Some),
        }
    }

    /// Block until the live job produces its next event.
    ///
    /// Returns `Ok(None)` when no job is live.
    pub fn wait<S: ImageSink>(&mut self, sink: &mut S) -> crate::Result<Option<JobUpdate>> {
        let Some(active) = self.active.take() else {
            return Ok(None);
        };
        let event = match active.events.recv() {
            Ok(event) => Some(event),
            Err(RecvError) => None,
        };
        self.handle_event(active, event, sink).map(Some)
    }

    /// `None` means the event channel closed without a completion.
    fn handle_event<S: ImageSink>(
        &mut self,
        mut active: ActiveJob,
        event: Option<RenderEvent>,
        sink: &mut S,
    ) -> crate::Result<JobUpdate> {
        match event {
            Some(RenderEvent::Progress {
                percent_complete,
                pixels,
            }) => {
                active.job.rendered_pixel_count += pixels;
                let elapsed = active.started.elapsed();
                let report = ProgressReport {
                    job_id: active.job.id,
                    percent_complete,
                    rendered_pixels: active.job.rendered_pixel_count,
                    total_pixels: active.job.total_pixel_count,
                    elapsed,
                    remaining: estimate_remaining(elapsed, percent_complete),
                };
                debug!(job_id = report.job_id, percent = percent_complete, "Render progress");
                self.active = Some(active);
                Ok(JobUpdate::Progress(report))
            }
            Some(RenderEvent::Complete { image }) => {
                let elapsed = active.started.elapsed();
                let mut job = active.job;
                job.status = JobStatus::Completed;
                if active.handle.join().is_err() {
                    warn!(job_id = job.id, "Render thread panicked after completing");
                }
                info!(
                    job_id = job.id,
                    elapsed_ms = elapsed.as_millis(),
                    "Render job complete"
                );
                let job_id = job.id;
                let persisted = sink.persist(&job, image);
                self.last = Some(job);
                if let Err(e) = &persisted {
                    error!(job_id, "Failed to persist rendered image: {e}");
                }
                persisted.map(|()| JobUpdate::Completed { job_id, elapsed })
            }
            None => {
                warn!(job_id = active.job.id, "Render context exited without completing");
                let job_id = self.retire(active);
                Ok(JobUpdate::Lost { job_id })
            }
        }
    }

    fn teardown(&mut self) -> Option<JobId> {
        let active = self.active.take()?;
        Some(self.retire(active))
    }

    /// Close the job's channels, wait for its thread to observe that at the
    /// next chunk boundary, and discard its partial state.
    fn retire(&mut self, active: ActiveJob) -> JobId {
        let ActiveJob {
            mut job,
            control,
            events,
            handle,
            ..
        } = active;

        drop(control);
        drop(events);
        match handle.join() {
            Ok(state) => debug!(job_id = job.id, ?state, "Render thread joined"),
            Err(_) => warn!(job_id = job.id, "Render thread panicked"),
        }

        job.status = JobStatus::Cancelled;
        let id = job.id;
        self.last = Some(job);
        id
    }
}

impl Default for JobController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for JobController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{SchemeTag, VariantTag};

    fn request(width: u32, height: u32, max_iterations: u32) -> RenderRequest {
        RenderRequest {
            width,
            height,
            zoom: 0.5,
            offset_real: 0.0,
            offset_imag: 0.0,
            max_iterations,
            color_scheme: SchemeTag::Fire,
            custom_colors: None,
            variant: VariantTag::Mandelbrot,
            julia_constant: None,
        }
    }

    /// Drain until the live job finishes or disappears.
    fn drain(controller: &mut JobController, sink: &mut MemorySink) -> Vec<JobUpdate> {
        let mut updates = Vec::new();
        while let Some(update) = controller.wait(sink).unwrap() {
            updates.push(update);
        }
        updates
    }

    #[test]
    fn estimate_is_unknown_until_progress() {
        assert_eq!(estimate_remaining(Duration::from_secs(5), 0.0), None);
        assert_eq!(
            estimate_remaining(Duration::from_secs(10), 25.0),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            estimate_remaining(Duration::from_secs(7), 100.0),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(None), "--");
        assert_eq!(format_clock(Some(Duration::from_secs(0))), "0m 0s");
        assert_eq!(format_clock(Some(Duration::from_millis(125_900))), "2m 5s");
    }

    #[test]
    fn job_runs_to_completion_and_reaches_sink() {
        let mut controller = JobController::new().with_chunk_size(100);
        let mut sink = MemorySink::default();

        let id = controller.start(&request(40, 30, 50)).unwrap();
        assert!(controller.is_running());

        let updates = drain(&mut controller, &mut sink);

        let last_progress = updates
            .iter()
            .filter_map(|u| match u {
                JobUpdate::Progress(p) => Some(*p),
                _ => None,
            })
            .last()
            .unwrap();
        assert_eq!(last_progress.percent_complete, 100.0);
        assert_eq!(last_progress.rendered_pixels, 1200);
        assert!(matches!(updates.last(), Some(JobUpdate::Completed { job_id, .. }) if *job_id == id));

        assert!(!controller.is_running());
        let job = controller.job().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.rendered_pixel_count, job.total_pixel_count);

        assert_eq!(sink.images.len(), 1);
        assert_eq!(sink.images[0].0, id);
        assert_eq!(sink.images[0].1.pixels.len(), 40 * 30 * 4);
    }

    #[test]
    fn invalid_request_starts_nothing() {
        let mut controller = JobController::new();
        assert!(controller.start(&request(0, 30, 50)).is_err());
        assert!(!controller.is_running());
        assert!(controller.job().is_none());
    }

    #[test]
    fn cancel_discards_the_job() {
        let mut controller = JobController::new().with_chunk_size(64);
        let mut sink = MemorySink::default();

        controller.start(&request(400, 400, 5000)).unwrap();
        assert!(controller.cancel());
        assert!(!controller.cancel());

        let job = controller.job().unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
        assert!(controller.wait(&mut sink).unwrap().is_none());
        assert!(sink.images.is_empty());
    }

    #[test]
    fn oversized_request_starts_nothing() {
        let mut controller = JobController::new();
        let err = controller.start(&request(u32::MAX, u32::MAX, 50)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidDimensions { .. }));
        assert!(controller.job().is_none());
    }

    #[test]
    fn polling_drives_a_job_to_completion() {
        let mut controller = JobController::new().with_chunk_size(150);
        let mut sink = MemorySink::default();
        let id = controller.start(&request(30, 20, 40)).unwrap();

        let mut updates = Vec::new();
        while controller.is_running() {
            match controller.poll(&mut sink).unwrap() {
                Some(update) => updates.push(update),
                None => thread::yield_now(),
            }
        }

        assert_eq!(updates.len(), 600 / 150 + 1);
        assert!(matches!(updates.last(), Some(JobUpdate::Completed { job_id, .. }) if *job_id == id));
        assert!(controller.poll(&mut sink).unwrap().is_none());
        assert_eq!(controller.job().unwrap().status, JobStatus::Completed);
        assert_eq!(sink.images.len(), 1);
    }

    #[test]
    fn failed_render_context_is_reported_lost() {
        let mut controller = JobController::new();
        let mut sink = MemorySink::default();
        let settings = request(10, 10, 20).to_settings().unwrap();

        let id = controller
            .launch(settings, |_control, events| {
                let _ = events.send(RenderEvent::Progress {
                    percent_complete: 50.0,
                    pixels: 50,
                });
                panic!("render context failed");
            })
            .unwrap();

        assert!(matches!(
            controller.wait(&mut sink).unwrap(),
            Some(JobUpdate::Progress(p)) if p.rendered_pixels == 50
        ));
        assert_eq!(
            controller.wait(&mut sink).unwrap(),
            Some(JobUpdate::Lost { job_id: id })
        );
        assert!(!controller.is_running());
        let job = controller.job().unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
        assert_eq!(job.rendered_pixel_count, 50);
        assert!(sink.images.is_empty());
    }

    #[test]
    fn cancel_mid_render_keeps_partial_progress() {
        let mut controller = JobController::new().with_chunk_size(64);
        let mut sink = MemorySink::default();
        controller.start(&request(400, 400, 5000)).unwrap();

        let mut seen = 0;
        for _ in 0..3 {
            match controller.wait(&mut sink).unwrap() {
                Some(JobUpdate::Progress(p)) => seen = p.rendered_pixels,
                other => panic!("expected progress, got {other:?}"),
            }
        }
        assert!(controller.cancel());

        let job = controller.job().unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
        assert_eq!(job.rendered_pixel_count, seen);
        assert_eq!(seen, 3 * 64);
        assert!(job.rendered_pixel_count < job.total_pixel_count);
        assert!(sink.images.is_empty());
    }

    #[test]
    fn new_job_replaces_the_running_one() {
        let mut controller = JobController::new().with_chunk_size(64);
        let mut sink = MemorySink::default();

        let first = controller.start(&request(400, 400, 5000)).unwrap();
        let second = controller.start(&request(20, 20, 20)).unwrap();
        assert_ne!(first, second);

        let updates = drain(&mut controller, &mut sink);
        for update in &updates {
            match update {
                JobUpdate::Progress(p) => assert_eq!(p.job_id, second),
                JobUpdate::Completed { job_id, .. } => assert_eq!(*job_id, second),
                JobUpdate::Lost { .. } => panic!("replacement job should not be lost"),
            }
        }
        assert_eq!(sink.images.len(), 1);
        assert_eq!(sink.images[0].0, second);
        assert_eq!(controller.job().unwrap().status, JobStatus::Completed);
    }

    #[test]
    fn progress_report_display() {
        let report = ProgressReport {
            job_id: 1,
            percent_complete: 42.4,
            rendered_pixels: 424,
            total_pixels: 1000,
            elapsed: Duration::from_secs(65),
            remaining: None,
        };
        assert_eq!(report.to_string(), "42% | Elapsed: 1m 5s, Remaining: --");
    }
}
