mod app_dir;
mod cli;
mod error;
mod preferences;
mod sink;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info};

use juliabrot_render::{render_preview, JobController, JobUpdate, RenderRequest};

use cli::{Cli, Command, PreviewArgs, RenderArgs};
use error::AppError;
use preferences::AppPreferences;
use sink::PngFileSink;

/// Progress is logged at `info` each time it crosses another multiple of this.
const PROGRESS_LOG_STEP: f64 = 10.0;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", error::chain(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let prefs_path = cli
        .preferences
        .clone()
        .unwrap_or_else(app_dir::preferences_path);
    let mut prefs = AppPreferences::load(&prefs_path);

    match &cli.command {
        Command::Render(args) => render(args, &mut prefs)?,
        Command::Preview(args) => preview(args, &mut prefs)?,
        Command::Request(args) => {
            let request = args.to_request(&mut prefs)?;
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
    }

    if cli.save_preferences {
        prefs.save(&prefs_path);
    }
    Ok(())
}

/// Full-resolution render on a background job, blocking until it finishes.
/// With `--zoom-frames` each frame of the slow zoom is rendered in turn.
fn render(args: &RenderArgs, prefs: &mut AppPreferences) -> Result<(), AppError> {
    let base = args.output_path(prefs);
    let frames = args.frames(args.to_request(prefs)?);
    let numbered = frames.len() > 1;
    let mut sink = PngFileSink::new(&base);
    let mut controller = JobController::new();

    info!(frames = frames.len(), "Starting Juliabrot render");
    for (index, request) in frames.iter().enumerate() {
        if numbered {
            sink.retarget(cli::frame_path(&base, index));
        }
        render_job(&mut controller, &mut sink, request)?;
    }
    info!(files = sink.written().len(), "All renders saved");
    Ok(())
}

fn render_job(
    controller: &mut JobController,
    sink: &mut PngFileSink,
    request: &RenderRequest,
) -> Result<(), AppError> {
    let job_id = controller.start(request)?;

    let mut next_log = PROGRESS_LOG_STEP;
    while let Some(update) = controller.wait(sink)? {
        match update {
            JobUpdate::Progress(report) => {
                if report.percent_complete >= next_log {
                    info!(job_id, "{report}");
                    while next_log <= report.percent_complete {
                        next_log += PROGRESS_LOG_STEP;
                    }
                } else {
                    debug!(job_id, "{report}");
                }
            }
            JobUpdate::Completed { elapsed, .. } => {
                info!(
                    job_id,
                    path = %sink.path().display(),
                    "Render finished in {}",
                    juliabrot_render::format_clock(Some(elapsed))
                );
            }
            JobUpdate::Lost { job_id } => return Err(AppError::JobLost(job_id)),
        }
    }
    Ok(())
}

/// Canvas-sized render on the calling thread, saved through `image`.
fn preview(args: &PreviewArgs, prefs: &mut AppPreferences) -> Result<(), AppError> {
    let request = args.to_request(prefs)?;
    let path = args.output_path(prefs);
    save_preview(&request, &path)?;
    info!(path = %path.display(), "Saved preview");
    Ok(())
}

fn save_preview(request: &RenderRequest, path: &Path) -> Result<(), AppError> {
    let settings = request.to_settings()?;
    let buffer = render_preview(&settings)?;
    let (width, height) = (buffer.width, buffer.height);
    let image = image::RgbaImage::from_raw(width, height, buffer.into_raw())
        .ok_or(juliabrot_render::RenderError::InvalidDimensions { width, height })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(juliabrot_render::RenderError::Io)?;
    }
    image.save(path)?;
    Ok(())
}
