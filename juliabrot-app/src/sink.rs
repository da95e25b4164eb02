use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use juliabrot_render::{export_png, ImageSink, RenderBuffer, RenderJob};

/// Writes each finished job to a PNG file with embedded render metadata.
#[derive(Debug)]
pub struct PngFileSink {
    path: PathBuf,
    written: Vec<PathBuf>,
}

impl PngFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            written: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Send the next finished job to `path` instead.
    pub fn retarget(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ImageSink for PngFileSink {
    fn persist(&mut self, job: &RenderJob, image: RenderBuffer) -> juliabrot_render::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        export_png(&image, &job.settings, &self.path)?;
        info!(
            job_id = job.id,
            path = %self.path.display(),
            "Saved render"
        );
        self.written.push(self.path.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use juliabrot_render::{JobController, JobUpdate, RenderRequest};

    #[test]
    fn completed_job_is_written_to_disk() {
        let dir = std::env::temp_dir().join(format!("juliabrot_sink_{}", std::process::id()));
        let path = dir.join("nested").join("out.png");
        let mut sink = PngFileSink::new(&path);

        let request: RenderRequest = serde_json::from_str(
            r#"{"width":24,"height":18,"zoom":0.5,"max_iterations":32,"color_scheme":"grayscale"}"#,
        )
        .unwrap();
        let mut controller = JobController::new();
        controller.start(&request).unwrap();

        let mut completed = false;
        while let Some(update) = controller.wait(&mut sink).unwrap() {
            completed |= matches!(update, JobUpdate::Completed { .. });
        }
        assert!(completed);
        assert_eq!(sink.written(), [path.clone()]);

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn retargeted_sink_records_every_file() {
        let dir = std::env::temp_dir().join(format!("juliabrot_sink_frames_{}", std::process::id()));
        let mut sink = PngFileSink::new(dir.join("a.png"));
        let request: RenderRequest = serde_json::from_str(
            r#"{"width":8,"height":6,"zoom":0.5,"max_iterations":16,"color_scheme":"fire"}"#,
        )
        .unwrap();

        let mut controller = JobController::new();
        for name in ["a.png", "b.png"] {
            sink.retarget(dir.join(name));
            controller.start(&request).unwrap();
            while controller.wait(&mut sink).unwrap().is_some() {}
        }

        assert_eq!(sink.written(), [dir.join("a.png"), dir.join("b.png")]);
        assert!(sink.written().iter().all(|p| p.exists()));

        let _ = fs::remove_dir_all(dir);
    }
}
