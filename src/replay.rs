//! Offline replay: drive the pipeline over a directory of frame images.
//!
//! Frames are processed in filename order with timestamps synthesised at
//! the recorded cadence, so the dedup windows behave exactly as they would
//! against a live capture.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use hilo_core::{CountState, Rank};
use hilo_cv::{CardCounter, Result, annotate};
use log::{info, warn};
use serde::Serialize;

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Per-frame record for the JSON report.
#[derive(Debug, Serialize)]
pub struct ReplayRecord {
    pub frame: String,
    pub counted: Vec<(Rank, i32)>,
    pub detections: usize,
    pub rejected: usize,
}

/// Full replay output: per-frame records plus the final count.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub frames: Vec<ReplayRecord>,
    pub count: CountState,
}

/// Replay every frame image under `frames_dir` through the pipeline.
///
/// Unreadable files are skipped with a warning. `fps` sets the synthetic
/// capture cadence; `annotate_dir` receives an annotated copy of each
/// frame when given.
pub fn replay(
    pipeline: &mut CardCounter,
    frames_dir: &Path,
    fps: f32,
    annotate_dir: Option<&Path>,
) -> Result<Vec<ReplayRecord>> {
    let paths = list_frames(frames_dir)?;
    anyhow::ensure!(
        !paths.is_empty(),
        "no frame images found in {}",
        frames_dir.display()
    );

    let interval = Duration::from_secs_f32(1.0 / fps.max(0.001));
    let epoch = Instant::now();
    let mut records = Vec::with_capacity(paths.len());

    for (index, path) in paths.iter().enumerate() {
        let frame = match image::open(path) {
            Ok(img) => img.to_rgb8(),
            Err(err) => {
                warn!("skipping unreadable frame {}: {err}", path.display());
                continue;
            }
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let now = epoch + interval.mul_f64(index as f64);
        let report = pipeline.process_frame(&frame, now);

        if let Some(dir) = annotate_dir {
            annotate::save_annotated(&frame, &report, dir, &name)?;
        }
        records.push(ReplayRecord {
            frame: name,
            counted: report.counted.clone(),
            detections: report.detections.len(),
            rejected: report.rejected.len(),
        });
    }

    info!(
        "replayed {} frames from {}",
        records.len(),
        frames_dir.display()
    );
    Ok(records)
}

/// Frame images under `dir`, sorted by filename.
fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read frame directory {}", dir.display()))?;
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.as_str()))
        })
        .collect();
    paths.sort();
    Ok(paths)
}
