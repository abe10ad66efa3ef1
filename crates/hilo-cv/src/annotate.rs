//! Debug overlays and raw-frame snapshots.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;

use crate::Result;
use crate::pipeline::FrameReport;

const ACCEPTED_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const REJECTED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Draw the cycle's regions onto a copy of the frame: green boxes for
/// accepted candidates, red for rejected contours.
pub fn draw_report(frame: &RgbImage, report: &FrameReport) -> RgbImage {
    let mut canvas = frame.clone();
    for detection in &report.detections {
        draw_hollow_rect_mut(&mut canvas, detection.region.to_rect(), ACCEPTED_COLOR);
    }
    for region in &report.rejected {
        draw_hollow_rect_mut(&mut canvas, region.to_rect(), REJECTED_COLOR);
    }
    canvas
}

/// Write the annotated frame as `name` inside `dir`, creating the
/// directory if needed.
pub fn save_annotated(
    frame: &RgbImage,
    report: &FrameReport,
    dir: &Path,
    name: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create annotation directory {}", dir.display()))?;
    let path = dir.join(name);
    draw_report(frame, report)
        .save(&path)
        .with_context(|| format!("failed to save annotated frame {}", path.display()))?;
    Ok(path)
}

/// Dump a raw frame for later template harvesting, named by capture time.
pub fn save_sample(frame: &RgbImage, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create sample directory {}", dir.display()))?;
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let path = dir.join(format!("sample_{millis}.png"));
    frame
        .save(&path)
        .with_context(|| format!("failed to save sample {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Detection, FrameStats};
    use crate::region::Region;
    use tempfile::tempdir;

    fn report_with_boxes() -> FrameReport {
        FrameReport {
            detections: vec![Detection {
                region: Region::new(5, 5, 10, 12),
                matched: None,
            }],
            rejected: vec![Region::new(25, 25, 8, 8)],
            counted: Vec::new(),
            stats: FrameStats::default(),
        }
    }

    #[test]
    fn boxes_are_drawn_in_their_colours() {
        let frame = RgbImage::from_pixel(50, 50, Rgb([10, 10, 10]));
        let canvas = draw_report(&frame, &report_with_boxes());
        assert_eq!(*canvas.get_pixel(5, 5), ACCEPTED_COLOR);
        assert_eq!(*canvas.get_pixel(25, 25), REJECTED_COLOR);
        // Interior pixels stay untouched.
        assert_eq!(*canvas.get_pixel(10, 10), Rgb([10, 10, 10]));
        assert_eq!(*canvas.get_pixel(0, 0), Rgb([10, 10, 10]));
    }

    #[test]
    fn annotated_frame_is_written() {
        let dir = tempdir().unwrap();
        let frame = RgbImage::from_pixel(50, 50, Rgb([10, 10, 10]));
        let path = save_annotated(&frame, &report_with_boxes(), dir.path(), "frame_001.png")
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn samples_are_timestamped() {
        let dir = tempdir().unwrap();
        let frame = RgbImage::from_pixel(20, 20, Rgb([10, 10, 10]));
        let path = save_sample(&frame, dir.path()).unwrap();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("sample_"));
        assert!(name.ends_with(".png"));
    }
}
