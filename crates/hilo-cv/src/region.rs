//! Bounding regions for card candidates.

use image::RgbImage;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Width over height. A portrait card sits near 0.7, a landscape card
    /// near 1.4; a zero-height box reports 0.0 and fails every band.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Conversion for imageproc drawing routines.
    pub fn to_rect(&self) -> Rect {
        Rect::at(self.x as i32, self.y as i32).of_size(self.width.max(1), self.height.max(1))
    }
}

/// A segmented card candidate: its bounds plus the colour crop handed to
/// the rank matcher.
#[derive(Debug, Clone)]
pub struct CandidateRegion {
    pub region: Region,
    pub image: RgbImage,
}
