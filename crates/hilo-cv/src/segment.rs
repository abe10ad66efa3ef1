//! Card-shaped region extraction from a binary mask.

use image::{RgbImage, imageops};
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::preprocess::BinaryMask;
use crate::region::{CandidateRegion, Region};

/// Shape filters separating cards from chips, hands and merged blobs.
///
/// Areas are contour polygon areas, not filled pixel counts. All bounds are
/// exclusive: a value sitting exactly on a bound is rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Contours below this area are speckle or chips.
    pub min_area: f64,
    /// Contours above this area are merged blobs (shoe, dealer tray,
    /// touching cards).
    pub max_area: f64,
    /// Aspect band around the portrait card ratio, nominally 0.7.
    pub portrait_band: (f32, f32),
    /// Aspect band around the landscape card ratio, nominally 1.4.
    pub landscape_band: (f32, f32),
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_area: 2000.0,
            max_area: 50_000.0,
            portrait_band: (0.5, 0.9),
            landscape_band: (1.1, 1.8),
        }
    }
}

impl SegmentConfig {
    /// Card test: area strictly inside the bounds and aspect strictly
    /// inside either band.
    pub fn accepts(&self, area: f64, aspect: f32) -> bool {
        if area <= self.min_area || area >= self.max_area {
            return false;
        }
        let (p_lo, p_hi) = self.portrait_band;
        let (l_lo, l_hi) = self.landscape_band;
        (aspect > p_lo && aspect < p_hi) || (aspect > l_lo && aspect < l_hi)
    }
}

/// Outcome of one segmentation pass, in contour discovery order. Rejected
/// bounds are kept for the debug overlay.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    pub accepted: Vec<CandidateRegion>,
    pub rejected: Vec<Region>,
}

/// Extract card candidates from a mask: outer contours of the bright
/// components, filtered by area and aspect, cropped from the colour frame.
///
/// Holes inside a component (pips, artwork) belong to their parent card and
/// are never candidates themselves.
pub fn segment(mask: &BinaryMask, frame: &RgbImage, config: &SegmentConfig) -> Segmentation {
    let mut result = Segmentation::default();
    if mask.width() == 0 || mask.height() == 0 {
        return result;
    }

    for contour in find_contours::<i32>(mask) {
        if contour.border_type != BorderType::Outer || contour.parent.is_some() {
            continue;
        }
        let Some(region) = bounding_region(&contour.points) else {
            continue;
        };
        let area = polygon_area(&contour.points);
        let aspect = region.aspect_ratio();
        if config.accepts(area, aspect) {
            let crop = imageops::crop_imm(frame, region.x, region.y, region.width, region.height)
                .to_image();
            result.accepted.push(CandidateRegion {
                region,
                image: crop,
            });
        } else {
            debug!(
                "rejected contour at ({}, {}): area {:.0}, aspect {:.2}",
                region.x, region.y, area, aspect
            );
            result.rejected.push(region);
        }
    }
    result
}

fn bounding_region(points: &[Point<i32>]) -> Option<Region> {
    let first = points.first()?;
    let (mut min_x, mut max_x) = (first.x, first.x);
    let (mut min_y, mut max_y) = (first.y, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    // Contour points lie inside the mask, so the casts cannot wrap.
    Some(Region::new(
        min_x as u32,
        min_y as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}

/// Shoelace area of the traced contour polygon. The area bounds in
/// [`SegmentConfig`] are calibrated against this, not a filled pixel count;
/// for a solid w by h rectangle it evaluates to (w-1)*(h-1).
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y);
    }
    twice_area.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgb};

    fn mask_with_rect(w: u32, h: u32, x: u32, y: u32, rw: u32, rh: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |px, py| {
            if px >= x && px < x + rw && py >= y && py < y + rh {
                image::Luma([255u8])
            } else {
                image::Luma([0u8])
            }
        })
    }

    fn flat_frame(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([200, 200, 200]))
    }

    #[test]
    fn portrait_card_rect_is_accepted() {
        let mask = mask_with_rect(200, 200, 10, 10, 60, 85);
        let result = segment(&mask, &flat_frame(200, 200), &SegmentConfig::default());
        assert_eq!(result.accepted.len(), 1);
        assert!(result.rejected.is_empty());

        let candidate = &result.accepted[0];
        assert_eq!(candidate.region, Region::new(10, 10, 60, 85));
        assert_eq!(candidate.image.dimensions(), (60, 85));
    }

    #[test]
    fn landscape_card_rect_is_accepted() {
        let mask = mask_with_rect(200, 200, 10, 10, 85, 60);
        let result = segment(&mask, &flat_frame(200, 200), &SegmentConfig::default());
        assert_eq!(result.accepted.len(), 1);
    }

    #[test]
    fn square_blob_is_rejected_by_aspect() {
        // Area 99*99 is inside the bounds; aspect 1.0 falls between the bands.
        let mask = mask_with_rect(200, 200, 10, 10, 100, 100);
        let result = segment(&mask, &flat_frame(200, 200), &SegmentConfig::default());
        assert!(result.accepted.is_empty());
        assert_eq!(result.rejected, vec![Region::new(10, 10, 100, 100)]);
    }

    #[test]
    fn small_blob_is_rejected_by_area() {
        // Card-like aspect, but area 11*17 is far below the lower bound.
        let mask = mask_with_rect(200, 200, 10, 10, 12, 18);
        let result = segment(&mask, &flat_frame(200, 200), &SegmentConfig::default());
        assert!(result.accepted.is_empty());
        assert_eq!(result.rejected.len(), 1);
    }

    #[test]
    fn huge_blob_is_rejected_by_area() {
        let mask = mask_with_rect(600, 600, 10, 10, 300, 430);
        let result = segment(&mask, &flat_frame(600, 600), &SegmentConfig::default());
        assert!(result.accepted.is_empty());
        assert_eq!(result.rejected.len(), 1);
    }

    #[test]
    fn empty_mask_finds_nothing() {
        let mask = GrayImage::new(200, 200);
        let result = segment(&mask, &flat_frame(200, 200), &SegmentConfig::default());
        assert!(result.accepted.is_empty());
        assert!(result.rejected.is_empty());
    }

    #[test]
    fn two_separate_cards_are_both_found() {
        let mut mask = mask_with_rect(400, 200, 10, 10, 60, 85);
        for py in 10..95 {
            for px in 200..260 {
                mask.put_pixel(px, py, image::Luma([255u8]));
            }
        }
        let result = segment(&mask, &flat_frame(400, 200), &SegmentConfig::default());
        assert_eq!(result.accepted.len(), 2);
    }

    #[test]
    fn nominal_card_aspects_are_accepted() {
        let config = SegmentConfig::default();
        assert!(config.accepts(5000.0, 0.7));
        assert!(config.accepts(5000.0, 1.4));
        // Tiny contours are out no matter how card-like their shape.
        assert!(!config.accepts(100.0, 0.7));
        assert!(!config.accepts(100.0, 1.4));
    }

    #[test]
    fn bounds_are_exclusive() {
        let config = SegmentConfig::default();
        assert!(!config.accepts(2000.0, 0.7));
        assert!(config.accepts(2001.0, 0.7));
        assert!(!config.accepts(50_000.0, 0.7));
        assert!(!config.accepts(5000.0, 0.5));
        assert!(!config.accepts(5000.0, 0.9));
        assert!(config.accepts(5000.0, 0.89));
        assert!(!config.accepts(5000.0, 1.1));
        assert!(config.accepts(5000.0, 1.2));
        assert!(!config.accepts(5000.0, 1.8));
    }

    #[test]
    fn rect_polygon_area_matches_traced_border() {
        let mask = mask_with_rect(100, 100, 5, 5, 40, 30);
        let contours = find_contours::<i32>(&mask);
        let outer = contours
            .iter()
            .find(|c| c.border_type == BorderType::Outer)
            .unwrap();
        assert_eq!(polygon_area(&outer.points), 39.0 * 29.0);
    }
}
