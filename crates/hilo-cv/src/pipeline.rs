//! Per-frame orchestration: mask, segment, identify, dedup, count.

use std::time::Instant;

use hilo_core::Rank;
use image::RgbImage;
use log::{debug, info, warn};
use serde::Serialize;

use crate::config::DetectorConfig;
use crate::preprocess;
use crate::region::Region;
use crate::segment::{self, Segmentation};
use crate::session::SharedCounter;
use crate::template::{RankMatch, RankMatcher, TemplateStore};
use crate::tracker::CardTracker;

/// One candidate region's matching outcome. `matched` is `None` when the
/// best correlation stayed under the confidence gate.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub region: Region,
    pub matched: Option<RankMatch>,
}

/// Everything one processing cycle produced, for rendering and reports.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub detections: Vec<Detection>,
    /// Contour bounds that failed the card shape filters.
    pub rejected: Vec<Region>,
    /// Ranks newly counted this cycle, with the Hi-Lo delta each applied.
    pub counted: Vec<(Rank, i32)>,
    pub stats: FrameStats,
}

/// Per-cycle statistics.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FrameStats {
    pub segmented: usize,
    pub rejected: usize,
    pub matched: usize,
    pub counted: usize,
    pub processing_time_ms: u64,
}

/// The card detection pipeline plus the count it feeds.
///
/// Every component is single-owner and lives on the processing thread; the
/// one cross-thread surface is the shared counter handle.
pub struct CardCounter {
    config: DetectorConfig,
    store: TemplateStore,
    matcher: RankMatcher,
    tracker: CardTracker,
    counter: SharedCounter,
}

impl CardCounter {
    /// Build a pipeline around a template store and a shared count handle.
    pub fn new(config: DetectorConfig, store: TemplateStore, counter: SharedCounter) -> Self {
        if store.is_empty() {
            warn!("starting with an empty template store; every card will stay unknown");
        }
        let matcher = RankMatcher::new(config.matcher);
        let tracker = CardTracker::new(config.tracker);
        Self {
            config,
            store,
            matcher,
            tracker,
            counter,
        }
    }

    /// Run one full cycle over a captured frame.
    ///
    /// A frame with no card-shaped regions is a normal outcome, not an
    /// error. The tracker expires departed cards exactly once per cycle,
    /// whatever the frame held.
    pub fn process_frame(&mut self, frame: &RgbImage, now: Instant) -> FrameReport {
        let started = Instant::now();
        let mask = preprocess::prepare(frame, &self.config.preprocess);
        let Segmentation { accepted, rejected } =
            segment::segment(&mask, frame, &self.config.segment);

        let mut detections = Vec::with_capacity(accepted.len());
        let mut counted = Vec::new();
        for candidate in &accepted {
            let matched = self.matcher.match_rank(&self.store, &candidate.image);
            let region = candidate.region;
            if let Some(found) = matched {
                let (x, y) = (region.x as f32, region.y as f32);
                if self.tracker.should_count(x, y, now) {
                    self.tracker.record(x, y, found.rank, now);
                    let delta = self.counter.record_rank(found.rank);
                    info!(
                        "counted {} ({delta:+}) at ({}, {})",
                        found.rank, region.x, region.y
                    );
                    counted.push((found.rank, delta));
                }
            }
            detections.push(Detection { region, matched });
        }
        self.tracker.expire(now);

        let stats = FrameStats {
            segmented: accepted.len() + rejected.len(),
            rejected: rejected.len(),
            matched: detections.iter().filter(|d| d.matched.is_some()).count(),
            counted: counted.len(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        };
        debug!(
            "cycle: {} segmented, {} rejected, {} matched, {} counted in {}ms",
            stats.segmented, stats.rejected, stats.matched, stats.counted, stats.processing_time_ms
        );
        FrameReport {
            detections,
            rejected,
            counted,
            stats,
        }
    }

    /// Manual labelling trigger: learn `rank` from a candidate crop.
    ///
    /// The template is live for the next frame immediately; a persistence
    /// failure is logged and the loop keeps running.
    pub fn add_template(&mut self, rank: Rank, candidate: &RgbImage) {
        if let Err(err) = self.store.add(rank, candidate) {
            warn!("failed to persist template for {rank}: {err:#}");
        }
    }

    /// Re-scan the backing template directory.
    pub fn reload_templates(&mut self) {
        self.store.load_dir();
    }

    /// Shared handle to the count this pipeline feeds.
    pub fn counter(&self) -> SharedCounter {
        self.counter.clone()
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }
}
