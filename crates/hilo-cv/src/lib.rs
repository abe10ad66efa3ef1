//! Hilo Computer Vision Library
//!
//! Card detection and counting over captured table frames: binary-mask
//! preprocessing, contour-based region segmentation, template-matched rank
//! identification, and temporal deduplication so a card sitting on the
//! table is counted exactly once.

pub mod annotate;
pub mod config;
pub mod pipeline;
pub mod preprocess;
pub mod region;
pub mod segment;
pub mod session;
pub mod template;
pub mod tracker;

// Re-export commonly used types
pub use config::DetectorConfig;
pub use pipeline::{CardCounter, Detection, FrameReport, FrameStats};
pub use preprocess::BinaryMask;
pub use region::{CandidateRegion, Region};
pub use session::{
    CancelToken, Session, SessionConfig, SessionStats, SharedCounter, run_capture_loop,
};
pub use template::{RankMatch, RankMatcher, TemplateStore};
pub use tracker::CardTracker;

// Re-export the game-domain crate for convenience
pub use hilo_core::{CountEngine, CountState, Rank};

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Core traits at the seams to the host application.
pub mod traits {
    use super::Result;
    use crate::pipeline::FrameReport;
    use image::RgbImage;

    /// Source of captured frames: a screen region, a camera, or a replay
    /// directory.
    ///
    /// `Ok(None)` signals a transient miss; the capture loop backs off and
    /// retries. A source failure is never treated as fatal either.
    pub trait FrameSource {
        fn capture(&mut self) -> Result<Option<RgbImage>>;
    }

    /// Receiver for per-cycle debug output (annotated display, disk dumps).
    pub trait DebugSink {
        fn publish(&mut self, frame: &RgbImage, report: &FrameReport) -> Result<()>;
    }
}

/// Initialise logging for binaries. `RUST_LOG` overrides the default
/// filter; calling this twice is harmless.
pub fn init_logging(default_filter: log::LevelFilter) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    )
    .try_init();
}
