//! Detector-wide configuration.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::preprocess::PreprocessConfig;
use crate::segment::SegmentConfig;
use crate::session::SessionConfig;
use crate::template::MatchConfig;
use crate::tracker::TrackerConfig;

/// Every pipeline tunable with its nominal default. Values are fixed when
/// the pipeline is built; nothing here changes at runtime.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub preprocess: PreprocessConfig,
    pub segment: SegmentConfig,
    pub matcher: MatchConfig,
    pub tracker: TrackerConfig,
    pub session: SessionConfig,
}

impl DetectorConfig {
    /// Load a JSON config file. Missing fields fall back to their
    /// defaults, so a config only needs the values it overrides.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.as_ref().display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.as_ref().display()))
    }
}
