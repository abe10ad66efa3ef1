//! Rank template storage and matching.

pub mod matcher;
pub mod store;

pub use matcher::{RankMatch, RankMatcher};
pub use store::TemplateStore;

use serde::{Deserialize, Serialize};

/// Template matching configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// The best normalized cross-correlation must strictly exceed this for
    /// a rank to be confirmed; otherwise the candidate stays unknown.
    pub min_confidence: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
        }
    }
}
