//! Rank identification by normalized cross-correlation against the
//! template set.

use hilo_core::Rank;
use image::{GrayImage, RgbImage, imageops};
use imageproc::template_matching::{MatchTemplateMethod, find_extremes, match_template};
use serde::Serialize;

use super::{MatchConfig, TemplateStore};

/// A confirmed rank with the correlation score that confirmed it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankMatch {
    pub rank: Rank,
    pub score: f32,
}

/// Scores candidate crops against every stored template.
#[derive(Debug, Clone, Default)]
pub struct RankMatcher {
    config: MatchConfig,
}

impl RankMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Identify the rank shown in a candidate crop.
    ///
    /// Every template is slid across the grayscale crop at its stored size;
    /// there is no multi-scale search. Templates larger than the crop in
    /// either dimension are skipped. The best score wins, with ties going
    /// to the lowest rank, and anything at or below the confidence gate
    /// leaves the candidate unknown.
    pub fn match_rank(&self, store: &TemplateStore, candidate: &RgbImage) -> Option<RankMatch> {
        let gray = imageops::grayscale(candidate);
        let best = self.best_match(store, &gray)?;
        (best.score > self.config.min_confidence).then_some(best)
    }

    fn best_match(&self, store: &TemplateStore, candidate: &GrayImage) -> Option<RankMatch> {
        let entries: Vec<(Rank, &GrayImage)> = store.all().collect();
        let mut scored: Vec<RankMatch> = Vec::new();

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            scored.extend(
                entries
                    .par_iter()
                    .filter_map(|(rank, template)| score_template(candidate, *rank, template))
                    .collect::<Vec<_>>(),
            );
        }

        #[cfg(not(feature = "parallel"))]
        {
            scored.extend(
                entries
                    .iter()
                    .filter_map(|(rank, template)| score_template(candidate, *rank, template)),
            );
        }

        // `scored` keeps ascending rank order, so on an exact tie the
        // lower rank is retained.
        scored.into_iter().reduce(|best, next| {
            if next.score > best.score { next } else { best }
        })
    }
}

fn score_template(candidate: &GrayImage, rank: Rank, template: &GrayImage) -> Option<RankMatch> {
    if template.width() == 0 || template.height() == 0 {
        return None;
    }
    if template.width() > candidate.width() || template.height() > candidate.height() {
        return None;
    }
    let scores = match_template(
        candidate,
        template,
        MatchTemplateMethod::CrossCorrelationNormalized,
    );
    let score = find_extremes(&scores).max_value;
    // Flat all-zero patches divide by zero; treat them as no evidence.
    if !score.is_finite() {
        return None;
    }
    Some(RankMatch { rank, score })
}
