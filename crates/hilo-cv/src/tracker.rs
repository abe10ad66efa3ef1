//! Temporal deduplication of card sightings.
//!
//! Rank alone cannot tell two nearby equal-rank cards apart, so the
//! registry keys on position and recency instead. A sighting close to a
//! recently seen card refreshes that card; anything else is new. Two real
//! cards overlapping inside the proximity radius therefore merge into one
//! tracked entity and only the first is counted, an accepted approximation.

use std::time::{Duration, Instant};

use hilo_core::Rank;
use serde::{Deserialize, Serialize};

/// Dedup windows.
///
/// Continuous re-sighting keeps a card alive indefinitely at the refresh
/// granularity; the longer expiry window reclaims cards that left the
/// scene, so a new card later placed on the same spot counts again.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Sightings closer than this are the same physical card (pixels).
    pub proximity_radius: f32,
    /// Seconds within which a nearby re-sighting refreshes instead of
    /// counting again.
    pub refresh_window_secs: f32,
    /// Seconds after which an unseen tracked card is dropped.
    pub expiry_window_secs: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            proximity_radius: 50.0,
            refresh_window_secs: 2.0,
            expiry_window_secs: 5.0,
        }
    }
}

impl TrackerConfig {
    pub fn refresh_window(&self) -> Duration {
        Duration::from_secs_f32(self.refresh_window_secs)
    }

    pub fn expiry_window(&self) -> Duration {
        Duration::from_secs_f32(self.expiry_window_secs)
    }
}

/// A card that was already counted and is still being watched.
#[derive(Debug, Clone, Copy)]
pub struct TrackedCard {
    pub x: f32,
    pub y: f32,
    pub rank: Rank,
    pub last_seen: Instant,
}

/// Registry of recently counted cards.
#[derive(Debug, Clone)]
pub struct CardTracker {
    config: TrackerConfig,
    cards: Vec<TrackedCard>,
}

impl CardTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            cards: Vec::new(),
        }
    }

    /// Decide whether a sighting at `(x, y)` is a new card.
    ///
    /// A tracked card within the proximity radius whose last sighting is
    /// inside the refresh window is the same physical card: its timestamp
    /// is refreshed and the sighting must not be counted. Both the distance
    /// and the window comparisons are strict. Every `true` verdict must be
    /// followed by a [`CardTracker::record`].
    pub fn should_count(&mut self, x: f32, y: f32, now: Instant) -> bool {
        for card in &mut self.cards {
            let dist = ((card.x - x).powi(2) + (card.y - y).powi(2)).sqrt();
            if dist < self.config.proximity_radius
                && now.saturating_duration_since(card.last_seen) < self.config.refresh_window()
            {
                card.last_seen = now;
                return false;
            }
        }
        true
    }

    /// Register a newly counted card.
    pub fn record(&mut self, x: f32, y: f32, rank: Rank, now: Instant) {
        self.cards.push(TrackedCard {
            x,
            y,
            rank,
            last_seen: now,
        });
    }

    /// Drop cards unseen for the full expiry window. Runs once per cycle.
    pub fn expire(&mut self, now: Instant) {
        let expiry = self.config.expiry_window();
        self.cards
            .retain(|card| now.saturating_duration_since(card.last_seen) < expiry);
    }

    /// Currently tracked cards, oldest first.
    pub fn tracked(&self) -> &[TrackedCard] {
        &self.cards
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }
}
