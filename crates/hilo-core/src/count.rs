//! Running-count bookkeeping for the Hi-Lo system.

use serde::{Deserialize, Serialize};

use crate::rank::Rank;

/// Smallest representable shoe remainder. The clamp keeps the true-count
/// division defined for any input.
pub const MIN_DECKS_REMAINING: f64 = 0.5;

/// Step used by the deck adjustment controls.
pub const DECK_STEP: f64 = 0.5;

/// Shoe size assumed when none is given.
pub const DEFAULT_DECKS: f64 = 6.0;

/// Copyable snapshot of the count, safe to hand to a polling display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountState {
    pub running_count: i32,
    pub true_count: f64,
    pub decks_remaining: f64,
}

/// The Hi-Lo count engine.
///
/// Every mutation recomputes the true count before returning, so
/// `true_count == running_count / decks_remaining` holds at every
/// observable point.
#[derive(Debug, Clone)]
pub struct CountEngine {
    running_count: i32,
    decks_remaining: f64,
    true_count: f64,
}

impl Default for CountEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DECKS)
    }
}

impl CountEngine {
    /// Create an engine with the given shoe estimate, clamped to the
    /// half-deck minimum.
    pub fn new(decks_remaining: f64) -> Self {
        let mut engine = Self {
            running_count: 0,
            decks_remaining: decks_remaining.max(MIN_DECKS_REMAINING),
            true_count: 0.0,
        };
        engine.recompute();
        engine
    }

    /// Apply the Hi-Lo increment for a newly confirmed card and return the
    /// delta that was applied.
    pub fn record_rank(&mut self, rank: Rank) -> i32 {
        let delta = rank.hilo_value();
        self.running_count += delta;
        self.recompute();
        delta
    }

    /// Update the shoe estimate. Values below half a deck clamp up.
    pub fn set_decks_remaining(&mut self, decks: f64) {
        self.decks_remaining = decks.max(MIN_DECKS_REMAINING);
        self.recompute();
    }

    /// Raise the shoe estimate by half a deck.
    pub fn increment_decks(&mut self) {
        self.set_decks_remaining(self.decks_remaining + DECK_STEP);
    }

    /// Lower the shoe estimate by half a deck, stopping at the minimum.
    pub fn decrement_decks(&mut self) {
        self.set_decks_remaining(self.decks_remaining - DECK_STEP);
    }

    /// Zero both counts. The shoe estimate survives a reset.
    pub fn reset(&mut self) {
        self.running_count = 0;
        self.true_count = 0.0;
    }

    pub fn running_count(&self) -> i32 {
        self.running_count
    }

    pub fn true_count(&self) -> f64 {
        self.true_count
    }

    pub fn decks_remaining(&self) -> f64 {
        self.decks_remaining
    }

    /// Snapshot of the full count state.
    pub fn state(&self) -> CountState {
        CountState {
            running_count: self.running_count,
            true_count: self.true_count,
            decks_remaining: self.decks_remaining,
        }
    }

    fn recompute(&mut self) {
        self.true_count = f64::from(self.running_count) / self.decks_remaining;
    }
}
