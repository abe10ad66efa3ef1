//! Game-domain logic for Hi-Lo card counting.
//!
//! This crate knows nothing about images or capture. It models the closed
//! set of card ranks and the running/true count bookkeeping; the vision
//! layer feeds confirmed ranks in.

pub mod count;
pub mod rank;

pub use count::{CountEngine, CountState, DECK_STEP, DEFAULT_DECKS, MIN_DECKS_REMAINING};
pub use rank::{ParseRankError, Rank};
