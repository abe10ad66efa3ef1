//! Capture-loop scheduling and the shared state crossing to the host.
//!
//! One dedicated processing loop runs while counting is active. The host
//! (a UI, or the replay driver) touches it through exactly two objects: a
//! cancellation token it sets, and the shared counter it polls and
//! adjusts. Everything else is single-owner inside the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use hilo_core::{CountEngine, CountState, Rank};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::pipeline::CardCounter;
use crate::traits::{DebugSink, FrameSource};

/// Cooperative stop flag, observed at the top of every cycle.
///
/// Clones share the flag, so any owner (a quit button, a signal handler, a
/// test) can stop the same loop. Independent sessions carry independent
/// tokens.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// The count engine behind its single mutation lock.
///
/// The processing loop records ranks; the host polls snapshots and adjusts
/// the shoe estimate. Both go through this handle, so the engine itself
/// never sees a thread.
#[derive(Debug, Clone, Default)]
pub struct SharedCounter {
    engine: Arc<Mutex<CountEngine>>,
}

impl SharedCounter {
    pub fn new(decks_remaining: f64) -> Self {
        Self {
            engine: Arc::new(Mutex::new(CountEngine::new(decks_remaining))),
        }
    }

    /// Apply the Hi-Lo increment for a rank and return the delta.
    pub fn record_rank(&self, rank: Rank) -> i32 {
        self.lock().record_rank(rank)
    }

    pub fn set_decks_remaining(&self, decks: f64) {
        self.lock().set_decks_remaining(decks);
    }

    pub fn increment_decks(&self) {
        self.lock().increment_decks();
    }

    pub fn decrement_decks(&self) {
        self.lock().decrement_decks();
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Copyable snapshot for the polling host.
    pub fn snapshot(&self) -> CountState {
        self.lock().state()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CountEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Loop pacing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds to sleep after a cycle with no frame before retrying.
    pub idle_backoff_secs: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_backoff_secs: 0.1,
        }
    }
}

impl SessionConfig {
    pub fn idle_backoff(&self) -> Duration {
        Duration::from_secs_f32(self.idle_backoff_secs)
    }
}

/// Totals for one loop run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SessionStats {
    pub cycles: u64,
    pub frames_processed: u64,
    pub missed_captures: u64,
    pub cards_counted: u64,
}

/// Run the processing loop until the token cancels.
///
/// Capture misses and capture errors both back off and retry; a failing
/// debug sink is logged and skipped. Nothing that happens inside a cycle
/// stops the loop.
pub fn run_capture_loop<S: FrameSource>(
    pipeline: &mut CardCounter,
    source: &mut S,
    token: &CancelToken,
    mut sink: Option<&mut dyn DebugSink>,
    config: &SessionConfig,
) -> SessionStats {
    let mut stats = SessionStats::default();
    info!("processing loop started");
    while !token.is_cancelled() {
        stats.cycles += 1;
        match source.capture() {
            Ok(Some(frame)) => {
                let report = pipeline.process_frame(&frame, Instant::now());
                stats.frames_processed += 1;
                stats.cards_counted += report.counted.len() as u64;
                if let Some(sink) = sink.as_deref_mut() {
                    if let Err(err) = sink.publish(&frame, &report) {
                        warn!("debug sink failed: {err:#}");
                    }
                }
            }
            Ok(None) => {
                stats.missed_captures += 1;
                debug!("no frame this cycle");
                thread::sleep(config.idle_backoff());
            }
            Err(err) => {
                stats.missed_captures += 1;
                warn!("capture failed: {err:#}");
                thread::sleep(config.idle_backoff());
            }
        }
    }
    info!(
        "processing loop stopped: {} frames, {} cards counted",
        stats.frames_processed, stats.cards_counted
    );
    stats
}

/// A running counting session: the loop thread plus its control surface.
pub struct Session {
    token: CancelToken,
    counter: SharedCounter,
    handle: JoinHandle<SessionStats>,
}

impl Session {
    /// Spawn the processing loop on its own thread.
    ///
    /// Hosts that want a [`DebugSink`] drive [`run_capture_loop`] on a
    /// thread of their own instead.
    pub fn spawn<S>(mut pipeline: CardCounter, mut source: S, config: SessionConfig) -> Session
    where
        S: FrameSource + Send + 'static,
    {
        let token = CancelToken::new();
        let counter = pipeline.counter();
        let loop_token = token.clone();
        let handle = thread::spawn(move || {
            run_capture_loop(&mut pipeline, &mut source, &loop_token, None, &config)
        });
        Session {
            token,
            counter,
            handle,
        }
    }

    /// Token that stops this session's loop.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Handle to the count the session maintains.
    pub fn counter(&self) -> SharedCounter {
        self.counter.clone()
    }

    /// Cancel the loop and wait for it to wind down.
    pub fn stop(self) -> SessionStats {
        self.token.cancel();
        match self.handle.join() {
            Ok(stats) => stats,
            Err(_) => {
                warn!("session thread panicked");
                SessionStats::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_clones_share_the_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn independent_tokens_are_independent() {
        let a = CancelToken::new();
        let b = CancelToken::new();
        a.cancel();
        assert!(!b.is_cancelled());
    }

    #[test]
    fn shared_counter_clones_see_the_same_count() {
        let counter = SharedCounter::new(6.0);
        let clone = counter.clone();
        counter.record_rank(Rank::Five);
        assert_eq!(clone.snapshot().running_count, 1);

        clone.decrement_decks();
        assert_eq!(counter.snapshot().decks_remaining, 5.5);
    }

    #[test]
    fn shared_counter_survives_cross_thread_use() {
        let counter = SharedCounter::new(6.0);
        let mut handles = Vec::new();
        for _ in 0..4 {
            let counter = counter.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    counter.record_rank(Rank::Two);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.snapshot().running_count, 400);
    }
}
