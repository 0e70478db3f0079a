//! Shutdown roster: live-consumer count and termination-token ledger
//!
//! Every producer emits exactly one token. Consumers number the tokens they
//! remove. The first `producers - 1` removals are absorbed: each one only
//! means that one producer has finished, so the consumer keeps draining.
//! Removal number `producers` can only happen once every producer token has
//! been put. Each producer puts all of its items before its token, so by then
//! every item has already left the buffer. From that removal on, each token
//! taken retires one consumer. The consumer forwards the token while live
//! peers remain. The last one discards it.
//!
//! A producer whose feed fails still owes the pool one token, or the ripple
//! could never start. It puts a wake-up token instead, recorded apart from
//! the emitted ones so it never certifies completion.

use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};

use serde::Serialize;
use tracing::debug;

use crate::error::HandoffError;

/// What a consumer must do with a termination token it just removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFate {
    /// Other producers are still running: drop the token and keep consuming
    Absorb,
    /// Put the token back for the remaining live consumers, then exit
    Forward,
    /// No live consumer remains: drop the token and exit
    Discard,
}

/// Snapshot of the roster counters
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RosterStats {
    pub producers: usize,
    pub consumers: usize,
    pub tokens_emitted: usize,
    /// Tokens put by failed producers to release the consumer pool
    pub wake_ups: usize,
    pub tokens_absorbed: usize,
    pub tokens_forwarded: usize,
    pub tokens_discarded: usize,
    pub live_consumers: usize,
}

impl RosterStats {
    /// Check the token ledger of a run in which every worker finished cleanly
    pub fn reconcile(&self) -> Result<(), HandoffError> {
        let expected = [
            ("tokens emitted", self.tokens_emitted, self.producers),
            ("wake-up tokens", self.wake_ups, 0),
            ("tokens absorbed", self.tokens_absorbed, self.producers.saturating_sub(1)),
            ("tokens forwarded", self.tokens_forwarded, self.consumers.saturating_sub(1)),
            ("tokens discarded", self.tokens_discarded, 1),
            ("live consumers", self.live_consumers, 0),
        ];

        for (what, actual, wanted) in expected {
            if actual != wanted {
                return Err(HandoffError::violation(format!(
                    "{} is {}, expected {} for {} producers and {} consumers",
                    what, actual, wanted, self.producers, self.consumers
                )));
            }
        }
        Ok(())
    }
}

/// Coordinates shutdown across the worker pool
#[derive(Debug)]
pub struct Roster {
    producers: usize,
    consumers: usize,
    emitted: AtomicUsize,
    wake_ups: AtomicUsize,
    removals: AtomicUsize,
    live_consumers: AtomicUsize,
    absorbed: AtomicUsize,
    forwarded: AtomicUsize,
    discarded: AtomicUsize,
}

impl Roster {
    /// Create a roster for a pool of `producers` and `consumers`
    pub fn new(producers: usize, consumers: usize) -> Result<Self, HandoffError> {
        debug!(producers, consumers, "Roster::new: called");
        if producers < 1 {
            return Err(HandoffError::configuration("at least one producer is required"));
        }
        if consumers < 1 {
            return Err(HandoffError::configuration("at least one consumer is required"));
        }

        Ok(Self {
            producers,
            consumers,
            emitted: AtomicUsize::new(0),
            wake_ups: AtomicUsize::new(0),
            removals: AtomicUsize::new(0),
            live_consumers: AtomicUsize::new(consumers),
            absorbed: AtomicUsize::new(0),
            forwarded: AtomicUsize::new(0),
            discarded: AtomicUsize::new(0),
        })
    }

    pub fn producers(&self) -> usize {
        self.producers
    }

    pub fn consumers(&self) -> usize {
        self.consumers
    }

    pub fn live_consumers(&self) -> usize {
        self.live_consumers.load(SeqCst)
    }

    /// Record that a producer put its termination token
    pub fn record_emitted(&self) -> Result<(), HandoffError> {
        let emitted = self.emitted.fetch_add(1, SeqCst) + 1;
        debug!(emitted, producers = self.producers, "Roster::record_emitted: called");
        self.check_finished()
    }

    /// Record that a failed producer put a wake-up token in place of its own
    pub fn producer_failed(&self) -> Result<(), HandoffError> {
        let wake_ups = self.wake_ups.fetch_add(1, SeqCst) + 1;
        debug!(wake_ups, producers = self.producers, "Roster::producer_failed: called");
        self.check_finished()
    }

    /// Decide the fate of a termination token a consumer just removed
    pub fn observe_token(&self) -> Result<TokenFate, HandoffError> {
        let removal = self.removals.fetch_add(1, SeqCst) + 1;
        debug!(removal, producers = self.producers, "Roster::observe_token: called");

        if removal < self.producers {
            self.absorbed.fetch_add(1, SeqCst);
            debug!(removal, "Roster::observe_token: producers still running, absorbing");
            return Ok(TokenFate::Absorb);
        }

        let remaining = self.retire_consumer("consumer retired by a token")?;
        if remaining > 0 {
            self.forwarded.fetch_add(1, SeqCst);
            debug!(remaining, "Roster::observe_token: forwarding to live consumers");
            Ok(TokenFate::Forward)
        } else {
            self.discarded.fetch_add(1, SeqCst);
            debug!("Roster::observe_token: last consumer, discarding");
            Ok(TokenFate::Discard)
        }
    }

    /// Record a consumer that exits without going through a token, e.g. on failure
    pub fn consumer_left(&self) -> Result<usize, HandoffError> {
        debug!("Roster::consumer_left: called");
        self.retire_consumer("consumer left")
    }

    /// Current counter values
    pub fn stats(&self) -> RosterStats {
        RosterStats {
            producers: self.producers,
            consumers: self.consumers,
            tokens_emitted: self.emitted.load(SeqCst),
            wake_ups: self.wake_ups.load(SeqCst),
            tokens_absorbed: self.absorbed.load(SeqCst),
            tokens_forwarded: self.forwarded.load(SeqCst),
            tokens_discarded: self.discarded.load(SeqCst),
            live_consumers: self.live_consumers.load(SeqCst),
        }
    }

    // every producer puts exactly one token, emitted or wake-up.
    fn check_finished(&self) -> Result<(), HandoffError> {
        let emitted = self.emitted.load(SeqCst);
        let wake_ups = self.wake_ups.load(SeqCst);
        if emitted + wake_ups > self.producers {
            return Err(HandoffError::violation(format!(
                "{} termination tokens emitted and {} wake-up tokens from {} producers",
                emitted, wake_ups, self.producers
            )));
        }
        Ok(())
    }

    // returns the number of consumers still live afterwards.
    fn retire_consumer(&self, what: &str) -> Result<usize, HandoffError> {
        let previous = self
            .live_consumers
            .fetch_update(SeqCst, SeqCst, |live| live.checked_sub(1))
            .map_err(|_| HandoffError::violation(format!("{} with no live consumer left", what)))?;
        Ok(previous - 1)
    }
}
