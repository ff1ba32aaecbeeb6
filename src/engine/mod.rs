pub mod journeys;
pub mod pareto_front;
pub mod raptor;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use raptor::RaptorState;

/// Why a computation stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    Cancelled,
    Timeout,
}

/// Cancellation signal and wall-clock budget of one query.
/// The engine checks it between rounds and between batches of routes
/// within a round ; an interrupted query returns without having mutated
/// anything shared.
#[derive(Debug, Clone, Default)]
pub struct QueryGuard {
    cancel_token: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

impl QueryGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A guard sharing `token` : setting the token to `true` from any
    /// thread makes the query return a Cancelled outcome.
    pub fn with_cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns a guard whose deadline is tightened by `timeout`,
    /// measured from now. An already-present earlier deadline wins.
    pub fn tightened(&self, timeout: Option<Duration>) -> Self {
        let mut result = self.clone();
        if let Some(timeout) = timeout {
            let candidate = Instant::now() + timeout;
            result.deadline = match result.deadline {
                Some(deadline) if deadline <= candidate => Some(deadline),
                _ => Some(candidate),
            };
        }
        result
    }

    pub fn interruption(&self) -> Option<Interruption> {
        if let Some(token) = &self.cancel_token {
            if token.load(Ordering::Relaxed) {
                return Some(Interruption::Cancelled);
            }
        }
        if let Some(deadline) = &self.deadline {
            if Instant::now() >= *deadline {
                return Some(Interruption::Timeout);
            }
        }
        None
    }
}
