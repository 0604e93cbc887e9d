//! State convergence: poll remote status until every target matches.
//!
//! One status call per cycle covers the full id set; readiness is tracked
//! in a map keyed by instance id, so the loop is correct no matter what
//! order the API returns entries in. Each cycle emits one observation per
//! response entry: terminal the first time an id reaches the desired
//! state, non-terminal while it is still in transit. The loop ends when
//! every id is ready, or fails once the cycle bound is exhausted.

use crate::backend::Backend;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::retry;
use crate::types::{DesiredState, InstanceStatus, PollConfig, RetryConfig};
use std::collections::BTreeMap;

/// Receiver for per-instance status observations.
///
/// Observations arrive in remote-response order within a cycle; cycles
/// are strictly sequential.
pub trait ConvergeObserver {
    /// Called once per response entry. `ready` is true exactly once per
    /// id, on the cycle where it first reports the desired state.
    fn on_status(&mut self, status: &InstanceStatus, ready: bool);
}

/// Observer that discards all observations.
pub struct SilentObserver;

impl ConvergeObserver for SilentObserver {
    fn on_status(&mut self, _status: &InstanceStatus, _ready: bool) {}
}

/// Polls instance status until a whole id set reaches a desired state.
pub struct Converger<'a> {
    backend: &'a dyn Backend,
    clock: &'a dyn Clock,
    poll: PollConfig,
    retry: RetryConfig,
}

impl<'a> Converger<'a> {
    /// Create a converger with the default poll config and no retry on
    /// status calls.
    pub fn new(backend: &'a dyn Backend, clock: &'a dyn Clock) -> Self {
        Self {
            backend,
            clock,
            poll: PollConfig::default(),
            retry: RetryConfig::no_retry(),
        }
    }

    /// Replace the poll config.
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Retry each status call on transient failures.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Block until every id reports `desired`, emitting observations as
    /// the poll cycles run.
    ///
    /// Fails with [`Error::ConvergenceTimeout`] when the cycle bound runs
    /// out first, listing the ids still pending. A status call that fails
    /// (after any configured retries) surfaces immediately.
    pub fn converge(
        &self,
        ids: &[String],
        desired: DesiredState,
        observer: &mut dyn ConvergeObserver,
    ) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut ready: BTreeMap<String, bool> =
            ids.iter().map(|id| (id.clone(), false)).collect();

        for cycle in 0..self.poll.max_polls {
            let statuses = retry::with_retry(&self.retry, self.clock, None, || {
                self.backend.describe_status(ids)
            })?;
            log::debug!(
                "poll cycle {}: {} status entr{}",
                cycle + 1,
                statuses.len(),
                if statuses.len() == 1 { "y" } else { "ies" }
            );

            for status in &statuses {
                // Entries for ids we never asked about are ignored.
                let Some(done) = ready.get_mut(&status.id) else {
                    continue;
                };
                if status.state == desired.as_str() {
                    if !*done {
                        *done = true;
                        observer.on_status(status, true);
                    }
                } else {
                    observer.on_status(status, false);
                }
            }

            if ready.values().all(|done| *done) {
                return Ok(());
            }

            if cycle + 1 < self.poll.max_polls {
                self.clock.sleep(self.poll.interval);
            }
        }

        Err(Error::ConvergenceTimeout {
            desired: desired.to_string(),
            pending: ready
                .into_iter()
                .filter(|(_, done)| !done)
                .map(|(id, _)| id)
                .collect(),
        })
    }
}
