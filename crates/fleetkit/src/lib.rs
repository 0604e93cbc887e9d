//! # fleetkit
//!
//! Pure Rust library for selecting EC2 instances and converging their
//! power state.
//!
//! This crate provides functionality for:
//! - Accumulating tag/attribute filter specs into a query predicate
//! - Listing the matching instances (only ever `running` or `stopped`)
//! - Gating mutating actions behind a y/n confirmation
//! - Polling instance status until every target reaches the desired state
//!
//! ## Example
//!
//! ```no_run
//! use fleetkit::{Client, DesiredState, FilterSet, PollConfig};
//! use fleetkit::converge::SilentObserver;
//!
//! // Create a client
//! let client = Client::new().expect("aws CLI not available");
//!
//! // Select instances
//! let mut filters = FilterSet::new();
//! filters.add_tag("Env:prod").expect("bad spec");
//! let instances = client.list(&filters).expect("describe failed");
//!
//! // Stop them and wait for convergence
//! let ids: Vec<String> = instances.iter().map(|i| i.id.clone()).collect();
//! client.stop(&ids).expect("stop failed");
//! client
//!     .converge(&ids, DesiredState::Stopped, &PollConfig::default(), &mut SilentObserver)
//!     .expect("instances did not stop in time");
//! ```
//!
//! ## Retry Logic
//!
//! Throttling and network errors are transient; the `_with_retry`
//! variants retry them with exponential backoff. Configure the behavior
//! with [`RetryConfig`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod clock;
pub mod converge;
pub mod error;
pub mod filter;
pub mod gate;
pub mod query;
pub mod retry;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use filter::{FilterClause, FilterSet};
pub use gate::{ActionGate, Decision, GateState};
pub use types::{
    DesiredState, Instance, InstanceStatus, PollConfig, PowerAction, RetryConfig, Tag,
};

use backend::{Backend, aws::AwsBackend};
use clock::{Clock, SystemClock};
use converge::{ConvergeObserver, Converger};

/// High-level client for instance selection and power actions.
///
/// The client wraps a backend and provides convenient methods for the
/// select → mutate → converge pipeline. One client is created per
/// process run and shared by every command.
pub struct Client {
    backend: Box<dyn Backend>,
    clock: Box<dyn Clock>,
}

impl Client {
    /// Create a new Client with the default backend.
    ///
    /// Returns an error if the aws CLI is not installed.
    pub fn new() -> Result<Self> {
        let backend = AwsBackend::new()?;
        Ok(Self {
            backend: Box::new(backend),
            clock: Box::new(SystemClock),
        })
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the delay source (useful for testing).
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Check if the backend can be reached.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// List the instances matching the filter set.
    pub fn list(&self, filters: &FilterSet) -> Result<Vec<Instance>> {
        query::list_instances(&*self.backend, filters)
    }

    /// List with retry on transient describe failures.
    pub fn list_with_retry(
        &self,
        filters: &FilterSet,
        config: &RetryConfig,
    ) -> Result<Vec<Instance>> {
        retry::with_retry(config, &*self.clock, Some(&retry::PrintCallback), || {
            query::list_instances(&*self.backend, filters)
        })
    }

    // =========================================================================
    // Power Actions
    // =========================================================================

    /// Issue the start command for the given ids.
    pub fn start(&self, ids: &[String]) -> Result<()> {
        self.backend.start_instances(ids)
    }

    /// Start with retry on transient failures.
    pub fn start_with_retry(&self, ids: &[String], config: &RetryConfig) -> Result<()> {
        retry::with_retry(config, &*self.clock, Some(&retry::PrintCallback), || {
            self.backend.start_instances(ids)
        })
    }

    /// Issue the stop command for the given ids.
    pub fn stop(&self, ids: &[String]) -> Result<()> {
        self.backend.stop_instances(ids)
    }

    /// Stop with retry on transient failures.
    pub fn stop_with_retry(&self, ids: &[String], config: &RetryConfig) -> Result<()> {
        retry::with_retry(config, &*self.clock, Some(&retry::PrintCallback), || {
            self.backend.stop_instances(ids)
        })
    }

    // =========================================================================
    // Convergence
    // =========================================================================

    /// Block until every id reports the desired state.
    pub fn converge(
        &self,
        ids: &[String],
        desired: DesiredState,
        poll: &PollConfig,
        observer: &mut dyn ConvergeObserver,
    ) -> Result<()> {
        Converger::new(&*self.backend, &*self.clock)
            .with_poll_config(poll.clone())
            .converge(ids, desired, observer)
    }

    /// Converge, retrying each status poll on transient failures.
    pub fn converge_with_retry(
        &self,
        ids: &[String],
        desired: DesiredState,
        poll: &PollConfig,
        retry: &RetryConfig,
        observer: &mut dyn ConvergeObserver,
    ) -> Result<()> {
        Converger::new(&*self.backend, &*self.clock)
            .with_poll_config(poll.clone())
            .with_retry_config(retry.clone())
            .converge(ids, desired, observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Backend for whole-pipeline tests: serves a fixed inventory with
    /// real filter semantics, records mutate calls, and walks instances
    /// through a scripted state sequence one status poll at a time.
    struct FakeFleet {
        instances: Vec<Instance>,
        // (id, state sequence); each status call advances one step
        transitions: Mutex<Vec<(String, Vec<&'static str>)>>,
        stopped: Arc<Mutex<Vec<String>>>,
    }

    impl FakeFleet {
        fn new(instances: Vec<Instance>, transitions: Vec<(String, Vec<&'static str>)>) -> Self {
            Self {
                instances,
                transitions: Mutex::new(transitions),
                stopped: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn stopped_handle(&self) -> Arc<Mutex<Vec<String>>> {
            Arc::clone(&self.stopped)
        }
    }

    impl backend::Backend for FakeFleet {
        fn is_available(&self) -> bool {
            true
        }

        fn describe_instances(&self, clauses: &[FilterClause]) -> Result<Vec<Instance>> {
            Ok(self
                .instances
                .iter()
                .filter(|i| {
                    clauses.iter().all(|c| {
                        if let Some(tag_key) = c.key.strip_prefix("tag:") {
                            i.tags
                                .iter()
                                .any(|t| t.key == tag_key && c.values.contains(&t.value))
                        } else if c.key == "instance-state-name" {
                            c.values.contains(&i.state)
                        } else {
                            i.tags
                                .iter()
                                .any(|t| t.key == c.key && c.values.contains(&t.value))
                        }
                    })
                })
                .cloned()
                .collect())
        }

        fn describe_status(&self, ids: &[String]) -> Result<Vec<InstanceStatus>> {
            let mut transitions = self.transitions.lock().unwrap();
            Ok(ids
                .iter()
                .filter_map(|id| {
                    transitions
                        .iter_mut()
                        .find(|(tid, _)| tid == id)
                        .map(|(tid, states)| {
                            let state = if states.len() > 1 {
                                states.remove(0)
                            } else {
                                states[0]
                            };
                            InstanceStatus {
                                id: tid.clone(),
                                state: state.to_string(),
                            }
                        })
                })
                .collect())
        }

        fn start_instances(&self, _ids: &[String]) -> Result<()> {
            Ok(())
        }

        fn stop_instances(&self, ids: &[String]) -> Result<()> {
            self.stopped.lock().unwrap().extend(ids.iter().cloned());
            Ok(())
        }
    }

    struct NoSleep;
    impl Clock for NoSleep {
        fn sleep(&self, _: Duration) {}
    }

    #[derive(Default)]
    struct Recording {
        seen: Vec<(String, bool)>,
    }
    impl ConvergeObserver for Recording {
        fn on_status(&mut self, status: &InstanceStatus, ready: bool) {
            self.seen.push((status.id.clone(), ready));
        }
    }

    fn prod_micro(id: &str, state: &str) -> Instance {
        Instance {
            id: id.to_string(),
            state: state.to_string(),
            tags: vec![
                Tag::new("Env", "prod"),
                Tag::new("instance-type", "t3.micro"),
            ],
        }
    }

    #[test]
    fn test_forced_stop_pipeline_end_to_end() {
        // Two matching targets that each take two poll cycles to stop.
        let fleet = FakeFleet::new(
            vec![prod_micro("i-1", "running"), prod_micro("i-2", "running")],
            vec![
                ("i-1".to_string(), vec!["stopping", "stopped"]),
                ("i-2".to_string(), vec!["stopping", "stopped"]),
            ],
        );
        let stopped = fleet.stopped_handle();
        let client = Client::with_backend(Box::new(fleet)).with_clock(Box::new(NoSleep));

        let mut filters = FilterSet::new();
        filters.add_tag("Env:prod").unwrap();
        filters.add_attribute("instance-type:t3.micro").unwrap();

        let instances = client.list(&filters).unwrap();
        let ids: Vec<String> = instances.iter().map(|i| i.id.clone()).collect();
        assert_eq!(ids, vec!["i-1", "i-2"]);

        // Forced gate: approved without touching input.
        let mut gate = ActionGate::new(true);
        let decision = gate
            .confirm(PowerAction::Stop, Cursor::new(""), Vec::new())
            .unwrap();
        assert_eq!(decision, Decision::Approved);

        client.stop(&ids).unwrap();
        assert_eq!(*stopped.lock().unwrap(), ids);
        let mut observer = Recording::default();
        client
            .converge(
                &ids,
                DesiredState::Stopped,
                &PollConfig::default(),
                &mut observer,
            )
            .unwrap();

        // Two non-terminal reports, then two terminal reports.
        let flags: Vec<bool> = observer.seen.iter().map(|(_, r)| *r).collect();
        assert_eq!(flags, vec![false, false, true, true]);
    }

    #[test]
    fn test_selection_excludes_non_matching_and_transitional() {
        let fleet = FakeFleet::new(
            vec![
                prod_micro("i-1", "running"),
                Instance {
                    id: "i-2".to_string(),
                    state: "running".to_string(),
                    tags: vec![Tag::new("Env", "dev")],
                },
                prod_micro("i-3", "pending"),
            ],
            vec![],
        );
        let client = Client::with_backend(Box::new(fleet));

        let mut filters = FilterSet::new();
        filters.add_tag("Env:prod").unwrap();

        let instances = client.list(&filters).unwrap();
        let ids: Vec<&str> = instances.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["i-1"]);
    }

    #[test]
    fn test_rejected_gate_short_circuits_pipeline() {
        let fleet = FakeFleet::new(vec![prod_micro("i-1", "running")], vec![]);
        let stopped = fleet.stopped_handle();
        let client = Client::with_backend(Box::new(fleet));

        let instances = client.list(&FilterSet::new()).unwrap();
        assert_eq!(instances.len(), 1);

        let mut gate = ActionGate::new(false);
        let decision = gate
            .confirm(PowerAction::Stop, Cursor::new("n\n"), Vec::new())
            .unwrap();
        assert_eq!(decision, Decision::Rejected);
        // The caller takes no action on rejection; nothing was mutated.
        assert!(stopped.lock().unwrap().is_empty());
    }
}
