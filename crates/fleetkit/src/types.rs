//! Core types for instance selection and state convergence.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single instance tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key (e.g., "Env")
    pub key: String,
    /// Tag value (e.g., "prod")
    pub value: String,
}

impl Tag {
    /// Create a new tag.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An instance record as returned by a describe call.
///
/// Read-only downstream of the query: the selection report, the gate and
/// the converger only ever look at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Instance id (e.g., "i-0123456789abcdef0")
    pub id: String,
    /// Runtime state name as reported by the API (e.g., "running")
    pub state: String,
    /// Instance tags, in API order
    pub tags: Vec<Tag>,
}

/// A single entry from a status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceStatus {
    /// Instance id
    pub id: String,
    /// Runtime state name at poll time
    pub state: String,
}

/// The runtime state convergence waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredState {
    /// Target state after a start action
    Running,
    /// Target state after a stop action
    Stopped,
}

impl DesiredState {
    /// The state name as the API reports it.
    pub fn as_str(&self) -> &'static str {
        match self {
            DesiredState::Running => "running",
            DesiredState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for DesiredState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A mutating action on a selection of instances.
///
/// Listing is not a power action: it never passes the confirmation gate
/// and never converges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    /// Start the selected instances
    Start,
    /// Stop the selected instances
    Stop,
}

impl PowerAction {
    /// The verb used in prompts and reports ("start"/"stop").
    pub fn verb(&self) -> &'static str {
        match self {
            PowerAction::Start => "start",
            PowerAction::Stop => "stop",
        }
    }

    /// The state this action converges toward.
    pub fn desired_state(&self) -> DesiredState {
        match self {
            PowerAction::Start => DesiredState::Running,
            PowerAction::Stop => DesiredState::Stopped,
        }
    }
}

impl std::fmt::Display for PowerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.verb())
    }
}

/// Configuration for the convergence poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between status polls
    pub interval: Duration,
    /// Maximum number of poll cycles before giving up
    pub max_polls: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_polls: 300, // 5 minutes at the default interval
        }
    }
}

impl PollConfig {
    /// Create a poll config with a custom interval and cycle bound.
    pub fn new(interval: Duration, max_polls: u32) -> Self {
        Self {
            interval,
            max_polls,
        }
    }

    /// Derive a poll config from an interval and an overall deadline.
    ///
    /// The cycle bound is the number of whole intervals that fit in the
    /// deadline, with a floor of one cycle.
    pub fn with_deadline(interval: Duration, deadline: Duration) -> Self {
        let interval_secs = interval.as_secs().max(1);
        let max_polls = (deadline.as_secs() / interval_secs).max(1) as u32;
        Self {
            interval,
            max_polls,
        }
    }
}

/// Configuration for retry behavior on transient remote failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (first try included)
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            max_delay: Duration::from_secs(60),
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_action_desired_state() {
        assert_eq!(PowerAction::Start.desired_state(), DesiredState::Running);
        assert_eq!(PowerAction::Stop.desired_state(), DesiredState::Stopped);
        assert_eq!(PowerAction::Stop.verb(), "stop");
    }

    #[test]
    fn test_desired_state_as_str() {
        assert_eq!(DesiredState::Running.as_str(), "running");
        assert_eq!(DesiredState::Stopped.to_string(), "stopped");
    }

    #[test]
    fn test_poll_config_with_deadline() {
        let cfg = PollConfig::with_deadline(Duration::from_secs(2), Duration::from_secs(60));
        assert_eq!(cfg.max_polls, 30);

        // Deadline shorter than the interval still yields one cycle
        let cfg = PollConfig::with_deadline(Duration::from_secs(10), Duration::from_secs(3));
        assert_eq!(cfg.max_polls, 1);
    }

    #[test]
    fn test_retry_delay_backoff() {
        let cfg = RetryConfig::new(5, Duration::from_secs(2), 2.0);
        assert_eq!(cfg.delay_for_attempt(0), Duration::from_secs(2));
        assert_eq!(cfg.delay_for_attempt(1), Duration::from_secs(4));
        assert_eq!(cfg.delay_for_attempt(2), Duration::from_secs(8));
        // Capped at max_delay
        assert_eq!(cfg.delay_for_attempt(10), Duration::from_secs(60));
    }
}
