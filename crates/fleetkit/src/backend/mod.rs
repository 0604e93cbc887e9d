//! Backend abstraction for the remote instance inventory.
//!
//! The [`Backend`] trait defines the interface for talking to EC2,
//! allowing for different implementations (real aws CLI, mock for
//! testing). One backend is created per process run and shared by every
//! component; all calls are synchronous.

pub mod aws;

use crate::error::Result;
use crate::filter::FilterClause;
use crate::types::{Instance, InstanceStatus};

/// Backend trait for remote instance operations.
///
/// This trait abstracts the underlying API transport, enabling:
/// - Real CLI execution via `aws ec2` commands
/// - Mock implementations for testing
pub trait Backend: Send + Sync {
    /// Check if the backend can be reached at all.
    fn is_available(&self) -> bool;

    /// Describe the instances matching all of the given clauses,
    /// flattened into a single list in API response order.
    fn describe_instances(&self, clauses: &[FilterClause]) -> Result<Vec<Instance>>;

    /// One status poll covering all of the given ids, including
    /// instances that are not currently running.
    fn describe_status(&self, ids: &[String]) -> Result<Vec<InstanceStatus>>;

    /// Issue the start command for the given ids.
    fn start_instances(&self, ids: &[String]) -> Result<()>;

    /// Issue the stop command for the given ids.
    fn stop_instances(&self, ids: &[String]) -> Result<()>;
}

/// Get the default backend (real aws CLI).
pub fn default_backend() -> Result<aws::AwsBackend> {
    aws::AwsBackend::new()
}
