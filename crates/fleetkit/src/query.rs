//! Instance selection against the remote inventory.
//!
//! Wraps the backend describe call with the implicit state restriction:
//! only `running` and `stopped` instances are ever visible to this tool.
//! Transitional instances (pending, stopping, shutting-down, terminated)
//! are excluded at the query so reports stay unambiguous and mutating
//! actions never target an instance mid-flight.

use crate::backend::Backend;
use crate::error::Result;
use crate::filter::{FilterClause, FilterSet};
use crate::types::Instance;

/// Filter name for the instance runtime state.
const STATE_KEY: &str = "instance-state-name";

/// The states this tool is willing to see and act on.
const VISIBLE_STATES: [&str; 2] = ["running", "stopped"];

/// List the instances matching the filter set.
///
/// Appends the implicit state clause to the operator clauses, so the
/// union sent to the API is `attributes ++ tags ++ state restriction`.
/// A remote failure surfaces immediately; no partial result is used.
pub fn list_instances(backend: &dyn Backend, filters: &FilterSet) -> Result<Vec<Instance>> {
    let mut clauses = filters.clauses();
    clauses.push(FilterClause::new(
        STATE_KEY,
        VISIBLE_STATES.iter().map(|s| s.to_string()).collect(),
    ));
    log::debug!(
        "describing instances with {} clause(s) ({} from operator)",
        clauses.len(),
        filters.len()
    );
    backend.describe_instances(&clauses)
}
