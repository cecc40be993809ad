//! Agent load selection
//!
//! Picks the least-loaded instance of an agent type that still has room
//! for another session.

use serde::Serialize;
use thiserror::Error;

use super::InstanceStatus;

/// Point-in-time load of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceLoad {
    pub instance_id: String,
    pub priority: i32,
    pub status: InstanceStatus,
    pub sessions: u32,
}

/// Why no instance could be selected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// There were no candidates to choose from
    #[error("no instances to select from")]
    NoInstances,

    /// Every candidate already holds the maximum number of sessions.
    /// Not a routing failure: the caller decides whether to queue or reject.
    #[error("all instances at capacity ({max_sessions} sessions each)")]
    NoCapacity { max_sessions: u32 },
}

/// Select the candidate with the fewest live sessions below `max_sessions`.
///
/// Candidates are expected in priority order; on equal load the earlier
/// one wins.
///
/// # Examples
///
/// ```
/// use switchboard::registry::{select_instance, InstanceLoad, InstanceStatus};
///
/// let loads = vec![
///     InstanceLoad { instance_id: "a".into(), priority: 1, status: InstanceStatus::Healthy, sessions: 4 },
///     InstanceLoad { instance_id: "b".into(), priority: 2, status: InstanceStatus::Healthy, sessions: 1 },
/// ];
/// let picked = select_instance(&loads, 5).unwrap();
/// assert_eq!(picked.instance_id, "b");
/// ```
pub fn select_instance(
    candidates: &[InstanceLoad],
    max_sessions: u32,
) -> Result<&InstanceLoad, SelectionError> {
    if candidates.is_empty() {
        return Err(SelectionError::NoInstances);
    }

    // min_by_key returns the first minimum, which keeps priority order on ties
    candidates
        .iter()
        .filter(|c| c.sessions < max_sessions)
        .min_by_key(|c| c.sessions)
        .ok_or(SelectionError::NoCapacity { max_sessions })
}
