//! Error types for routing calls

use thiserror::Error;

/// Errors returned by [`Router::evaluate`](super::Router::evaluate) and
/// [`Router::route`](super::Router::route).
///
/// Routing outcomes (no match, unavailable target, no capacity) are
/// decisions, not errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// The turn names a current agent that is not in the table
    #[error("Unknown agent '{0}'")]
    UnknownAgent(String),

    /// The surrounding request was cancelled before a decision was reached
    #[error("Routing cancelled for session '{session_id}'")]
    Cancelled { session_id: String },
}
