//! Handoff acknowledgement.
//!
//! The router does not move sessions itself. It asks a [`HandoffDispatcher`]
//! whether the chosen handler accepts the turn and waits for the answer
//! under the escalation timeout.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::registry::HandlerKind;

/// A proposed transfer of a turn to another handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Handoff {
    pub session_id: String,
    pub from_agent: String,
    /// Agent type or team id named by the matched rule
    pub target: String,
    /// Breaker key: the instance id for agents, the team id for teams
    pub handler: String,
    pub kind: HandlerKind,
}

/// Why a handler did not acknowledge a handoff.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandoffError {
    #[error("Handler '{handler}' rejected the handoff: {reason}")]
    Rejected { handler: String, reason: String },

    #[error("Handler '{handler}' is unreachable: {message}")]
    Unreachable { handler: String, message: String },
}

/// Delivers handoffs to their handlers.
#[async_trait]
pub trait HandoffDispatcher: Send + Sync {
    /// Resolve once the handler accepts the turn.
    async fn acknowledge(&self, handoff: &Handoff) -> Result<(), HandoffError>;
}

/// Accepts every handoff immediately. Used for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

#[async_trait]
impl HandoffDispatcher for AcceptAll {
    async fn acknowledge(&self, _handoff: &Handoff) -> Result<(), HandoffError> {
        Ok(())
    }
}
