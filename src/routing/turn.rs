//! Conversation turns as seen by the router.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One inbound message and the agent currently handling its session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub text: String,
    pub session_id: String,
    pub agent_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a turn timestamped now.
    pub fn new(
        session_id: impl Into<String>,
        agent_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            session_id: session_id.into(),
            agent_id: agent_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a turn with a fresh random session id.
    pub fn ad_hoc(agent_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), agent_id, text)
    }
}
