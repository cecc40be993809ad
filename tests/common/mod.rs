//! Shared test utilities for Switchboard integration tests.
//!
//! Provides the example configuration, router builders and a scriptable
//! handoff dispatcher.

#![allow(dead_code)]

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use switchboard::config::SwitchboardConfig;
use switchboard::routing::{Handoff, HandoffDispatcher, HandoffError, Router};

/// The shipped example configuration.
pub const EXAMPLE_CONFIG: &str = include_str!("../../switchboard.example.toml");

pub fn example_config() -> SwitchboardConfig {
    SwitchboardConfig::parse(EXAMPLE_CONFIG).unwrap()
}

pub fn example_router() -> Arc<Router> {
    Arc::new(Router::from_config(&example_config()).unwrap())
}

/// How a scripted handler answers a handoff.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Accept,
    Reject,
    /// Accept after the given delay
    AcceptAfter(Duration),
    /// Never answer
    Hang,
}

/// Dispatcher whose answers are scripted per handler.
///
/// Handlers without a script accept immediately. Every call is counted.
#[derive(Debug, Default)]
pub struct ScriptedDispatcher {
    replies: DashMap<String, Reply>,
    calls: DashMap<String, usize>,
    total: AtomicUsize,
}

impl ScriptedDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, handler: &str, reply: Reply) -> Self {
        self.replies.insert(handler.to_string(), reply);
        self
    }

    pub fn set(&self, handler: &str, reply: Reply) {
        self.replies.insert(handler.to_string(), reply);
    }

    pub fn calls(&self, handler: &str) -> usize {
        self.calls.get(handler).map(|c| *c).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HandoffDispatcher for ScriptedDispatcher {
    async fn acknowledge(&self, handoff: &Handoff) -> Result<(), HandoffError> {
        *self.calls.entry(handoff.handler.clone()).or_insert(0) += 1;
        self.total.fetch_add(1, Ordering::SeqCst);

        let reply = self
            .replies
            .get(&handoff.handler)
            .map(|r| *r)
            .unwrap_or(Reply::Accept);

        match reply {
            Reply::Accept => Ok(()),
            Reply::Reject => Err(HandoffError::Rejected {
                handler: handoff.handler.clone(),
                reason: "scripted rejection".to_string(),
            }),
            Reply::AcceptAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Reply::Hang => std::future::pending().await,
        }
    }
}
