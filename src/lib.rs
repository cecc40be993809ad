//! Switchboard - escalation routing for multi-agent customer service
//!
//! Decides, for each conversation turn, whether the agent handling it keeps
//! the turn or hands it to a specialised agent or external team. Escalation
//! rules are ordered per agent, handlers are guarded by circuit breakers,
//! and agent instances are picked by load.
//!
//! ```
//! use switchboard::config::SwitchboardConfig;
//! use switchboard::routing::Router;
//!
//! let config = SwitchboardConfig::parse(r#"
//! [routing]
//! sentiment_triggers = []
//!
//! [[agents]]
//! id = "customer_service"
//!
//! [[agents.rules]]
//! trigger = "security breach"
//! target = "security_team"
//!
//! [[teams]]
//! id = "security_team"
//! "#).unwrap();
//!
//! let router = Router::from_config(&config).unwrap();
//! let decision = router
//!     .evaluate_text("customer_service", "I think there was a Security Breach")
//!     .unwrap();
//! assert_eq!(decision.target(), Some("security_team"));
//! ```

pub mod breaker;
pub mod cli;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod routing;
