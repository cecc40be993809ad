//! Structured logging helpers
//!
//! Filter construction for the tracing subscriber and field helpers used by
//! the router when it logs turns.

pub mod fields;

pub use fields::{outcome_field, turn_preview};

/// Build the `EnvFilter` directive string for a logging configuration.
///
/// The base level comes first, followed by one `switchboard::<component>`
/// directive per override in component order.
///
/// # Examples
///
/// ```
/// use switchboard::config::LoggingConfig;
/// use switchboard::logging::build_filter_directives;
///
/// let mut config = LoggingConfig::default();
/// config
///     .component_levels
///     .insert("breaker".to_string(), "debug".to_string());
///
/// assert_eq!(build_filter_directives(&config), "info,switchboard::breaker=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    config
        .component_levels
        .iter()
        .fold(config.level.clone(), |mut filter, (component, level)| {
            filter.push_str(&format!(",switchboard::{}={}", component, level));
            filter
        })
}
