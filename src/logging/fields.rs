//! Field helpers for structured logging

use crate::routing::HandoffError;

const PREVIEW_CHARS: usize = 100;

/// Truncated turn text for logs (privacy-safe)
///
/// Returns None if content logging is disabled or the text is empty.
/// Truncation counts characters, so multi-byte text is never split.
///
/// # Examples
///
/// ```
/// use switchboard::logging::turn_preview;
///
/// assert_eq!(turn_preview("my invoice is wrong", false), None);
/// assert_eq!(turn_preview("my invoice is wrong", true).as_deref(), Some("my invoice is wrong"));
/// ```
pub fn turn_preview(text: &str, enable_content_logging: bool) -> Option<String> {
    if !enable_content_logging || text.is_empty() {
        return None;
    }

    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => Some(format!("{}...", &text[..cut])),
        None => Some(text.to_string()),
    }
}

/// Outcome label and error message for a handoff result
///
/// - For Ok results: ("success", None)
/// - For Err results: ("rejected" | "unreachable", Some(message))
pub fn outcome_field(result: &Result<(), HandoffError>) -> (&'static str, Option<String>) {
    match result {
        Ok(()) => ("success", None),
        Err(e @ HandoffError::Rejected { .. }) => ("rejected", Some(e.to_string())),
        Err(e @ HandoffError::Unreachable { .. }) => ("unreachable", Some(e.to_string())),
    }
}
