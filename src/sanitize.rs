//! Acronym name sanitization
//!
//! Names typed by the user are reduced to a safe character set before they
//! reach the cache database or the server URL.

/// Returns true for characters allowed in an acronym name
fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Strips every character outside `[A-Za-z0-9._-]`
///
/// Returns `None` when nothing is left.
pub fn sanitize(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|&c| is_allowed(c)).collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
