//! Whitespace cleanup for extracted text

/// Collapses every whitespace run (newlines included) to a single space and trims the ends
///
/// Idempotent: `clean_text(&clean_text(x)) == clean_text(x)`.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
