//! Queue-name sanitization.
//!
//! Queue names come straight from user-editable node fields and become both
//! map keys and directory components, so every public entry point runs them
//! through [`sanitize_queue_name`] first. Distinct raw names may collide
//! after sanitization; callers own choosing non-colliding names.

/// Fallback name for empty input.
pub const DEFAULT_QUEUE_NAME: &str = "default";

/// Maximum sanitized name length.
pub const MAX_QUEUE_NAME_LEN: usize = 80;

/// Sanitize a raw queue name into a key safe for lookup and directory
/// naming.
///
/// Trims whitespace, collapses each run of characters outside
/// `[A-Za-z0-9_.-]` to a single `_`, truncates to
/// [`MAX_QUEUE_NAME_LEN`], and falls back to [`DEFAULT_QUEUE_NAME`] when
/// the input (or the result) is empty. Idempotent.
pub fn sanitize_queue_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_QUEUE_NAME.to_string();
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut in_run = false;
    for ch in trimmed.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-') {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out.truncate(
        out.char_indices()
            .nth(MAX_QUEUE_NAME_LEN)
            .map(|(at, _)| at)
            .unwrap_or(out.len()),
    );

    if out.is_empty() {
        DEFAULT_QUEUE_NAME.to_string()
    } else {
        out
    }
}
