//! Utility functions for the Glint workspace.

/// Truncate a string to at most `max_chars` characters.
///
/// Safely handles multi-byte UTF-8 (emoji, CJK, accented characters) by
/// cutting on character boundaries instead of byte indices. Trailing
/// whitespace left by the cut is trimmed.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].trim_end(),
        None => s,
    }
}

/// Count characters without allocating.
pub fn char_count(s: &str) -> usize {
    s.chars().count()
}
