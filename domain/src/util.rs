//! Shared utility functions.

/// Single-line preview of free text for log lines.
///
/// Newlines collapse to spaces; text longer than `max_chars` characters is
/// cut and suffixed with `...`. Symptom text is user-authored, so counting
/// is by `char` rather than byte.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let kept: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}
