/// Marker appended to text that was cut short.
pub const ELLIPSIS: char = '…';

/// Clamp `s` to at most `max_chars` characters.
///
/// Text that fits is returned unchanged. Longer text keeps its first
/// `max_chars - 1` characters followed by a single `…`, so the result is
/// exactly `max_chars` characters long. Counting is by `char`, never bytes.
#[must_use]
pub fn clamp_text(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    match s.char_indices().nth(max_chars) {
        Some(_) => {
            let cut = s
                .char_indices()
                .nth(max_chars - 1)
                .map_or(s.len(), |(idx, _)| idx);
            let mut clamped = String::with_capacity(cut + ELLIPSIS.len_utf8());
            clamped.push_str(&s[..cut]);
            clamped.push(ELLIPSIS);
            clamped
        }
        None => s.to_string(),
    }
}

/// Truncate to `max_chars` characters without adding a marker.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
