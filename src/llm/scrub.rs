use crate::error::GenerationError;
use crate::utils::text::clamp_text;
use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;

/// Token prefixes that identify provider credentials.
const PREFIX_PATTERNS: [&str; 5] = ["sk-", "hf_", "gsk_", "ya29.", "AIza"];

/// Markers followed by a credential value.
const MARKER_PATTERNS: [&str; 6] = [
    "Authorization: Bearer ",
    "authorization: bearer ",
    "\"authorization\":\"Bearer ",
    "api_key=",
    "\"api_key\":\"",
    "\"token\":\"",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    input[from..]
        .char_indices()
        .find(|(_, c)| !is_secret_char(*c))
        .map_or(input.len(), |(i, _)| from + i)
}

/// Prefix tokens only count at the start of a word, so `task-runner` is not
/// mistaken for an `sk-` key.
fn starts_word(input: &str, at: usize) -> bool {
    input[..at]
        .chars()
        .next_back()
        .is_none_or(|c| !c.is_alphanumeric())
}

fn scrub_after_marker(scrubbed: &mut String, marker: &str, word_start: bool) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();

        if word_start && !starts_word(scrubbed, start) {
            search_from = content_start;
            continue;
        }

        let end = token_end(scrubbed, content_start);

        // Bare marker without a value.
        if end == content_start {
            search_from = content_start;
            continue;
        }

        scrubbed.replace_range(start..end, "[REDACTED]");
        search_from = start + "[REDACTED]".len();
    }
}

/// Redact credential-looking tokens from provider error text.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let needs_scrubbing = PREFIX_PATTERNS
        .iter()
        .chain(MARKER_PATTERNS.iter())
        .any(|pattern| input.contains(pattern));
    if !needs_scrubbing {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for pattern in PREFIX_PATTERNS {
        scrub_after_marker(&mut scrubbed, pattern, true);
    }
    for pattern in MARKER_PATTERNS {
        scrub_after_marker(&mut scrubbed, pattern, false);
    }
    if scrubbed == input {
        return Cow::Borrowed(input);
    }
    Cow::Owned(scrubbed)
}

/// Scrub secrets and bound the length of provider error text.
pub fn sanitize_api_error(input: &str) -> String {
    clamp_text(&scrub_secret_patterns(input), MAX_API_ERROR_CHARS)
}

/// Build a sanitized generation error from a failed HTTP response.
pub async fn api_error(provider: &str, response: reqwest::Response) -> GenerationError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read provider error body>".to_string());
    GenerationError::Request {
        provider: provider.to_string(),
        message: format!("API error ({status}): {}", sanitize_api_error(&body)),
    }
}
