use crate::error::ProviderError;
use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;
const REDACTED: &str = "[REDACTED]";

const PREFIX_PATTERNS: [&str; 4] = ["sk-", "axn_", "ghp_", "eyJ"];

const MARKER_PATTERNS: [&str; 9] = [
    "Authorization: Bearer ",
    "authorization: bearer ",
    "\"authorization\":\"Bearer ",
    "api_key=",
    "access_token=",
    "\"api_key\":\"",
    "\"apiKey\":\"",
    "\"access_token\":\"",
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

fn redact_after(scrubbed: &mut String, marker: &str) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let value_start = start + marker.len();
        let end = token_end(scrubbed, value_start);

        // Bare marker with nothing after it.
        if end == value_start {
            search_from = value_start;
            continue;
        }

        scrubbed.replace_range(start..end, REDACTED);
        search_from = start + REDACTED.len();
    }
}

/// Redact bearer tokens and API keys from backend error text.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let needs_scrubbing = PREFIX_PATTERNS
        .iter()
        .chain(MARKER_PATTERNS.iter())
        .any(|pattern| input.contains(pattern));
    if !needs_scrubbing {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for marker in MARKER_PATTERNS.iter().chain(PREFIX_PATTERNS.iter()) {
        redact_after(&mut scrubbed, marker);
    }
    Cow::Owned(scrubbed)
}

/// Scrub secrets and cap the length of an error body.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);
    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &scrubbed[..end])
}

/// Build a sanitized provider error from a non-2xx response.
pub async fn api_error(provider: &str, response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    ProviderError::Status {
        provider: provider.to_string(),
        status,
        body: sanitize_api_error(&body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_is_borrowed() {
        let input = "upstream timed out";
        assert!(matches!(scrub_secret_patterns(input), Cow::Borrowed(_)));
    }

    #[test]
    fn bearer_tokens_are_redacted() {
        let out = scrub_secret_patterns("rejected Authorization: Bearer abc.def-123 header");
        assert_eq!(out, "rejected [REDACTED] header");
    }

    #[test]
    fn json_api_keys_are_redacted() {
        let out = scrub_secret_patterns(r#"{"apiKey":"axn_live_9f8e","error":"bad key"}"#);
        assert!(!out.contains("axn_live_9f8e"));
        assert!(out.contains(REDACTED));
        assert!(out.contains("bad key"));
    }

    #[test]
    fn bare_marker_is_left_alone() {
        let out = scrub_secret_patterns("missing api_key= in query");
        assert_eq!(out, "missing api_key= in query");
    }

    #[test]
    fn long_errors_are_truncated_on_char_boundary() {
        let long = "é".repeat(300);
        let out = sanitize_api_error(&long);
        assert!(out.ends_with("..."));
        assert!(out.chars().count() <= MAX_API_ERROR_CHARS + 3);
    }
}
