use once_cell::sync::Lazy;
use regex::Regex;

use rewriter_core::config::DEFAULT_BASE_URL;

static VERSION_SEGMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/v\d+(/|$)").unwrap());

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Builds the chat-completions endpoint from a configured base URL.
///
/// A blank base falls back to the public OpenAI endpoint. A `/v1` segment is
/// added when the base carries no version, unless the base ends in `#`, which
/// marks it as already complete. A base that already names the
/// `/chat/completions` path is used as is.
pub fn chat_completions_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    let base = if trimmed.is_empty() {
        DEFAULT_BASE_URL
    } else {
        trimmed
    };

    if let Some(verbatim) = base.strip_suffix('#') {
        return join_path(verbatim);
    }

    let base = base.trim_end_matches('/');
    if base.ends_with(CHAT_COMPLETIONS_PATH) {
        return base.to_string();
    }
    if VERSION_SEGMENT_RE.is_match(base) {
        join_path(base)
    } else {
        join_path(&format!("{base}/v1"))
    }
}

fn join_path(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with(CHAT_COMPLETIONS_PATH) {
        base.to_string()
    } else {
        format!("{base}{CHAT_COMPLETIONS_PATH}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_base_uses_openai() {
        assert_eq!(
            chat_completions_url("  "),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn appends_v1_when_missing() {
        assert_eq!(
            chat_completions_url("http://127.0.0.1:8080/"),
            "http://127.0.0.1:8080/v1/chat/completions"
        );
    }

    #[test]
    fn keeps_existing_version() {
        assert_eq!(
            chat_completions_url("https://example.com/v2"),
            "https://example.com/v2/chat/completions"
        );
        assert_eq!(
            chat_completions_url("https://example.com/api/v3/openai"),
            "https://example.com/api/v3/openai/chat/completions"
        );
    }

    #[test]
    fn hash_suffix_skips_version() {
        assert_eq!(
            chat_completions_url("https://proxy.local/llm#"),
            "https://proxy.local/llm/chat/completions"
        );
    }

    #[test]
    fn full_endpoint_is_untouched() {
        assert_eq!(
            chat_completions_url("https://example.com/v1/chat/completions"),
            "https://example.com/v1/chat/completions"
        );
    }
}
