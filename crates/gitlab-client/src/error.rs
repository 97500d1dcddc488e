//! Error taxonomy for the GitLab client
//!
//! Every failure the pipeline can produce is a [`GitLabError`] variant, so
//! hosts can distinguish kinds without string matching. Remote error
//! payloads are additionally parsed into a structured [`ApiError`].

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Generic kind reported when an error payload carries no `error` field.
pub const DEFAULT_ERROR_KIND: &str = "error";

/// Canonical kind reported when a token has been revoked or rejected.
pub const INVALID_TOKEN_KIND: &str = "invalid_token";

/// Errors produced by the request/response pipeline.
#[derive(Debug, Error)]
pub enum GitLabError {
    /// The configured token was rejected by the validation probe.
    /// Raised before any transport attempt for the real call.
    #[error("GitLab token {token:?} is invalid")]
    InvalidToken { token: String },

    /// The remote service answered with a recognized error payload.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An error payload line did not match the `key: value` shape.
    /// The remote contract is considered violated at that point.
    #[error("invalid error config: {lines:?}")]
    MalformedErrorConfig { lines: Vec<String> },

    /// The response body was not valid JSON.
    #[error("[{url}]: malformed response: {detail}")]
    MalformedResponse { url: String, detail: String },

    /// The transport collaborator could not complete the call at all.
    #[error("[{url}]: transport returned no response: {}", .detail.as_deref().unwrap_or("unknown error"))]
    Transport { url: String, detail: Option<String> },

    /// A non-indexable value was used as a record key.
    #[error("cannot use a {kind} value as a record key")]
    InvalidKey { kind: &'static str },
}

/// A structured error parsed from a remote error payload.
///
/// Payload fields arrive rendered as `"key: value"` lines, for example:
///
/// ```text
/// error: "invalid_token"
/// error_description: "Token was revoked. You have to re-authorize from the user."
/// ```
///
/// The composite message joins all lines; individual fields are retrievable
/// via [`ApiError::field`].
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    message: String,
    fields: HashMap<String, String>,
}

fn error_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^"?(?P<key>\w+?)"?:\s*"?(?P<value>.*?)"?$"#).expect("pattern is valid")
    })
}

impl ApiError {
    /// Parse `"key: value"` lines into a structured error.
    ///
    /// Keys are word-character sequences; values are the remainder with
    /// surrounding quotes stripped. Any line that does not match fails the
    /// whole classification with [`GitLabError::MalformedErrorConfig`] —
    /// strict by design, no partial result.
    ///
    /// An empty line list yields a valid, fieldless error with the default
    /// kind, usable as a plain message carrier.
    pub fn from_lines(lines: &[String]) -> Result<Self, GitLabError> {
        let mut fields = HashMap::new();
        for line in lines {
            let Some(captures) = error_line_pattern().captures(line) else {
                return Err(GitLabError::MalformedErrorConfig {
                    lines: lines.to_vec(),
                });
            };
            fields.insert(captures["key"].to_string(), captures["value"].to_string());
        }
        Ok(Self {
            message: lines.join("\n"),
            fields,
        })
    }

    /// Message-only error with no parsed fields.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: HashMap::new(),
        }
    }

    /// The error's category: the `error` field when present, else the
    /// generic [`DEFAULT_ERROR_KIND`].
    pub fn kind(&self) -> &str {
        self.field("error").unwrap_or(DEFAULT_ERROR_KIND)
    }

    pub fn is_default_kind(&self) -> bool {
        self.kind() == DEFAULT_ERROR_KIND
    }

    /// Look up a parsed payload field.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// All parsed payload fields.
    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    /// The composite human-readable message (all payload lines joined).
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn test_parses_every_matching_line() {
        let error = ApiError::from_lines(&lines(&[
            r#"error: "invalid_token""#,
            r#"error_description: "Token was revoked.""#,
        ]))
        .unwrap();

        assert_eq!(error.field("error"), Some("invalid_token"));
        assert_eq!(error.field("error_description"), Some("Token was revoked."));
        assert_eq!(error.field("missing"), None);
        assert!(error.has_field("error"));
    }

    #[test]
    fn test_quotes_around_key_and_value_are_optional() {
        let error = ApiError::from_lines(&lines(&[
            r#""scope": read_api"#,
            "state: opened",
        ]))
        .unwrap();

        assert_eq!(error.field("scope"), Some("read_api"));
        assert_eq!(error.field("state"), Some("opened"));
    }

    #[test]
    fn test_kind_falls_back_to_default() {
        let error = ApiError::from_lines(&lines(&[r#"message: "404 Not Found""#])).unwrap();
        assert_eq!(error.kind(), DEFAULT_ERROR_KIND);
        assert!(error.is_default_kind());

        let error = ApiError::from_lines(&lines(&[r#"error: "invalid_token""#])).unwrap();
        assert_eq!(error.kind(), INVALID_TOKEN_KIND);
        assert!(!error.is_default_kind());
    }

    #[test]
    fn test_single_bad_line_fails_whole_classification() {
        let input = lines(&[r#"error: "invalid_token""#, "no separator here"]);
        let result = ApiError::from_lines(&input);

        assert!(matches!(
            result,
            Err(GitLabError::MalformedErrorConfig { lines }) if lines.len() == 2
        ));
    }

    #[test]
    fn test_empty_lines_yield_fieldless_default_error() {
        let error = ApiError::from_lines(&[]).unwrap();
        assert!(error.fields().is_empty());
        assert!(error.is_default_kind());
        assert_eq!(error.message(), "");
    }

    #[test]
    fn test_message_joins_all_lines() {
        let error = ApiError::from_lines(&lines(&["error: a", "detail: b"])).unwrap();
        assert_eq!(error.message(), "error: a\ndetail: b");
        assert_eq!(error.to_string(), "error: a\ndetail: b");
    }

    #[test]
    fn test_from_message_carries_text_only() {
        let error = ApiError::from_message("boom");
        assert_eq!(error.message(), "boom");
        assert!(error.is_default_kind());
        assert_eq!(error.field("error"), None);
    }
}
