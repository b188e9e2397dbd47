//! Error types module
//!
//! All client-side failures are unified under the `AttachError` enum: local
//! validation, terminal server rejections, transient failures that exhausted
//! the retry budget, and response-parsing problems.

/// Server rejection messages that must never be retried. The server reports
/// these as human-readable text, so detection is by substring; the patterns
/// track the upload endpoint's rejection messages verbatim.
const TERMINAL_PATTERNS: [&str; 6] = [
    "Too many files",
    "invalid parent_type",
    "invalid parent_id",
    "Failed to parse uploaded files",
    "Request size may be too large",
    "413",
];

/// Whether a server error message belongs to the non-retryable class.
pub fn is_terminal_rejection(message: &str) -> bool {
    TERMINAL_PATTERNS.iter().any(|p| message.contains(p))
}

/// Extract a user-facing message from an error response body. Bodies are
/// expected to be JSON with an `error` or `message` field; anything else is
/// used verbatim. An empty body falls back to the status code.
pub fn extract_error_message(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    if body.trim().is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    /// Rejected locally, nothing was sent.
    #[error("{0}")]
    Validation(String),

    #[error("CSRF token not found")]
    MissingCsrf,

    /// Server rejection matching the non-retryable class; exactly one
    /// attempt was made.
    #[error("{0}")]
    Terminal(String),

    /// Transient failure that survived the whole retry budget.
    #[error("{message}")]
    Exhausted { message: String, attempts: u32 },

    /// Non-success outside the retrying upload path (delete, listing).
    #[error("{0}")]
    Server(String),

    #[error("invalid response: {0}")]
    Parse(String),

    #[error("network error: {0}")]
    Network(String),
}

impl AttachError {
    /// Machine-readable code, mirrored into tracing fields.
    pub fn error_code(&self) -> &'static str {
        match self {
            AttachError::Validation(_) => "VALIDATION_ERROR",
            AttachError::MissingCsrf => "MISSING_CSRF",
            AttachError::Terminal(_) => "TERMINAL_SERVER_ERROR",
            AttachError::Exhausted { .. } => "TRANSIENT_ERROR",
            AttachError::Server(_) => "SERVER_ERROR",
            AttachError::Parse(_) => "PARSE_ERROR",
            AttachError::Network(_) => "NETWORK_ERROR",
        }
    }

    /// Whether retrying the same operation could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AttachError::Exhausted { .. } | AttachError::Server(_) | AttachError::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_rejection_patterns() {
        assert!(is_terminal_rejection("Too many files in one request"));
        assert!(is_terminal_rejection("invalid parent_type: blog"));
        assert!(is_terminal_rejection("413"));
        assert!(!is_terminal_rejection("connection reset by peer"));
        assert!(!is_terminal_rejection("Internal server error"));
    }

    #[test]
    fn extract_prefers_error_field() {
        assert_eq!(
            extract_error_message(r#"{"error":"not found"}"#, 404),
            "not found"
        );
        assert_eq!(
            extract_error_message(r#"{"message":"denied"}"#, 403),
            "denied"
        );
    }

    #[test]
    fn extract_falls_back_to_raw_body_then_status() {
        assert_eq!(extract_error_message("plain text", 500), "plain text");
        assert_eq!(extract_error_message("", 502), "502");
        // JSON without the known keys is used verbatim
        assert_eq!(
            extract_error_message(r#"{"detail":"x"}"#, 500),
            r#"{"detail":"x"}"#
        );
    }

    #[test]
    fn error_codes_and_recoverability() {
        let err = AttachError::Terminal("Too many files".into());
        assert_eq!(err.error_code(), "TERMINAL_SERVER_ERROR");
        assert!(!err.is_recoverable());

        let err = AttachError::Exhausted {
            message: "Network error".into(),
            attempts: 3,
        };
        assert_eq!(err.error_code(), "TRANSIENT_ERROR");
        assert!(err.is_recoverable());

        assert!(!AttachError::MissingCsrf.is_recoverable());
    }
}
