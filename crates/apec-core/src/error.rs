use thiserror::Error;

/// Application-wide error types for apec-bot.
///
/// Every variant except those absorbed into a [`SubmitOutcome`](crate::submit::SubmitOutcome)
/// is fatal to the run: the pipeline stops at the offending posting and the
/// ledger is left untouched for it, so the posting stays eligible next run.
#[derive(Error, Debug)]
pub enum AppError {
    /// The target rejected the session cookie (HTTP 401).
    #[error("session rejected (HTTP 401): {body}")]
    SessionInvalid { body: String },

    /// The target refused the operation (HTTP 403).
    #[error("access denied (HTTP 403): {body}")]
    AccessDenied { body: String },

    /// The posting no longer exists on the board (HTTP 404).
    #[error("posting not found (HTTP 404): {body}")]
    PostingNotFound { body: String },

    /// Any non-success status outside the recognised classes.
    #[error("unexpected HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Network/connection error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// JSON serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Ledger persistence failed.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AppError {
    /// Returns true if the failure points at a stale or missing session,
    /// meaning the operator must re-acquire a cookie before re-running.
    pub fn is_session_failure(&self) -> bool {
        matches!(self, AppError::SessionInvalid { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_failure_detection() {
        assert!(
            AppError::SessionInvalid {
                body: "{}".into()
            }
            .is_session_failure()
        );
        assert!(
            !AppError::AccessDenied {
                body: "{}".into()
            }
            .is_session_failure()
        );
        assert!(!AppError::Network("reset".into()).is_session_failure());
    }

    #[test]
    fn test_display_includes_status() {
        let err = AppError::UnexpectedStatus {
            status: 502,
            body: "bad gateway".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("502"));
        assert!(msg.contains("bad gateway"));
    }
}
