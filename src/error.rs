use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong while connecting an account.
///
/// The `Display` text is what ends up in
/// [`ConnectionState::Error`](crate::connect::state::ConnectionState::Error),
/// so each message is written for the end user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The browser refused to open the authorization window.
    #[error("Pop-up blocked. Please allow pop-ups for this site.")]
    PopupBlocked,

    /// The request never produced an HTTP response.
    #[error("{0}")]
    Network(String),

    /// The backend answered with a failure status.
    #[error("{detail}")]
    Backend { status: u16, detail: String },

    /// The window closed but no credentials were waiting.
    #[error("Failed to retrieve credentials")]
    ExchangeIncomplete,

    #[error("Authorization timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("not connected")]
    NotConnected,
}

impl ConnectError {
    /// Whether starting a fresh authorization may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ConnectError::InvalidIdentity(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_shows_detail_only() {
        let err = ConnectError::Backend {
            status: 500,
            detail: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "rate limited");
    }

    #[test]
    fn popup_blocked_tells_user_what_to_do() {
        assert!(
            ConnectError::PopupBlocked
                .to_string()
                .contains("allow pop-ups")
        );
    }

    #[test]
    fn timeout_message_in_seconds() {
        let err = ConnectError::TimedOut(Duration::from_secs(600));
        assert_eq!(err.to_string(), "Authorization timed out after 600s");
    }

    #[test]
    fn only_identity_errors_are_final() {
        assert!(ConnectError::PopupBlocked.is_retryable());
        assert!(ConnectError::ExchangeIncomplete.is_retryable());
        assert!(!ConnectError::InvalidIdentity("user_id".to_string()).is_retryable());
    }
}
