//! Error types for email delivery

use thiserror::Error;

/// Result type for mailer operations
pub type MailerResult<T> = Result<T, MailerError>;

/// Errors that can occur while handing an email to the provider
#[derive(Error, Debug)]
pub enum MailerError {
    /// HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// Request never produced a response (DNS, TLS, timeout, connection reset)
    #[error("Email provider unreachable: {0}")]
    Transport(String),

    /// Provider answered with a non-success status
    #[error("Email provider rejected the message with status {status}: {body}")]
    Rejected {
        /// HTTP status returned by the provider
        status: u16,
        /// Raw response body, kept for logs
        body: String,
    },

    /// Provider answered 2xx but the body could not be understood
    #[error("Unexpected response from email provider: {0}")]
    InvalidResponse(String),
}

impl MailerError {
    /// Whether sending the same message again might succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::Client(_) | Self::InvalidResponse(_) => false,
        }
    }
}

impl From<reqwest_middleware::Error> for MailerError {
    fn from(error: reqwest_middleware::Error) -> Self {
        Self::Transport(error.to_string())
    }
}
