//! Unified error types for the aura client.
//!
//! Failures fall into a small taxonomy:
//! - endpoint quota signals (`RateLimited`, `PaymentRequired`)
//! - transport failures (network, non-success status, missing body, idle stream)
//! - stream framing failures (`MalformedFrame`)
//! - caller mistakes (`InvalidRequest`, `Busy`)
//! - local output (`Workbook`)

/// Result type alias for aura operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the aura client.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The hosted function answered `429 Too Many Requests`.
    #[error("[{endpoint}] Rate limits exceeded, please try again later.")]
    RateLimited {
        /// Function that rejected the request.
        endpoint: String,
    },

    /// The hosted function answered `402 Payment Required`.
    #[error("[{endpoint}] Payment required, please add funds to your workspace.")]
    PaymentRequired {
        /// Function that rejected the request.
        endpoint: String,
    },

    /// Network failure, non-success HTTP status, missing body or stalled stream.
    #[error("{0}")]
    Transport(String),

    /// A stream frame failed to parse even after more bytes arrived.
    #[error("Malformed stream frame: {line}")]
    MalformedFrame {
        /// The offending line, as received.
        line: String,
    },

    /// The request was rejected locally before reaching the network.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Another chat request is already in flight for this session.
    #[error("A request is already in progress")]
    Busy,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The spreadsheet workbook could not be built or saved.
    #[error("Workbook error: {0}")]
    Workbook(String),
}

impl Error {
    /// Create a rate limit error for the given function.
    #[must_use]
    pub fn rate_limited(endpoint: impl Into<String>) -> Self {
        Self::RateLimited {
            endpoint: endpoint.into(),
        }
    }

    /// Create a payment-required error for the given function.
    #[must_use]
    pub fn payment_required(endpoint: impl Into<String>) -> Self {
        Self::PaymentRequired {
            endpoint: endpoint.into(),
        }
    }

    /// Create a transport error with a message.
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a malformed frame error.
    #[must_use]
    pub fn malformed_frame(line: impl Into<String>) -> Self {
        Self::MalformedFrame { line: line.into() }
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a workbook error.
    #[must_use]
    pub fn workbook(msg: impl Into<String>) -> Self {
        Self::Workbook(msg.into())
    }

    /// Check if retrying the same request later could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transport(_))
    }

    /// Check if this error came from the network side of the pipeline.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::PaymentRequired { .. } | Self::Transport(_)
        )
    }

    /// Message suitable for showing to an end user, without the endpoint tag.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited { .. } => "Rate limits exceeded, please try again later.".to_owned(),
            Self::PaymentRequired { .. } => {
                "Payment required, please add funds to your workspace.".to_owned()
            }
            Self::Transport(msg) if msg.is_empty() => {
                "Failed to get response. Please try again.".to_owned()
            }
            other => other.to_string(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Workbook(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Transport(format!("request timed out: {err}"));
        }
        if err.is_decode() {
            return Self::Transport(format!("failed to decode response: {err}"));
        }
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::rate_limited("business-assistant");
        assert_eq!(
            err.to_string(),
            "[business-assistant] Rate limits exceeded, please try again later."
        );

        let err = Error::malformed_frame("data: {oops");
        assert!(err.to_string().contains("data: {oops"));
    }

    #[test]
    fn test_retryable() {
        assert!(Error::rate_limited("x").is_retryable());
        assert!(Error::transport("connection reset").is_retryable());
        assert!(!Error::payment_required("x").is_retryable());
        assert!(!Error::Busy.is_retryable());
    }

    #[test]
    fn test_transport_classification() {
        assert!(Error::payment_required("x").is_transport());
        assert!(!Error::malformed_frame("x").is_transport());
        assert!(!Error::invalid_request("empty").is_transport());
    }

    #[test]
    fn test_user_message_strips_endpoint() {
        let msg = Error::payment_required("analyze-business-data").user_message();
        assert!(!msg.contains("analyze-business-data"));
        assert_eq!(
            Error::transport("").user_message(),
            "Failed to get response. Please try again."
        );
    }
}
