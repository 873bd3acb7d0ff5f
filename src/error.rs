//! Error types for the subscription tracking core.
//!
//! All errors implement the standard [`std::error::Error`] trait via
//! [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Authentication** ([`TrackerError::Auth`]): invalid credentials or an
//!   invalid/expired token
//! - **Validation** ([`TrackerError::Validation`]): caller-side input
//!   rejection, raised before any network call
//! - **Not found** ([`TrackerError::NotFound`]): a mutation referenced an id
//!   absent locally or remotely
//! - **Transport** ([`TrackerError::Transport`]): network/connectivity
//!   failure
//! - **Server** ([`TrackerError::Server`]): non-2xx application response
//! - **In-flight conflict** ([`TrackerError::OperationInFlight`]): a second
//!   mutation targeted a record whose previous mutation has not completed

use thiserror::Error;

/// Result type alias for tracker operations.
///
/// All fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors that can occur in the subscription tracking core.
///
/// The core performs no retries and no silent recovery: every failure is
/// surfaced to the caller, and a failed mutation leaves local state exactly
/// as it was before the call.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Authentication failed or the session token is invalid/expired.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Input was rejected before reaching the remote API.
    ///
    /// Raised for missing required subscription fields and non-positive
    /// prices. Validation errors never produce a network call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A mutation referenced a subscription id that does not exist.
    #[error("subscription not found: {0}")]
    NotFound(String),

    /// HTTP transport failed (timeout, DNS, connection refused, TLS).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote API answered with a non-2xx status.
    ///
    /// `message` carries the `error` field of the response envelope when
    /// the body could be parsed, so callers may always display it.
    #[error("server returned status {status}: {}", message.as_deref().unwrap_or("no error detail"))]
    Server {
        /// HTTP status code of the response.
        status: u16,
        /// Error detail extracted from the response envelope, if any.
        message: Option<String>,
    },

    /// Reading or writing persisted credentials failed.
    #[error("credential storage error: {0}")]
    Storage(String),

    /// A mutation for this id is already awaiting its server round-trip.
    ///
    /// The store applies last-writer-wins replacement with no version
    /// check, so concurrent mutations against one record are rejected
    /// rather than allowed to race.
    #[error("a mutation for subscription {0} is already in flight")]
    OperationInFlight(String),
}

impl TrackerError {
    /// Error detail suitable for the caller to display verbatim.
    ///
    /// For server errors this prefers the envelope's `error` field over the
    /// status line.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Server { message: Some(msg), .. } => msg.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let error = TrackerError::Auth("invalid credentials".into());
        assert_eq!(error.to_string(), "authentication failed: invalid credentials");
    }

    #[test]
    fn test_validation_error_display() {
        let error = TrackerError::Validation("price must be positive".into());
        assert!(error.to_string().contains("price must be positive"));
    }

    #[test]
    fn test_server_error_with_message() {
        let error = TrackerError::Server { status: 409, message: Some("email taken".into()) };
        assert_eq!(error.to_string(), "server returned status 409: email taken");
        assert_eq!(error.display_message(), "email taken");
    }

    #[test]
    fn test_server_error_without_message() {
        let error = TrackerError::Server { status: 500, message: None };
        assert_eq!(error.to_string(), "server returned status 500: no error detail");
    }

    #[test]
    fn test_not_found_display() {
        let error = TrackerError::NotFound("sub-123".into());
        assert_eq!(error.to_string(), "subscription not found: sub-123");
    }

    #[test]
    fn test_operation_in_flight_display() {
        let error = TrackerError::OperationInFlight("sub-9".into());
        assert!(error.to_string().contains("already in flight"));
    }
}
