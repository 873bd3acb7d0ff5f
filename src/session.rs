//! Session lifecycle: login, registration, logout, and startup restore.
//!
//! [`SessionManager`] owns the authenticated-user identity and the
//! credential token. It is the only mutator of session state; the gateway
//! and credential store are injected so the manager stays testable and the
//! session never lives in ambient global state.
//!
//! # Phase machine
//!
//! ```text
//! Uninitialized ──restore──► Initializing ──┬─► Authenticated
//!                                           └─► Unauthenticated
//! Authenticated ──logout / failed restore──► Unauthenticated
//! Unauthenticated ──login / register──────► Authenticated
//! ```
//!
//! No other transitions exist. Callers observe [`AuthPhase::Initializing`]
//! as a phase distinct from unauthenticated, so startup UI can hold until
//! restore fully resolves.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Result, TrackerError};
use crate::gateway::Gateway;
use crate::model::Session;
use crate::storage::CredentialStore;

/// Fallback message when registration fails without any detail.
const GENERIC_REGISTRATION_ERROR: &str = "An unknown registration error occurred";

/// Where the session manager is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPhase {
    /// Startup restore has not been attempted yet.
    Uninitialized,
    /// Startup restore is resolving.
    Initializing,
    /// A user is signed in.
    Authenticated(Session),
    /// No user is signed in.
    Unauthenticated,
}

/// Owns the current session and credential token.
pub struct SessionManager {
    gateway: Arc<dyn Gateway>,
    credentials: Arc<dyn CredentialStore>,
    phase: AuthPhase,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").field("phase", &self.phase).finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a manager in the [`AuthPhase::Uninitialized`] phase.
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self { gateway, credentials, phase: AuthPhase::Uninitialized }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> &AuthPhase {
        &self.phase
    }

    /// The current session, if authenticated.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match &self.phase {
            AuthPhase::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// Restores a persisted session at startup.
    ///
    /// Invoked once. If a token is persisted, a persisted session snapshot
    /// is reused when present; otherwise the current user is fetched from
    /// the gateway and the result persisted. A failed fetch means the token
    /// is invalid: it is cleared and the manager lands unauthenticated.
    /// Either way the phase fully resolves before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] if restore was already
    /// attempted, or [`TrackerError::Storage`] if persisted credentials
    /// cannot be read or written. A rejected token is not an error.
    pub async fn restore_session(&mut self) -> Result<&AuthPhase> {
        if self.phase != AuthPhase::Uninitialized {
            return Err(TrackerError::Validation("session already initialized".into()));
        }
        self.phase = AuthPhase::Initializing;

        let Some(token) = self.credentials.load_token()? else {
            debug!("no persisted token; starting unauthenticated");
            self.phase = AuthPhase::Unauthenticated;
            return Ok(&self.phase);
        };
        self.gateway.set_token(Some(token));

        if let Some(session) = self.credentials.load_session()? {
            debug!(user = %session.user.id, "restored session from snapshot");
            self.phase = AuthPhase::Authenticated(session);
            return Ok(&self.phase);
        }

        // Token without a snapshot: ask the server who we are.
        match self.gateway.current_user().await {
            Ok(user) => {
                let session = Session { user };
                self.credentials.save_session(&session)?;
                debug!(user = %session.user.id, "restored session from server");
                self.phase = AuthPhase::Authenticated(session);
            }
            Err(error) => {
                warn!(%error, "persisted token rejected; clearing credentials");
                self.credentials.clear()?;
                self.gateway.set_token(None);
                self.phase = AuthPhase::Unauthenticated;
            }
        }
        Ok(&self.phase)
    }

    /// Signs in with existing credentials.
    ///
    /// On success the token and session snapshot are persisted together and
    /// the token is installed into the gateway.
    ///
    /// # Errors
    ///
    /// Surfaces the gateway's error unchanged (invalid credentials arrive
    /// as [`TrackerError::Auth`], network failures as
    /// [`TrackerError::Transport`]). Also fails if a session is already
    /// active.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Session> {
        self.ensure_signed_out()?;
        let auth = self.gateway.sign_in(email, password).await?;
        self.install(auth.token, Session { user: auth.user })
    }

    /// Registers a new account and signs in.
    ///
    /// # Errors
    ///
    /// On failure returns [`TrackerError::Auth`] with a normalized message:
    /// the error extracted from the gateway response body if present, else
    /// the raw transport error, else a generic fallback. Callers may always
    /// display the message directly.
    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Session> {
        self.ensure_signed_out()?;
        match self.gateway.sign_up(email, password, name).await {
            Ok(auth) => self.install(auth.token, Session { user: auth.user }),
            Err(error) => Err(TrackerError::Auth(normalize_registration_error(&error))),
        }
    }

    /// Signs out: clears the persisted token and session together, clears
    /// the gateway token, and lands unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Storage`] if persisted credentials cannot be
    /// removed. The in-memory session is cleared regardless.
    pub fn logout(&mut self) -> Result<()> {
        self.phase = AuthPhase::Unauthenticated;
        self.gateway.set_token(None);
        self.credentials.clear()
    }

    fn ensure_signed_out(&self) -> Result<()> {
        match self.phase {
            AuthPhase::Authenticated(_) => {
                Err(TrackerError::Validation("a session is already active".into()))
            }
            _ => Ok(()),
        }
    }

    fn install(&mut self, token: String, session: Session) -> Result<Session> {
        self.credentials.save_token(&token)?;
        self.credentials.save_session(&session)?;
        self.gateway.set_token(Some(token));
        self.phase = AuthPhase::Authenticated(session.clone());
        Ok(session)
    }
}

/// Three-tier fallback for registration failures: envelope error body,
/// then transport error text, then a generic message.
fn normalize_registration_error(error: &TrackerError) -> String {
    match error {
        TrackerError::Server { message: Some(message), .. } | TrackerError::Auth(message) => {
            message.clone()
        }
        TrackerError::Transport(e) => e.to_string(),
        _ => GENERIC_REGISTRATION_ERROR.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefers_envelope_message() {
        let error = TrackerError::Server { status: 409, message: Some("email taken".into()) };
        assert_eq!(normalize_registration_error(&error), "email taken");
    }

    #[test]
    fn test_normalize_falls_back_to_generic() {
        let error = TrackerError::Server { status: 500, message: None };
        assert_eq!(normalize_registration_error(&error), GENERIC_REGISTRATION_ERROR);
    }

    #[test]
    fn test_normalize_keeps_auth_detail() {
        let error = TrackerError::Auth("password too short".into());
        assert_eq!(normalize_registration_error(&error), "password too short");
    }
}
