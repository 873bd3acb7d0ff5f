//! Remote gateway client for the persistence API.
//!
//! [`Gateway`] is the async seam between the core and the remote REST API:
//! the session manager and subscription store depend only on the trait, so
//! tests substitute an in-memory implementation. [`HttpGateway`] is the
//! production implementation over a pooled [`reqwest::Client`].
//!
//! The gateway is deliberately thin: it attaches the current bearer token,
//! parses the response envelope at the boundary, and propagates every
//! transport and application error to the caller untouched. Retries and
//! offline handling are a surrounding concern, not the gateway's.
//!
//! # Response envelope
//!
//! The API wraps payloads under a nested `data` field and errors under an
//! `error` field:
//!
//! ```json
//! { "data": { "token": "...", "user": { "id": "u1", "email": "a@b.c" } } }
//! { "error": "email already registered" }
//! ```
//!
//! The create endpoint nests one level deeper, returning
//! `data.subscription`.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::error::{Result, TrackerError};
use crate::model::{NewSubscription, Subscription, SubscriptionId, SubscriptionPatch, User};

/// Successful authentication payload: the bearer token and its user.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSuccess {
    /// Opaque bearer token for subsequent calls.
    pub token: String,
    /// The authenticated user.
    pub user: User,
}

/// Typed client for the remote persistence API.
///
/// Implementations are stateless apart from the current bearer token. Every
/// authenticated call sends `Authorization: Bearer <token>` when a token is
/// installed.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Installs or clears the bearer token attached to outgoing calls.
    fn set_token(&self, token: Option<String>);

    /// `POST /auth/sign-up` — registers a new account.
    async fn sign_up(&self, email: &str, password: &str, name: Option<&str>)
        -> Result<AuthSuccess>;

    /// `POST /auth/sign-in` — authenticates existing credentials.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSuccess>;

    /// `GET /users` — fetches the user for the current token.
    async fn current_user(&self) -> Result<User>;

    /// `GET /subscriptions` — fetches the full collection.
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>>;

    /// `POST /subscriptions` — creates a record; the server assigns the id.
    async fn create_subscription(&self, record: &NewSubscription) -> Result<Subscription>;

    /// `PUT /subscriptions/:id` — applies a partial patch and returns the
    /// full updated record.
    async fn update_subscription(
        &self,
        id: &SubscriptionId,
        patch: &SubscriptionPatch,
    ) -> Result<Subscription>;

    /// `DELETE /subscriptions/:id` — deletes a record.
    async fn delete_subscription(&self, id: &SubscriptionId) -> Result<()>;
}

/// Response envelope: payload under `data`, errors under `error`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<String>,
}

/// Extra nesting on the create endpoint's envelope.
#[derive(Debug, Deserialize)]
struct CreatedSubscription {
    subscription: Subscription,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// HTTP implementation of [`Gateway`] over a pooled reqwest client.
#[derive(Debug)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl HttpGateway {
    /// Creates a gateway for the API at `base_url`.
    ///
    /// The client is built once with connection pooling (max 10 idle
    /// connections per host), a 30 second total timeout, and a 10 second
    /// connect timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] if the base URL does not parse
    /// or has no host, and [`TrackerError::Transport`] if client
    /// construction fails.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TrackerError::Validation(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.host_str().is_none() {
            return Err(TrackerError::Validation(format!("base URL missing host: {base_url}")));
        }

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, base_url, token: RwLock::new(None) })
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}{path}")
    }

    fn current_token(&self) -> Option<String> {
        self.token.read().map(|guard| guard.clone()).unwrap_or(None)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.current_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Maps a non-2xx response to the error taxonomy.
    ///
    /// 401/403 become [`TrackerError::Auth`], 404 becomes
    /// [`TrackerError::NotFound`], everything else is
    /// [`TrackerError::Server`] carrying the envelope's `error` field when
    /// the body parses.
    fn status_error(status: reqwest::StatusCode, body: &[u8]) -> TrackerError {
        let message = serde_json::from_slice::<Envelope<serde_json::Value>>(body)
            .ok()
            .and_then(|envelope| envelope.error);
        match status.as_u16() {
            401 | 403 => {
                TrackerError::Auth(message.unwrap_or_else(|| "invalid or expired token".to_owned()))
            }
            404 => TrackerError::NotFound(
                message.unwrap_or_else(|| "resource not found".to_owned()),
            ),
            code => TrackerError::Server { status: code, message },
        }
    }

    /// Sends the request and unwraps the response envelope.
    ///
    /// Non-2xx responses go through [`Self::status_error`]; a 2xx response
    /// with no `data` field is a server error.
    async fn send_enveloped<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(Self::status_error(status, &body));
        }

        let envelope: Envelope<T> = serde_json::from_slice(&body).map_err(|e| {
            TrackerError::Server {
                status: status.as_u16(),
                message: Some(format!("malformed response body: {e}")),
            }
        })?;
        envelope.data.ok_or(TrackerError::Server {
            status: status.as_u16(),
            message: envelope.error.or_else(|| Some("response envelope missing data".to_owned())),
        })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    #[instrument(skip(self, password), fields(email))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<AuthSuccess> {
        let body = SignUpRequest { email, password, name };
        let request = self.client.post(self.endpoint("/auth/sign-up")).json(&body);
        self.send_enveloped(request).await
    }

    #[instrument(skip(self, password), fields(email))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSuccess> {
        let body = SignInRequest { email, password };
        let request = self.client.post(self.endpoint("/auth/sign-in")).json(&body);
        self.send_enveloped(request).await
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<User> {
        let request = self.authorize(self.client.get(self.endpoint("/users")));
        self.send_enveloped(request).await
    }

    #[instrument(skip(self))]
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        let request = self.authorize(self.client.get(self.endpoint("/subscriptions")));
        self.send_enveloped(request).await
    }

    #[instrument(skip(self, record), fields(name = %record.name))]
    async fn create_subscription(&self, record: &NewSubscription) -> Result<Subscription> {
        let request = self.authorize(self.client.post(self.endpoint("/subscriptions")).json(record));
        let created: CreatedSubscription = self.send_enveloped(request).await?;
        Ok(created.subscription)
    }

    #[instrument(skip(self, patch), fields(id = %id))]
    async fn update_subscription(
        &self,
        id: &SubscriptionId,
        patch: &SubscriptionPatch,
    ) -> Result<Subscription> {
        let path = format!("/subscriptions/{id}");
        let request = self.authorize(self.client.put(self.endpoint(&path)).json(patch));
        self.send_enveloped(request).await
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete_subscription(&self, id: &SubscriptionId) -> Result<()> {
        let path = format!("/subscriptions/{id}");
        let request = self.authorize(self.client.delete(self.endpoint(&path)));
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(Self::status_error(status, &body));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_base_url() {
        let result = HttpGateway::new("not a url");
        assert!(matches!(result.unwrap_err(), TrackerError::Validation(_)));
    }

    #[test]
    fn test_new_rejects_url_without_host() {
        let result = HttpGateway::new("file:///tmp/api");
        assert!(matches!(result.unwrap_err(), TrackerError::Validation(_)));
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let gateway = HttpGateway::new("https://api.example.com/").unwrap();
        assert_eq!(gateway.endpoint("/subscriptions"), "https://api.example.com/subscriptions");
    }

    #[test]
    fn test_token_install_and_clear() {
        let gateway = HttpGateway::new("https://api.example.com").unwrap();
        assert!(gateway.current_token().is_none());
        gateway.set_token(Some("tok-1".to_owned()));
        assert_eq!(gateway.current_token().as_deref(), Some("tok-1"));
        gateway.set_token(None);
        assert!(gateway.current_token().is_none());
    }

    // ========================================================================
    // Status Mapping Tests
    // ========================================================================

    #[test]
    fn test_status_error_unauthorized_maps_to_auth() {
        let error = HttpGateway::status_error(
            reqwest::StatusCode::UNAUTHORIZED,
            br#"{"error":"token expired"}"#,
        );
        assert!(matches!(error, TrackerError::Auth(msg) if msg == "token expired"));
    }

    #[test]
    fn test_status_error_not_found() {
        let error = HttpGateway::status_error(reqwest::StatusCode::NOT_FOUND, b"");
        assert!(matches!(error, TrackerError::NotFound(_)));
    }

    #[test]
    fn test_status_error_server_with_envelope_message() {
        let error = HttpGateway::status_error(
            reqwest::StatusCode::CONFLICT,
            br#"{"error":"email already registered"}"#,
        );
        match error {
            TrackerError::Server { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message.as_deref(), Some("email already registered"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_status_error_server_with_unparseable_body() {
        let error =
            HttpGateway::status_error(reqwest::StatusCode::INTERNAL_SERVER_ERROR, b"<html>");
        assert!(matches!(error, TrackerError::Server { status: 500, message: None }));
    }

    // ========================================================================
    // Envelope Parsing Tests
    // ========================================================================

    #[test]
    fn test_envelope_auth_payload() {
        let json = r#"{"data":{"token":"tok-9","user":{"id":"u1","email":"a@b.c"}}}"#;
        let envelope: Envelope<AuthSuccess> = serde_json::from_str(json).unwrap();
        let auth = envelope.data.unwrap();
        assert_eq!(auth.token, "tok-9");
        assert_eq!(auth.user.email, "a@b.c");
    }

    #[test]
    fn test_envelope_error_field() {
        let json = r#"{"error":"email already registered"}"#;
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.error.as_deref(), Some("email already registered"));
    }

    #[test]
    fn test_envelope_create_double_nesting() {
        // The create endpoint wraps the record one level deeper than the
        // other subscription endpoints.
        let json = r#"{"data":{"subscription":{
            "id":"sub-1","name":"Spotify","price":9.99,"frequency":"monthly",
            "category":"Music","paymentMethod":"PayPal",
            "startDate":"2026-02-01","nextRenewal":"2026-03-01","status":"active"
        }}}"#;
        let envelope: Envelope<CreatedSubscription> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.unwrap().subscription.id.as_str(), "sub-1");
    }

    #[test]
    fn test_envelope_list_payload() {
        let json = r#"{"data":[]}"#;
        let envelope: Envelope<Vec<Subscription>> = serde_json::from_str(json).unwrap();
        assert!(envelope.data.unwrap().is_empty());
    }
}
