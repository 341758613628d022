//! API gateway: the single request path used by every remote call.
//!
//! [`ApiClient::request`] owns the wire contract (bearer credential, JSON
//! bodies, failure normalization, session invalidation on 401). The actual
//! bytes go through an [`HttpTransport`], so the contract can be exercised
//! without a server.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::session::SessionStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════
// Transport
// ═══════════════════════════════════════════════════════════

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl Method {
    /// Upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method
    pub method: Method,
    /// Absolute URL including any query string
    pub url: String,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// Serialized JSON body
    pub body: Option<String>,
}

impl HttpRequest {
    /// First value of a header, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What came back over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Raw body text
    pub body: String,
}

impl HttpResponse {
    /// Build a response with a JSON body.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// No response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    /// Description of the failure
    pub message: String,
}

impl TransportError {
    /// Create a transport error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Sends requests and returns raw responses.
///
/// Must only fail when no response was received; any status code is a
/// successful transport result.
pub trait HttpTransport: Send + Sync + 'static {
    /// Execute one request.
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = std::result::Result<HttpResponse, TransportError>> + Send;
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the underlying HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] if the TLS backend cannot be initialized.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::network(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

// ═══════════════════════════════════════════════════════════
// Gateway
// ═══════════════════════════════════════════════════════════

/// Whether a call needs a signed-in session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Sent with or without a credential.
    Public,
    /// Fails with [`ClientError::Unauthenticated`] before any I/O when signed out.
    Authenticated,
}

/// Uniform request layer shared by every controller.
pub struct ApiClient<T> {
    transport: Arc<T>,
    session: SessionStore,
    config: Arc<ClientConfig>,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            session: self.session.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<T> fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_base_url", &self.config.api_base_url)
            .finish_non_exhaustive()
    }
}

impl<T: HttpTransport> ApiClient<T> {
    /// Create a gateway over `transport`.
    pub fn new(transport: Arc<T>, session: SessionStore, config: Arc<ClientConfig>) -> Self {
        Self {
            transport,
            session,
            config,
        }
    }

    /// The session whose credential is attached to requests.
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    /// The transport in use.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request and return the parsed JSON body.
    ///
    /// - attaches `Authorization: Bearer <credential>` when signed in
    /// - always sends JSON content headers and an `X-Request-Id`
    /// - 2xx: the body parsed as JSON, `Value::Null` when empty
    /// - non-2xx: [`ClientError::Api`] with the body's `message` (or `error`)
    ///   or a generic description
    /// - 401 on an authenticated call: the session is invalidated first
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthenticated`], [`ClientError::Network`],
    /// [`ClientError::Api`] or [`ClientError::Schema`] as described above.
    #[tracing::instrument(
        skip(self, body),
        fields(request_id = tracing::field::Empty, status = tracing::field::Empty)
    )]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        access: Access,
    ) -> Result<Value> {
        let credential = self.session.credential();
        if access == Access::Authenticated && credential.is_none() {
            tracing::debug!("Rejected before sending: no credential");
            metrics::counter!("gateway.requests.total", "outcome" => "unauthenticated").increment(1);
            return Err(ClientError::Unauthenticated);
        }

        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
            ("X-Request-Id".to_string(), request_id),
        ];
        if let Some(credential) = &credential {
            headers.push((
                "Authorization".to_string(),
                format!("Bearer {}", credential.expose()),
            ));
        }

        let request = HttpRequest {
            method,
            url: self.config.endpoint(path),
            headers,
            body: body.map(Value::to_string),
        };

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%error, "No response received");
                metrics::counter!("gateway.requests.total", "outcome" => "network_error").increment(1);
                return Err(ClientError::network(error.message));
            },
        };
        tracing::Span::current().record("status", response.status);

        if response.is_success() {
            metrics::counter!("gateway.requests.total", "outcome" => "success").increment(1);
            return parse_success_body(&response.body);
        }

        let message = failure_message(response.status, &response.body);
        tracing::warn!(status = response.status, %message, "Request rejected by server");
        metrics::counter!("gateway.requests.total", "outcome" => "api_error").increment(1);

        if response.status == 401 && access == Access::Authenticated {
            if let Some(credential) = &credential {
                self.session.invalidate_credential(credential, &message);
            }
        }

        Err(ClientError::Api {
            status: response.status,
            message,
        })
    }

    /// [`Self::request`], then parse the body into `R`.
    ///
    /// # Errors
    ///
    /// As [`Self::request`]; a body that does not match `R` is a
    /// [`ClientError::Schema`].
    pub async fn request_typed<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        access: Access,
    ) -> Result<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let body = body.map(serde_json::to_value).transpose()?;
        let value = self.request(method, path, body.as_ref(), access).await?;
        serde_json::from_value(value).map_err(|e| ClientError::schema(format!("{method} {path}: {e}")))
    }
}

fn parse_success_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| ClientError::schema(format!("response is not JSON: {e}")))
}

/// Message for a non-2xx response: `message`, then `error`, then a generic text.
#[must_use]
pub fn failure_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"].iter().find_map(|key| {
                value
                    .get(key)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| format!("request failed with status {status}"))
}
