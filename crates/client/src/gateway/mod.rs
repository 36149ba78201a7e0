//! Authenticated request gateway for the ordering backend.
//!
//! Every backend call goes through [`RequestGateway::request`], which injects
//! the session credential and classifies the response the same way for all
//! endpoints:
//!
//! 1. `401 Unauthorized` tears the session down (redirecting to login) and
//!    resolves to `Ok(None)`. The caller is being navigated away, so this is
//!    a terminal outcome, not an error to report.
//! 2. Any other non-success status fails with [`ApiError::Request`] carrying
//!    the response body text.
//! 3. A success status with an empty body resolves to `Ok(None)`; otherwise
//!    the body must parse as JSON into the requested type, or the call fails
//!    with [`ApiError::Protocol`].
//!
//! Typed endpoint wrappers live in [`endpoints`].

pub mod endpoints;

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use crate::config::ClientConfig;
use crate::session::SessionStore;

/// Message used when a failed response carries no body.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

/// Errors surfaced by the gateway.
///
/// Authentication rejection is deliberately absent: it is handled inside the
/// gateway and shows up as `Ok(None)`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-success status.
    #[error("request failed ({status}): {message}")]
    Request {
        /// HTTP status returned.
        status: StatusCode,
        /// Server-provided text, or [`GENERIC_FAILURE_MESSAGE`].
        message: String,
    },

    /// The backend answered with success but the body is not valid JSON for
    /// the expected type.
    #[error("invalid response from {endpoint}: {source}")]
    Protocol {
        /// Endpoint that was called.
        endpoint: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The request never completed (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request body could not be serialized.
    #[error("could not encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    /// HTTP status for [`ApiError::Request`] failures.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Method, extra headers, and body of one gateway call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl RequestOptions {
    /// A `GET` with no body.
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    /// A request with a JSON-encoded body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encode`] if `body` cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(method: Method, body: &B) -> Result<Self, ApiError> {
        Ok(Self {
            method,
            headers: HeaderMap::new(),
            body: Some(serde_json::to_string(body).map_err(ApiError::Encode)?),
        })
    }

    /// Add or replace a header. Caller headers win over the gateway default
    /// content type; the credential is applied last.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Single choke point for backend calls.
///
/// Cheap to clone; clones share the HTTP connection pool and session.
#[derive(Clone)]
pub struct RequestGateway {
    inner: Arc<RequestGatewayInner>,
}

struct RequestGatewayInner {
    client: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl RequestGateway {
    /// Create a gateway for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(RequestGatewayInner {
                client,
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
                session,
            }),
        })
    }

    /// Base URL every endpoint is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Session consulted for credentials.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Perform a call and classify its response.
    ///
    /// Returns `Ok(None)` when the session was rejected (and has been torn
    /// down) or when a successful response has no body.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ApiError> {
        let url = format!("{}{endpoint}", self.inner.base_url);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(options.headers);
        if let Some(credential) = self.inner.session.credential() {
            match HeaderValue::from_str(&credential.bearer()) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("stored credential is not a valid header value; sending without it"),
            }
        }

        let mut builder = self
            .inner
            .client
            .request(options.method, &url)
            .headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            error!(error = %e, "request did not complete");
            ApiError::Transport(e)
        })?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("authentication rejected; tearing down session");
            if let Err(e) = self.inner.session.clear() {
                error!(error = %e, "session teardown after 401 could not clear storage");
            }
            return Ok(None);
        }

        let text = response.text().await?;

        if !status.is_success() {
            debug!(status = %status, body = %text.chars().take(200).collect::<String>(), "request rejected");
            let message = if text.trim().is_empty() {
                GENERIC_FAILURE_MESSAGE.to_string()
            } else {
                text
            };
            return Err(ApiError::Request { status, message });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text).map(Some).map_err(|source| {
            error!(
                error = %source,
                body = %text.chars().take(500).collect::<String>(),
                "backend returned an unparsable success body"
            );
            ApiError::Protocol {
                endpoint: endpoint.to_string(),
                source,
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_json_options_encode_body() {
        let options = RequestOptions::json(Method::PATCH, &serde_json::json!({"status": "LISTO"})).unwrap();
        assert_eq!(options.method, Method::PATCH);
        assert_eq!(options.body.as_deref(), Some(r#"{"status":"LISTO"}"#));
    }

    #[test]
    fn test_get_options_have_no_body() {
        let options = RequestOptions::get();
        assert_eq!(options.method, Method::GET);
        assert!(options.body.is_none());
        assert!(options.headers.is_empty());
    }

    #[test]
    fn test_header_builder_replaces() {
        let options = RequestOptions::get()
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/xml"));
        assert_eq!(options.headers.get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(options.headers.get(CONTENT_TYPE).unwrap(), "application/xml");
    }

    #[test]
    fn test_api_error_status() {
        let err = ApiError::Request {
            status: StatusCode::CONFLICT,
            message: "taken".to_string(),
        };
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(err.to_string(), "request failed (409 Conflict): taken");
    }
}
