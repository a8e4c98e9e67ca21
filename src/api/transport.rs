//
//  quayctl
//  api/transport.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # HTTP Transport
//!
//! The lowest layer of the client: a single request/response exchange with
//! the registry. Every HTTP status, including 4xx and 5xx, comes back as an
//! ordinary [`ApiResponse`]. Only conditions that leave no response at all
//! (DNS or socket failure, TLS handshake failure, broken body) are errors.
//!
//! The exchange sits behind the [`Transport`] trait so the rest of the crate
//! never touches `reqwest` directly. [`HttpTransport`] is the production
//! implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;

use crate::api::common::ApiError;

/// Raw response of one HTTP exchange.
///
/// Produced by every [`Transport::send`] call and consumed by the error
/// classifier and the JSON accessor. Never persisted.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code returned by the registry.
    pub status: StatusCode,
    /// Undecoded response body.
    pub body: Vec<u8>,
    /// Response headers, in the order the server sent them.
    pub headers: HeaderMap,
}

impl ApiResponse {
    /// Creates a response with the given status and body and no headers.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Returns the body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON.
    ///
    /// An empty (or whitespace-only) body decodes to [`Value::Null`], which is
    /// what the registry sends for most `204 No Content` answers.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body)
    }

    /// Returns a header value as a string slice, if present and valid ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// A fully built request, ready to be sent.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Performs single HTTP exchanges with the registry.
///
/// Implementations must not retry and must not interpret status codes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns whatever the server answered.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] when no response could be obtained.
    async fn send(&self, request: TransportRequest) -> Result<ApiResponse, ApiError>;
}

/// Connection parameters for [`HttpTransport`].
///
/// # Default Values
///
/// | Field | Default |
/// |-------|---------|
/// | `validate_certs` | `true` |
/// | `timeout` | 30 seconds |
/// | `user_agent` | `quayctl/<version>` |
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Verify the server TLS certificate. Disable only for lab registries
    /// with self-signed certificates.
    pub validate_certs: bool,
    /// Whole-request timeout. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            validate_certs: true,
            timeout: Some(Duration::from_secs(30)),
            user_agent: format!("quayctl/{}", crate::VERSION),
        }
    }
}

/// [`Transport`] implementation backed by `reqwest`.
///
/// Keeps a cookie store so that the session cookie set by the interactive
/// sign-in flow is replayed on every later request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Builds the underlying HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the TLS backend cannot be initialised.
    pub fn new(options: &TransportOptions) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(options.user_agent.clone())
            .cookie_store(true)
            .danger_accept_invalid_certs(!options.validate_certs);

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| ApiError::Config(format!("cannot build the HTTP client: {e}")))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<ApiResponse, ApiError> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;

        tracing::debug!("{} {}", method, url);

        let mut builder = self.http.request(method.clone(), url.clone()).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::transport(&method, &url, e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::transport(&method, &url, e))?
            .to_vec();

        tracing::debug!("{} {} -> {}", method, url, status);

        Ok(ApiResponse {
            status,
            body,
            headers,
        })
    }
}

/// In-memory transport used by unit tests to script responses and count calls.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use reqwest::header::{HeaderName, HeaderValue};
    use reqwest::{Method, StatusCode};

    use super::{ApiResponse, Transport, TransportRequest};
    use crate::api::common::{ApiError, TransportFailure};

    #[derive(Debug, Clone, Default)]
    pub(crate) struct ScriptedTransport {
        responses: Arc<Mutex<VecDeque<ApiResponse>>>,
        requests: Arc<Mutex<Vec<TransportRequest>>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn respond(&self, status: u16, body: &str) -> &Self {
            let status = StatusCode::from_u16(status).expect("valid status");
            self.responses
                .lock()
                .unwrap()
                .push_back(ApiResponse::new(status, body.as_bytes().to_vec()));
            self
        }

        pub(crate) fn respond_with_header(
            &self,
            status: u16,
            body: &str,
            name: &'static str,
            value: &str,
        ) -> &Self {
            let status = StatusCode::from_u16(status).expect("valid status");
            let mut response = ApiResponse::new(status, body.as_bytes().to_vec());
            response.headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_str(value).expect("valid header"),
            );
            self.responses.lock().unwrap().push_back(response);
            self
        }

        pub(crate) fn requests(&self) -> Vec<TransportRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn calls(&self) -> Vec<(Method, String)> {
            self.requests()
                .into_iter()
                .map(|r| (r.method, r.url.path().to_string()))
                .collect()
        }

        pub(crate) fn mutating_calls(&self) -> usize {
            self.requests()
                .iter()
                .filter(|r| r.method != Method::GET)
                .count()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: TransportRequest) -> Result<ApiResponse, ApiError> {
            let method = request.method.clone();
            let url = request.url.to_string();
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ApiError::Transport {
                    kind: TransportFailure::Other,
                    method,
                    url,
                    source: "no scripted response left".into(),
                })
        }
    }
}
