//
//  quayctl
//  api/common/error.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Error types and HTTP status classification.
//!
//! Every failure the client can report is an [`ApiError`] variant. The
//! [`classify`] function turns a raw [`ApiResponse`] into either a usable
//! response or one of the fatal variants, always checking the caller's
//! acceptable statuses first.

use std::error::Error as StdError;
use std::fmt;

use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;

use crate::api::transport::ApiResponse;
use crate::exit_codes;

use super::StatusSet;

/// Why a request produced no HTTP response at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// Certificate or TLS handshake problem.
    Tls,
    /// DNS resolution failure, refused or reset connection.
    Connect,
    /// The request did not finish within the configured timeout.
    Timeout,
    /// Anything else, such as a body that could not be read.
    Other,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Tls => "Could not establish a secure connection",
            Self::Connect => "Network error",
            Self::Timeout => "Request timed out",
            Self::Other => "Unknown transport error",
        };
        f.write_str(text)
    }
}

/// Unified error type for every registry operation.
///
/// # Variants
///
/// | Variant | Raised when |
/// |---------|-------------|
/// | `Transport` | No HTTP response was obtained |
/// | `Authentication` | HTTP 401 |
/// | `Permission` | HTTP 403 |
/// | `UnsupportedOperation` | HTTP 405 |
/// | `Server` | HTTP 500 and above |
/// | `ClientRequest` | A 4xx or unexpected 2xx the operation cannot use |
/// | `Decode` | A body that should be JSON is not |
/// | `UnexpectedStatus` | 1xx or 3xx |
/// | `UnboundPlaceholder` | An endpoint template has an unbound `{name}` |
/// | `Login` | The interactive sign-in flow failed |
/// | `Config` | Invalid credentials or settings |
/// | `InvalidUrl` | The registry host is not a usable URL |
/// | `Precondition` | A workflow prerequisite does not hold |
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{kind} when calling {method} {url}: {source}")]
    Transport {
        kind: TransportFailure,
        method: Method,
        url: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Invalid authentication credentials for {path} (HTTP 401).")]
    Authentication { method: Method, path: String },

    #[error("You do not have permission to {method} {path} (HTTP 403).")]
    Permission { method: Method, path: String },

    #[error("Cannot make a {method} request to this endpoint {path} (HTTP 405).")]
    UnsupportedOperation { method: Method, path: String },

    #[error(
        "The host sent back a server error: {method} {path}: {status}{}. Please check the logs and try again later.",
        detail_suffix(.message)
    )]
    Server {
        method: Method,
        path: String,
        status: StatusCode,
        message: String,
    },

    #[error("{context} (HTTP {}){}", .status.as_u16(), detail_suffix(.message))]
    ClientRequest {
        context: String,
        status: StatusCode,
        message: String,
        body: Value,
    },

    #[error("Failed to parse the JSON response from the {method} request to {path}: {source}.")]
    Decode {
        method: Method,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected HTTP status {status} from {method} {url}")]
    UnexpectedStatus {
        method: Method,
        url: String,
        status: StatusCode,
    },

    #[error("Unbound placeholder '{{{placeholder}}}' in endpoint '{template}'")]
    UnboundPlaceholder {
        template: String,
        placeholder: String,
    },

    #[error("Login failed: {0}")]
    Login(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid registry URL '{0}'")]
    InvalidUrl(String),

    #[error("{0}")]
    Precondition(String),
}

fn detail_suffix(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(": {message}")
    }
}

impl ApiError {
    /// Wraps a `reqwest` failure, deciding which [`TransportFailure`] it is.
    pub(crate) fn transport(method: &Method, url: &Url, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportFailure::Timeout
        } else if is_tls_failure(&err) {
            TransportFailure::Tls
        } else if err.is_connect() {
            TransportFailure::Connect
        } else {
            TransportFailure::Other
        };

        Self::Transport {
            kind,
            method: method.clone(),
            url: url.to_string(),
            source: Box::new(err),
        }
    }

    /// Builds a [`ApiError::ClientRequest`] from a response the caller could not use.
    ///
    /// `context` names the operation and target, e.g. `"Unable to create team ops"`.
    pub fn client_request(context: impl Into<String>, response: &ApiResponse) -> Self {
        Self::ClientRequest {
            context: context.into(),
            status: response.status,
            message: extract_error_message(response),
            body: response.json().unwrap_or_default(),
        }
    }

    /// Returns `true` for errors that must abort even a soft read.
    ///
    /// Bad credentials make every later call fail too, so reporting them as a
    /// per-resource soft failure would hide the real problem.
    pub fn always_aborts(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Login(_))
    }

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Authentication { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::Permission { .. } => Some(StatusCode::FORBIDDEN),
            Self::UnsupportedOperation { .. } => Some(StatusCode::METHOD_NOT_ALLOWED),
            Self::Server { status, .. }
            | Self::ClientRequest { status, .. }
            | Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Process exit code the CLI uses when this error ends a command.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Authentication { .. } | Self::Login(_) => exit_codes::AUTH_ERROR,
            Self::Permission { .. } => exit_codes::PERMISSION_DENIED,
            Self::Server { .. } => exit_codes::SERVER_ERROR,
            Self::Transport { .. } => exit_codes::NETWORK_ERROR,
            Self::Config(_) | Self::InvalidUrl(_) => exit_codes::USAGE,
            _ => exit_codes::ERROR,
        }
    }
}

fn is_tls_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("handshake") {
            return true;
        }
        current = e.source();
    }
    false
}

/// Outcome of [`classify`] for responses that are not fatal.
#[derive(Debug, Clone)]
pub enum Classified {
    /// 2xx, or a status the caller listed as acceptable.
    Success(ApiResponse),
    /// A 4xx other than 401, 403 and 405, handed back for the caller to judge.
    ClientError(ApiResponse),
}

impl Classified {
    /// Returns the wrapped response regardless of its classification.
    pub fn into_response(self) -> ApiResponse {
        match self {
            Self::Success(response) | Self::ClientError(response) => response,
        }
    }

    /// Borrows the wrapped response.
    pub fn response(&self) -> &ApiResponse {
        match self {
            Self::Success(response) | Self::ClientError(response) => response,
        }
    }
}

/// Maps an HTTP response to a classification or a fatal error.
///
/// Rules are applied in order, first match wins:
///
/// 1. status in `acceptable` is a success
/// 2. 500 and above is [`ApiError::Server`]
/// 3. 401 is [`ApiError::Authentication`]
/// 4. 403 is [`ApiError::Permission`]
/// 5. 405 is [`ApiError::UnsupportedOperation`]
/// 6. any other 4xx is returned as [`Classified::ClientError`]
/// 7. 2xx (including `204 No Content` on DELETE) is a success
/// 8. anything else is [`ApiError::UnexpectedStatus`]
pub fn classify(
    method: &Method,
    url: &Url,
    response: ApiResponse,
    acceptable: &StatusSet,
) -> Result<Classified, ApiError> {
    let status = response.status;

    if acceptable.contains(status) {
        return Ok(Classified::Success(response));
    }

    let path = url.path().to_string();
    let code = status.as_u16();

    if code >= 500 {
        return Err(ApiError::Server {
            method: method.clone(),
            path,
            status,
            message: extract_error_message(&response),
        });
    }

    match code {
        401 => Err(ApiError::Authentication {
            method: method.clone(),
            path,
        }),
        403 => Err(ApiError::Permission {
            method: method.clone(),
            path,
        }),
        405 => Err(ApiError::UnsupportedOperation {
            method: method.clone(),
            path,
        }),
        400..=499 => Ok(Classified::ClientError(response)),
        200..=299 => Ok(Classified::Success(response)),
        _ => Err(ApiError::UnexpectedStatus {
            method: method.clone(),
            url: url.to_string(),
            status,
        }),
    }
}

/// Extracts a human-readable message from an error response body.
///
/// Returns an empty string when the body is not a JSON object.
pub fn extract_error_message(response: &ApiResponse) -> String {
    response
        .json()
        .map(|body| json_error_message(&body))
        .unwrap_or_default()
}

/// Extracts a human-readable message from a decoded error body.
///
/// A non-empty `message` field wins. Otherwise the parts `title`,
/// `error_type` (only if it differs from `title`), `error_message` and
/// `detail` (only if it differs from `error_message`) are joined with `": "`.
pub fn json_error_message(body: &Value) -> String {
    let Value::Object(map) = body else {
        return String::new();
    };

    let field = |key: &str| -> Option<&str> {
        map.get(key)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
    };

    if let Some(message) = field("message") {
        return message.to_string();
    }

    let title = field("title");
    let error_type = field("error_type").filter(|t| Some(*t) != title);
    let error_message = field("error_message");
    let detail = field("detail").filter(|d| Some(*d) != error_message);

    [title, error_type, error_message, detail]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(": ")
}
