//
//  quayctl
//  auth/session.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Authenticated session state.
//!
//! A [`Session`] owns the headers attached to every request and tracks the
//! authentication mode. For interactive logins it also owns the CSRF token:
//!
//! 1. `GET /` and extract the token the web UI embeds in the page
//! 2. `POST /api/v1/signin` with the credentials and that token
//! 3. keep the rotated token from the `X-Next-CSRF-Token` response header
//! 4. replace it again whenever a later response carries a new one
//!
//! The session cookie itself lives in the transport's cookie store.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde_json::{json, Value};

use crate::api::common::{classify, extract_error_message, ApiError, Classified, StatusSet};
use crate::api::endpoint::api_url;
use crate::api::transport::{ApiResponse, Transport, TransportRequest};

use super::AuthCredential;

/// Request header carrying the CSRF token.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Response header carrying the next CSRF token.
pub const NEXT_CSRF_HEADER: &str = "x-next-csrf-token";

/// Matches `window.__token = '...'` in the registry home page.
static CSRF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"__token\s*=\s*["']([^"']+)["']"#).expect("valid CSRF pattern"));

/// Extracts the CSRF token embedded in the registry's HTML home page.
pub fn extract_csrf_token(page: &str) -> Option<String> {
    CSRF_PATTERN
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Authentication mode of a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    TokenAuthenticated,
    InteractiveAuthenticated { csrf_token: String },
}

/// Headers and authentication state shared by every request.
#[derive(Debug)]
pub struct Session {
    base_url: Url,
    headers: HeaderMap,
    state: SessionState,
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

impl Session {
    /// Creates an unauthenticated session for the registry at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            headers: default_headers(),
            state: SessionState::Unauthenticated,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state != SessionState::Unauthenticated
    }

    /// The CSRF token currently in use, for interactive sessions.
    pub fn csrf_token(&self) -> Option<&str> {
        match &self.state {
            SessionState::InteractiveAuthenticated { csrf_token } => Some(csrf_token),
            _ => None,
        }
    }

    /// Headers to attach to the next request.
    pub fn headers(&self) -> HeaderMap {
        self.headers.clone()
    }

    /// Picks up a rotated CSRF token from any response.
    ///
    /// Does nothing unless the session is interactive and the response
    /// carries a non-empty `X-Next-CSRF-Token` header.
    pub fn observe(&mut self, response: &ApiResponse) {
        if !matches!(self.state, SessionState::InteractiveAuthenticated { .. }) {
            return;
        }
        let Some(next) = response.header(NEXT_CSRF_HEADER).filter(|t| !t.is_empty()) else {
            return;
        };
        if self.csrf_token() == Some(next) {
            return;
        }
        if let Ok(value) = HeaderValue::from_str(next) {
            tracing::debug!("CSRF token rotated");
            self.headers.insert(CSRF_HEADER, value);
            self.state = SessionState::InteractiveAuthenticated {
                csrf_token: next.to_string(),
            };
        }
    }

    /// Authenticates the session.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Config`] if the session is already authenticated or the
    ///   token cannot be sent as a header
    /// - [`ApiError::Login`] if the interactive flow cannot obtain a CSRF
    ///   token or the registry rejects the credentials
    /// - any transport or classification error raised along the way
    pub async fn login(
        &mut self,
        transport: &dyn Transport,
        credential: &AuthCredential,
    ) -> Result<(), ApiError> {
        if self.is_authenticated() {
            return Err(ApiError::Config(
                "the session is already authenticated; log out first".to_string(),
            ));
        }

        match credential {
            AuthCredential::Token { token } => {
                let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                    ApiError::Config("the token contains characters not allowed in a header".into())
                })?;
                value.set_sensitive(true);
                self.headers.insert(AUTHORIZATION, value);
                self.state = SessionState::TokenAuthenticated;
                tracing::debug!("using bearer token authentication");
                Ok(())
            }
            AuthCredential::Interactive { username, password } => {
                self.sign_in(transport, username, password).await
            }
        }
    }

    async fn sign_in(
        &mut self,
        transport: &dyn Transport,
        username: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let mut home = self.base_url.clone();
        home.set_path("/");
        home.set_query(None);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        let response = transport
            .send(TransportRequest {
                method: Method::GET,
                url: home.clone(),
                headers,
                body: None,
            })
            .await?;

        let page = match classify(&Method::GET, &home, response, &StatusSet::empty())? {
            Classified::Success(page) => page,
            Classified::ClientError(page) => {
                return Err(ApiError::Login(format!(
                    "cannot load {home} (HTTP {})",
                    page.status.as_u16()
                )))
            }
        };

        let token = extract_csrf_token(&page.text()).ok_or_else(|| {
            ApiError::Login("cannot retrieve the CSRF token from the registry home page".into())
        })?;
        let token_value = HeaderValue::from_str(&token)
            .map_err(|_| ApiError::Login("the CSRF token is not a valid header value".into()))?;

        let signin = api_url(&self.base_url, "signin");
        let mut headers = self.headers.clone();
        headers.insert(CSRF_HEADER, token_value);
        let body = json!({"username": username, "password": password});

        let response = transport
            .send(TransportRequest {
                method: Method::POST,
                url: signin.clone(),
                headers,
                body: Some(body.to_string().into_bytes()),
            })
            .await?;

        let response = match classify(&Method::POST, &signin, response, &StatusSet::empty())? {
            Classified::Success(response) => response,
            Classified::ClientError(response) => {
                let message = extract_error_message(&response);
                return Err(ApiError::Login(if message.is_empty() {
                    format!("the registry rejected the credentials for {username}")
                } else {
                    format!("the registry rejected the credentials for {username}: {message}")
                }));
            }
        };

        if let Ok(Value::Object(map)) = response.json() {
            if map.get("success") == Some(&Value::Bool(false)) {
                return Err(ApiError::Login(format!(
                    "the registry rejected the credentials for {username}"
                )));
            }
        }

        let next = response
            .header(NEXT_CSRF_HEADER)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ApiError::Login("cannot retrieve the CSRF token from the sign-in response".into())
            })?
            .to_string();
        let next_value = HeaderValue::from_str(&next)
            .map_err(|_| ApiError::Login("the CSRF token is not a valid header value".into()))?;

        self.headers.insert(CSRF_HEADER, next_value);
        self.state = SessionState::InteractiveAuthenticated { csrf_token: next };
        tracing::debug!(username, "signed in");
        Ok(())
    }

    /// Ends the session.
    ///
    /// Interactive sessions are signed out on the server; a failure there is
    /// logged and ignored. Credentials and headers are discarded in every case.
    pub async fn logout(&mut self, transport: &dyn Transport) {
        if matches!(self.state, SessionState::InteractiveAuthenticated { .. }) {
            let request = TransportRequest {
                method: Method::POST,
                url: api_url(&self.base_url, "signout"),
                headers: self.headers(),
                body: Some(b"{}".to_vec()),
            };
            match transport.send(request).await {
                Ok(response) if response.status.is_success() => tracing::debug!("signed out"),
                Ok(response) => {
                    tracing::debug!(status = %response.status, "sign-out rejected, ignoring")
                }
                Err(e) => tracing::debug!(error = %e, "sign-out failed, ignoring"),
            }
        }
        self.headers = default_headers();
        self.state = SessionState::Unauthenticated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::{HttpTransport, TransportOptions};

    #[test]
    fn test_extract_csrf_token() {
        let page = r#"<script>window.__token = 'abc-123';</script>"#;
        assert_eq!(extract_csrf_token(page).as_deref(), Some("abc-123"));

        let page = r#"<script>window.__token="xyz"</script>"#;
        assert_eq!(extract_csrf_token(page).as_deref(), Some("xyz"));

        assert!(extract_csrf_token("<html></html>").is_none());
    }

    #[tokio::test]
    async fn test_token_login_sets_bearer_header() {
        let transport = HttpTransport::new(&TransportOptions::default()).unwrap();
        let mut session = Session::new(Url::parse("https://quay.example.com").unwrap());

        session
            .login(&transport, &AuthCredential::bearer("abc"))
            .await
            .unwrap();

        assert_eq!(session.state(), &SessionState::TokenAuthenticated);
        assert_eq!(session.headers()[AUTHORIZATION], "Bearer abc");

        let err = session
            .login(&transport, &AuthCredential::bearer("again"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[tokio::test]
    async fn test_interactive_login_rotates_token() {
        let mut server = mockito::Server::new_async().await;
        let home = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<script>window.__token = 'first';</script>")
            .create_async()
            .await;
        let signin = server
            .mock("POST", "/api/v1/signin")
            .match_header("x-csrf-token", "first")
            .match_body(mockito::Matcher::Json(
                json!({"username": "admin", "password": "secret"}),
            ))
            .with_status(200)
            .with_header("x-next-csrf-token", "second")
            .with_body(r#"{"success": true}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(&TransportOptions::default()).unwrap();
        let mut session = Session::new(Url::parse(&server.url()).unwrap());
        session
            .login(&transport, &AuthCredential::interactive("admin", "secret"))
            .await
            .unwrap();

        home.assert_async().await;
        signin.assert_async().await;
        assert_eq!(session.csrf_token(), Some("second"));
        assert_eq!(session.headers()[CSRF_HEADER], "second");

        let mut rotated = ApiResponse::new(reqwest::StatusCode::OK, Vec::new());
        rotated
            .headers
            .insert(NEXT_CSRF_HEADER, HeaderValue::from_static("third"));
        session.observe(&rotated);
        assert_eq!(session.csrf_token(), Some("third"));

        let signout = server
            .mock("POST", "/api/v1/signout")
            .match_header("x-csrf-token", "third")
            .with_status(200)
            .create_async()
            .await;
        session.logout(&transport).await;
        signout.assert_async().await;
        assert_eq!(session.state(), &SessionState::Unauthenticated);
        assert!(!session.headers().contains_key(CSRF_HEADER));
    }

    #[tokio::test]
    async fn test_missing_page_token_fails_login() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html>no token here</html>")
            .create_async()
            .await;
        let signin = server
            .mock("POST", "/api/v1/signin")
            .expect(0)
            .create_async()
            .await;

        let transport = HttpTransport::new(&TransportOptions::default()).unwrap();
        let mut session = Session::new(Url::parse(&server.url()).unwrap());
        let err = session
            .login(&transport, &AuthCredential::interactive("admin", "secret"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Login(_)));
        assert!(!session.is_authenticated());
        signin.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_credentials_fail_login() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_body("window.__token = 'first';")
            .create_async()
            .await;
        server
            .mock("POST", "/api/v1/signin")
            .with_status(400)
            .with_body(r#"{"message": "Invalid username or password"}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(&TransportOptions::default()).unwrap();
        let mut session = Session::new(Url::parse(&server.url()).unwrap());
        let err = session
            .login(&transport, &AuthCredential::interactive("admin", "wrong"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Invalid username or password"));
    }

    #[tokio::test]
    async fn test_observe_ignored_for_token_sessions() {
        let transport = HttpTransport::new(&TransportOptions::default()).unwrap();
        let mut session = Session::new(Url::parse("https://quay.example.com").unwrap());
        session
            .login(&transport, &AuthCredential::bearer("abc"))
            .await
            .unwrap();

        let mut response = ApiResponse::new(reqwest::StatusCode::OK, Vec::new());
        response
            .headers
            .insert(NEXT_CSRF_HEADER, HeaderValue::from_static("x"));
        session.observe(&response);
        assert!(session.csrf_token().is_none());

        session.logout(&transport).await;
        assert!(!session.headers().contains_key(AUTHORIZATION));
    }
}
