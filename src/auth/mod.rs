//
//  quayctl
//  auth/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Authentication Module
//!
//! Quay accepts two ways of authenticating API calls, and this module models
//! both:
//!
//! - **Bearer token**: an OAuth access token created in the Quay UI for an
//!   application. Sent as `Authorization: Bearer <token>` on every request.
//! - **Interactive login**: a username and password exchanged for a session
//!   cookie plus a CSRF token, exactly like the web UI does. Every
//!   state-changing request must then carry the current CSRF token, which
//!   the server rotates as it goes.
//!
//! The two are mutually exclusive. Without either, requests are anonymous.
//!
//! ## Module Structure
//!
//! - [`session`]: the authenticated session state and the sign-in flow
//!
//! ## Example
//!
//! ```rust
//! use quayctl::auth::AuthCredential;
//!
//! let credential = AuthCredential::from_parts(Some("abc123".into()), None, None)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(credential.mode(), "token");
//! ```

mod session;

pub use session::*;

use std::fmt;

use crate::api::common::ApiError;

/// Credentials used to open a [`Session`].
#[derive(Clone, PartialEq, Eq)]
pub enum AuthCredential {
    /// OAuth access token, sent as a bearer token.
    Token { token: String },
    /// Username and password for the interactive sign-in flow.
    Interactive { username: String, password: String },
}

impl AuthCredential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Token {
            token: token.into(),
        }
    }

    pub fn interactive(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Interactive {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Builds a credential from independently supplied settings.
    ///
    /// Empty strings count as absent. Returns `Ok(None)` when neither a token
    /// nor a username is given.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] when both a token and a username are
    /// given, or when a username comes without a password.
    pub fn from_parts(
        token: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Option<Self>, ApiError> {
        let present = |value: Option<String>| value.filter(|v| !v.is_empty());

        match (present(token), present(username), present(password)) {
            (Some(_), Some(_), _) => Err(ApiError::Config(
                "parameters are mutually exclusive: token, username".to_string(),
            )),
            (Some(token), None, _) => Ok(Some(Self::bearer(token))),
            (None, Some(username), Some(password)) => {
                Ok(Some(Self::interactive(username, password)))
            }
            (None, Some(username), None) => Err(ApiError::Config(format!(
                "a password is required to sign in as {username}"
            ))),
            (None, None, _) => Ok(None),
        }
    }

    /// Short name of the authentication mode, for logs and output.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Token { .. } => "token",
            Self::Interactive { .. } => "interactive",
        }
    }
}

impl fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token { .. } => f.debug_struct("Token").field("token", &"***").finish(),
            Self::Interactive { username, .. } => f
                .debug_struct("Interactive")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}
