//
//  quayctl
//  api/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # API Client Layer
//!
//! This module provides the HTTP client for the Quay registry REST API
//! (`/api/v1/`).
//!
//! ## Architecture
//!
//! The API layer is organized bottom-up:
//!
//! - [`transport`]: one HTTP exchange, behind the [`Transport`] trait
//! - [`common`]: errors, status classification, lookup and change types, pagination
//! - [`endpoint`]: path templates with `{name}` placeholders
//! - [`client`]: the JSON resource accessor ([`QuayClient`])
//! - [`quay`]: resource workflows (organizations, teams, robots, tags, images)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use quayctl::api::{Endpoint, FetchOptions, HttpTransport, QuayClient, TransportOptions};
//! use quayctl::auth::AuthCredential;
//! use quayctl::config::parse_host;
//!
//! # async fn example() -> Result<(), quayctl::api::ApiError> {
//! let transport = HttpTransport::new(&TransportOptions::default())?;
//! let mut client = QuayClient::new(parse_host("quay.example.com")?, Box::new(transport));
//! client.login(&AuthCredential::bearer("token")).await?;
//!
//! let org = client
//!     .fetch(
//!         &Endpoint::new("organization/{orgname}").bind("orgname", "acme"),
//!         &FetchOptions::default(),
//!     )
//!     .await?;
//! println!("found: {}", org.is_found());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Failures are [`ApiError`] variants. The classifier maps statuses as follows:
//!
//! - `Authentication`: 401 Unauthorized
//! - `Permission`: 403 Forbidden
//! - `UnsupportedOperation`: 405 Method Not Allowed
//! - `Server`: 5xx Server Errors
//! - other 4xx are handed back to the operation, which decides

pub mod client;
pub mod common;
pub mod endpoint;
pub mod quay;
pub mod transport;

pub use client::{CreateMethod, ErrorMode, FetchOptions, InsertOptions, QuayClient, Resource};
pub use common::{ApiError, ChangeOutcome, DesiredFields, Lookup, StatusSet};
pub use endpoint::Endpoint;
pub use transport::{ApiResponse, HttpTransport, Transport, TransportOptions};
