//
//  quayctl
//  lib.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # quayctl Library
//!
//! A client-side reconciliation engine for the Quay container registry API.
//!
//! ## Overview
//!
//! Callers describe the state a registry resource should be in and the
//! [`Engine`] works out whether it must be created, updated, deleted or left
//! alone, sends exactly the calls needed and reports whether anything
//! changed. Running the same request twice changes nothing the second time.
//!
//! ## Features
//!
//! - **Idempotent reconciliation**: compare the desired fields with the live resource, then act
//! - **Two ways to authenticate**: OAuth bearer tokens or an interactive username/password session
//! - **Check mode**: report the changes without sending any mutating request
//! - **Typed errors**: every failure is an [`api::ApiError`] with the method, path and registry message
//! - **Scriptable**: JSON output and stable exit codes
//!
//! ## Module Structure
//!
//! - [`api`]: transport, status classification, endpoints, the resource accessor and workflows
//! - [`auth`]: credentials and the authenticated session
//! - [`engine`]: the reconciliation engine and its namespace cache
//! - [`config`]: configuration file and connection settings
//! - [`cli`]: command-line interface definitions using clap
//! - [`output`]: output formatting (Table, JSON)
//! - [`interactive`]: terminal prompts
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use quayctl::api::quay::organization::{self, OrganizationSpec};
//! use quayctl::auth::AuthCredential;
//! use quayctl::config::ConnectionSettings;
//! use quayctl::engine::EngineOptions;
//! use quayctl::{Config, Engine};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let settings = ConnectionSettings::resolve(Some("quay.example.com"), None, &config)?;
//! let credential = AuthCredential::bearer("token");
//! let mut engine = Engine::connect(&settings, Some(&credential), EngineOptions::default()).await?;
//!
//! let spec = OrganizationSpec {
//!     name: "acme".into(),
//!     ..OrganizationSpec::default()
//! };
//! let result = organization::ensure(&mut engine, &spec).await;
//! let outcome = engine.finish(result).await?;
//! println!("changed: {}", outcome.changed);
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions and handlers.
pub mod cli;

/// Quay API client layer.
///
/// Everything from a single HTTP exchange up to the resource workflows.
pub mod api;

/// Authentication credentials and session handling.
pub mod auth;

/// Configuration file and connection settings.
pub mod config;

/// The reconciliation engine.
pub mod engine;

/// Output formatting for different modes.
///
/// - Table format: Human-readable tables for interactive use
/// - JSON format: Structured output for scripting and automation
pub mod output;

/// Interactive terminal prompts.
pub mod interactive;

pub use cli::Cli;

pub use config::Config;

pub use engine::Engine;

/// Application name, used for the configuration directory.
pub const APP_NAME: &str = "quayctl";

/// Version from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Process exit codes.
///
/// Distinct codes let scripts tell failure categories apart without parsing
/// error messages.
///
/// | Code | Meaning |
/// |------|---------|
/// | 0 | Success |
/// | 1 | Any other error |
/// | 2 | Invalid usage or configuration |
/// | 4 | Authentication failed |
/// | 8 | Permission denied |
/// | 16 | Registry server error |
/// | 32 | Network or TLS error |
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;

    /// General error.
    ///
    /// Check stderr for details.
    pub const ERROR: i32 = 1;

    /// Invalid usage, arguments or configuration.
    pub const USAGE: i32 = 2;

    /// Authentication required or failed.
    ///
    /// The token is invalid, or the username/password was rejected.
    pub const AUTH_ERROR: i32 = 4;

    /// The account may not perform the operation (HTTP 403).
    pub const PERMISSION_DENIED: i32 = 8;

    /// The registry answered with a 5xx status.
    pub const SERVER_ERROR: i32 = 16;

    /// The registry could not be reached.
    pub const NETWORK_ERROR: i32 = 32;
}
