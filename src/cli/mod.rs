//
//  quayctl
//  cli/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! CLI command definitions using clap derive macros

mod api;
mod config;
mod org;
mod repo;
mod robot;
mod tag;
mod team;
mod whoami;

pub use api::ApiCommand;
pub use config::ConfigCommand;
pub use org::OrgCommand;
pub use repo::RepoCommand;
pub use robot::RobotCommand;
pub use tag::TagCommand;
pub use team::TeamCommand;
pub use whoami::WhoamiCommand;

use anyhow::Result;
use clap::{builder::BoolishValueParser, Parser, Subcommand};

use crate::api::common::{ApiError, ChangeOutcome};
use crate::auth::AuthCredential;
use crate::config::{Config, ConnectionSettings};
use crate::engine::{Engine, EngineOptions};
use crate::interactive::{can_prompt, prompt_password};
use crate::output::{OutputFormat, OutputWriter};

/// quayctl - Reconcile Quay registry resources from the command line
#[derive(Parser, Debug)]
#[command(
    name = "quayctl",
    version,
    about = "Reconcile Quay registry resources from the command line",
    long_about = "quayctl brings organizations, teams, robot accounts and tags of a Quay \
                  container registry to a desired state.\n\n\
                  Every command is idempotent: it only sends the calls needed and reports \
                  whether anything changed.",
    propagate_version = true,
    after_help = "Use 'quayctl <command> --help' for more information about a command."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Registry URL, e.g. https://quay.example.com
    #[arg(long, global = true, env = "QUAY_HOST")]
    pub host: Option<String>,

    /// OAuth access token
    #[arg(long, global = true, env = "QUAY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Sign in with this username instead of a token
    #[arg(long, global = true, env = "QUAY_USERNAME")]
    pub username: Option<String>,

    /// Password for --username (prompted for when missing)
    #[arg(long, global = true, env = "QUAY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Verify the registry's TLS certificate
    #[arg(
        long,
        global = true,
        env = "QUAY_VERIFY_SSL",
        visible_alias = "verify-ssl",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub validate_certs: Option<bool>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub no_verify_ssl: bool,

    /// Report what would change without changing anything
    #[arg(long, global = true)]
    pub check: bool,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable interactive prompts
    #[arg(long, global = true, env = "QUAY_NO_PROMPT")]
    pub no_prompt: bool,
}

impl GlobalOptions {
    pub fn output(&self) -> OutputWriter {
        if self.json {
            OutputWriter::new(OutputFormat::Json)
        } else {
            OutputWriter::new(OutputFormat::Table)
        }
    }

    /// Connection settings: flags and environment over the config file.
    pub fn settings(&self, config: &Config) -> Result<ConnectionSettings> {
        let validate_certs = if self.no_verify_ssl {
            Some(false)
        } else {
            self.validate_certs
        };
        Ok(ConnectionSettings::resolve(
            self.host.as_deref(),
            validate_certs,
            config,
        )?)
    }

    /// The credential to sign in with, if any.
    ///
    /// Credentials given on the command line or in the environment replace
    /// those of the config file as a whole, so a configured token never
    /// clashes with `--username`.
    pub fn credential(&self, config: &Config) -> Result<Option<AuthCredential>> {
        let (token, username) = if self.token.is_some() || self.username.is_some() {
            (self.token.clone(), self.username.clone())
        } else {
            (config.token.clone(), config.username.clone())
        };

        let mut password = self.password.clone();
        if token.is_none() && password.is_none() && !self.no_prompt && can_prompt() {
            if let Some(user) = &username {
                password = Some(prompt_password(&format!("Password for {user}"))?);
            }
        }

        Ok(AuthCredential::from_parts(token, username, password)?)
    }

    /// Loads the config file, builds the engine and signs in.
    pub async fn connect(&self) -> Result<Engine> {
        let config = Config::load()?;
        let settings = self.settings(&config)?;
        let credential = self.credential(&config)?;

        let options = EngineOptions {
            check_mode: self.check,
        };
        Ok(Engine::connect(&settings, credential.as_ref(), options).await?)
    }

    /// Signs out, then prints the outcome of a reconciliation.
    pub(crate) async fn report(
        &self,
        engine: Engine,
        subject: &str,
        result: Result<ChangeOutcome, ApiError>,
    ) -> Result<()> {
        let warnings = engine.warnings().to_vec();
        let outcome = engine.finish(result).await?;
        self.output().write_outcome(subject, &outcome, &warnings)
    }
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage organizations
    #[command(visible_alias = "organization")]
    Org(OrgCommand),

    /// Manage repositories and their permissions
    #[command(visible_alias = "repository")]
    Repo(RepoCommand),

    /// Manage organization teams and their members
    Team(TeamCommand),

    /// Manage robot accounts
    Robot(RobotCommand),

    /// Inspect repository tags
    Tag(TagCommand),

    /// Show the authenticated account
    Whoami(WhoamiCommand),

    /// Make API requests
    Api(ApiCommand),

    /// Manage CLI configuration
    Config(ConfigCommand),

    /// Print version information
    Version,
}
