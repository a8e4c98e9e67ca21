//
//  quayctl
//  cli/org.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Organization commands
//!
//! ```bash
//! # Create the organization, or leave it alone if it exists
//! quayctl org ensure acme
//!
//! # Keep deleted tags for two weeks
//! quayctl org ensure acme --time-machine-expiration 14d
//!
//! # Rename (requires superuser permissions)
//! quayctl org ensure acme --new-name acme-corp
//!
//! # Delete
//! quayctl org ensure acme --state absent
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::api::quay::organization::{self, OrganizationSpec, TimeMachineExpiration};
use crate::api::quay::DesiredState;

use super::GlobalOptions;

#[derive(Args, Debug)]
pub struct OrgCommand {
    #[command(subcommand)]
    pub command: OrgSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum OrgSubcommand {
    /// Create, update, rename or delete an organization
    Ensure(EnsureArgs),
}

#[derive(Args, Debug)]
pub struct EnsureArgs {
    /// Organization name
    pub name: String,

    /// Rename the organization, or create it under this name
    #[arg(long)]
    pub new_name: Option<String>,

    /// How long deleted tags stay recoverable
    #[arg(long, value_enum)]
    pub time_machine_expiration: Option<TimeMachineExpiration>,

    /// Whether the organization should exist
    #[arg(long, value_enum, default_value_t = DesiredState::Present)]
    pub state: DesiredState,
}

impl OrgCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            OrgSubcommand::Ensure(args) => ensure(args, global).await,
        }
    }
}

async fn ensure(args: &EnsureArgs, global: &GlobalOptions) -> Result<()> {
    let spec = OrganizationSpec {
        name: args.name.clone(),
        new_name: args.new_name.clone(),
        time_machine_expiration: args.time_machine_expiration,
        state: args.state,
    };

    let mut engine = global.connect().await?;
    let result = organization::ensure(&mut engine, &spec).await;
    let subject = format!("organization {}", spec.new_name.as_ref().unwrap_or(&spec.name));
    global.report(engine, &subject, result).await
}
