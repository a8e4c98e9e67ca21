//
//  quayctl
//  cli/team.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Team commands
//!
//! ```bash
//! # Create a team of admins and add two members
//! quayctl team ensure acme ops --role admin -m alice -m acme+ci
//!
//! # Make alice the only member
//! quayctl team ensure acme ops -m alice --exact
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::api::quay::team::{self, TeamRole, TeamSpec};
use crate::api::quay::DesiredState;

use super::GlobalOptions;

#[derive(Args, Debug)]
pub struct TeamCommand {
    #[command(subcommand)]
    pub command: TeamSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum TeamSubcommand {
    /// Create, update or delete a team and sync its members
    Ensure(EnsureArgs),
}

#[derive(Args, Debug)]
pub struct EnsureArgs {
    /// Organization the team belongs to
    pub organization: String,

    /// Team name
    pub name: String,

    /// Role of the team in the organization
    #[arg(long, value_enum)]
    pub role: Option<TeamRole>,

    #[arg(long)]
    pub description: Option<String>,

    /// User or robot account that must be a member (repeatable)
    #[arg(long = "member", short = 'm', action = clap::ArgAction::Append)]
    pub members: Vec<String>,

    /// Remove members not listed with --member
    #[arg(long)]
    pub exact: bool,

    /// Whether the team should exist
    #[arg(long, value_enum, default_value_t = DesiredState::Present)]
    pub state: DesiredState,
}

impl TeamCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            TeamSubcommand::Ensure(args) => ensure(args, global).await,
        }
    }
}

async fn ensure(args: &EnsureArgs, global: &GlobalOptions) -> Result<()> {
    let spec = TeamSpec {
        organization: args.organization.clone(),
        name: args.name.clone(),
        role: args.role,
        description: args.description.clone(),
        members: args.members.clone(),
        append: !args.exact,
        state: args.state,
    };

    let mut engine = global.connect().await?;
    let result = team::ensure(&mut engine, &spec).await;
    let subject = format!("team {}/{}", spec.organization, spec.name);
    global.report(engine, &subject, result).await
}
