//
//  quayctl
//  cli/robot.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Robot account commands

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::api::quay::robot::{self, RobotSpec};
use crate::api::quay::DesiredState;

use super::GlobalOptions;

#[derive(Args, Debug)]
pub struct RobotCommand {
    #[command(subcommand)]
    pub command: RobotSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum RobotSubcommand {
    /// Create or delete a robot account
    Ensure(EnsureArgs),
}

#[derive(Args, Debug)]
pub struct EnsureArgs {
    /// Robot name as NAMESPACE+SHORTNAME
    pub name: String,

    /// Description, used on creation only
    #[arg(long)]
    pub description: Option<String>,

    /// Whether the robot account should exist
    #[arg(long, value_enum, default_value_t = DesiredState::Present)]
    pub state: DesiredState,
}

impl RobotCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            RobotSubcommand::Ensure(args) => ensure(args, global).await,
        }
    }
}

async fn ensure(args: &EnsureArgs, global: &GlobalOptions) -> Result<()> {
    let spec = RobotSpec {
        name: args.name.clone(),
        description: args.description.clone(),
        state: args.state,
    };

    let mut engine = global.connect().await?;
    let result = robot::ensure(&mut engine, &spec).await;
    global
        .report(engine, &format!("robot account {}", spec.name), result)
        .await
}
