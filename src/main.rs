//
//  quayctl
//  main.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quayctl::api::ApiError;
use quayctl::cli::{Cli, Commands};
use quayctl::exit_codes;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e
                .downcast_ref::<ApiError>()
                .map_or(exit_codes::ERROR, ApiError::exit_code);
            std::process::exit(code);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("QUAYCTL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Org(cmd) => cmd.run(&cli.global).await,
        Commands::Repo(cmd) => cmd.run(&cli.global).await,
        Commands::Team(cmd) => cmd.run(&cli.global).await,
        Commands::Robot(cmd) => cmd.run(&cli.global).await,
        Commands::Tag(cmd) => cmd.run(&cli.global).await,
        Commands::Whoami(cmd) => cmd.run(&cli.global).await,
        Commands::Api(cmd) => cmd.run(&cli.global).await,
        Commands::Config(cmd) => cmd.run(&cli.global).await,
        Commands::Version => {
            println!("quayctl version {}", quayctl::VERSION);
            Ok(())
        }
    }
}
