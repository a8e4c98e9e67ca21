//
//  quayctl
//  cli/tag.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Tag commands
//!
//! ```bash
//! # Every tag of a repository
//! quayctl tag list acme/app
//!
//! # Active tags pointing at a manifest
//! quayctl tag list acme/app@sha256:9ce9... --only-active
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::api::quay::image::ImageRef;
use crate::api::quay::tag::{self, TagQuery};

use super::GlobalOptions;

const TAG_COLUMNS: &[&str] = &["name", "manifest_digest", "size", "last_modified", "expiration"];

#[derive(Args, Debug)]
pub struct TagCommand {
    #[command(subcommand)]
    pub command: TagSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum TagSubcommand {
    /// List the tags of a repository
    #[command(visible_alias = "ls")]
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Repository as [NAMESPACE/]REPOSITORY[:TAG|@DIGEST]
    pub image: String,

    /// Only this tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Only tags pointing at this manifest digest
    #[arg(long)]
    pub digest: Option<String>,

    /// Skip expired and deleted tags
    #[arg(long)]
    pub only_active: bool,
}

impl TagCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            TagSubcommand::List(args) => list(args, global).await,
        }
    }
}

async fn list(args: &ListArgs, global: &GlobalOptions) -> Result<()> {
    let image: ImageRef = args.image.parse()?;
    let query = TagQuery {
        tag: args.tag.clone().or_else(|| image.tag.clone()),
        digest: args.digest.clone().or_else(|| image.digest.clone()),
        only_active: args.only_active,
    };

    let mut engine = global.connect().await?;
    let result = match image.resolve_namespace(&mut engine).await {
        Ok(namespace) => tag::list(&mut engine, &namespace, &image.repository, &query).await,
        Err(e) => Err(e),
    };
    let tags = engine.finish(result).await?;

    global.output().write_rows(TAG_COLUMNS, &tags)
}
