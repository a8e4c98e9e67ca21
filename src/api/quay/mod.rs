//
//  quayctl
//  api/quay/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Resource Workflows
//!
//! Thin orchestration on top of the [`Engine`](crate::engine::Engine): each
//! workflow fetches what it needs, applies the resource's own rules and lets
//! the engine decide which calls to make.
//!
//! - [`organization`]: create, rename, delete, time machine expiration
//! - [`repository`]: repositories, visibility and permissions
//! - [`team`]: team settings and membership
//! - [`robot`]: robot accounts in organizations or the caller's namespace
//! - [`tag`]: paginated tag listing
//! - [`image`]: `namespace/repository[:tag|@digest]` references

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub mod image;
pub mod organization;
pub mod repository;
pub mod robot;
pub mod tag;
pub mod team;

/// Whether a resource should exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    #[default]
    Present,
    Absent,
}
