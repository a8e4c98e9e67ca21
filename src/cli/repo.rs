//
//  quayctl
//  cli/repo.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Repository commands
//!
//! ```bash
//! # Create a private repository, or leave it alone if it exists
//! quayctl repo ensure acme/app
//!
//! # Make it public and give the ops team write access
//! quayctl repo ensure acme/app --visibility public -p team:ops=write
//!
//! # alice gets admin and every other grant is revoked
//! quayctl repo ensure acme/app -p alice=admin --exact-permissions
//!
//! # Delete
//! quayctl repo ensure acme/app --state absent
//! ```

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use crate::api::quay::repository::{self, Permission, RepositorySpec, Visibility};
use crate::api::quay::DesiredState;

use super::GlobalOptions;

#[derive(Args, Debug)]
pub struct RepoCommand {
    #[command(subcommand)]
    pub command: RepoSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum RepoSubcommand {
    /// Create, update or delete a repository and sync its permissions
    Ensure(EnsureArgs),
}

#[derive(Args, Debug)]
pub struct EnsureArgs {
    /// Repository as NAMESPACE/NAME
    pub repository: String,

    /// Visibility; new repositories are private by default
    #[arg(long, value_enum)]
    pub visibility: Option<Visibility>,

    #[arg(long)]
    pub description: Option<String>,

    /// Grant as [user:|team:]NAME[=read|write|admin] (repeatable)
    #[arg(
        long = "permission",
        short = 'p',
        value_parser = parse_permission,
        action = clap::ArgAction::Append
    )]
    pub permissions: Vec<Permission>,

    /// Revoke grants not listed with --permission
    #[arg(long)]
    pub exact_permissions: bool,

    /// Whether the repository should exist
    #[arg(long, value_enum, default_value_t = DesiredState::Present)]
    pub state: DesiredState,
}

fn parse_permission(value: &str) -> Result<Permission, String> {
    value.parse().map_err(|e: crate::api::ApiError| e.to_string())
}

impl RepoCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            RepoSubcommand::Ensure(args) => ensure(args, global).await,
        }
    }
}

impl EnsureArgs {
    fn spec(&self) -> Result<RepositorySpec> {
        let Some((namespace, name)) = self.repository.split_once('/') else {
            bail!("Repository must be NAMESPACE/NAME, got '{}'", self.repository);
        };
        if namespace.is_empty() || name.is_empty() || name.contains('/') {
            bail!("Repository must be NAMESPACE/NAME, got '{}'", self.repository);
        }

        let permissions = (self.exact_permissions || !self.permissions.is_empty())
            .then(|| self.permissions.clone());

        Ok(RepositorySpec {
            namespace: namespace.to_string(),
            name: name.to_string(),
            visibility: self.visibility,
            description: self.description.clone(),
            permissions,
            append: !self.exact_permissions,
            state: self.state,
        })
    }
}

async fn ensure(args: &EnsureArgs, global: &GlobalOptions) -> Result<()> {
    let spec = args.spec()?;

    let mut engine = global.connect().await?;
    let result = repository::ensure(&mut engine, &spec).await;
    let subject = format!("repository {}", spec.full_name());
    global.report(engine, &subject, result).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(repository: &str) -> EnsureArgs {
        EnsureArgs {
            repository: repository.into(),
            visibility: None,
            description: None,
            permissions: Vec::new(),
            exact_permissions: false,
            state: DesiredState::Present,
        }
    }

    #[test]
    fn test_spec_from_args() {
        let spec = args("acme/app").spec().unwrap();
        assert_eq!(spec.namespace, "acme");
        assert_eq!(spec.name, "app");
        assert!(spec.permissions.is_none());
        assert!(spec.append);
    }

    #[test]
    fn test_exact_permissions_without_grants_revokes_all() {
        let spec = EnsureArgs {
            exact_permissions: true,
            ..args("acme/app")
        }
        .spec()
        .unwrap();
        assert_eq!(spec.permissions, Some(Vec::new()));
        assert!(!spec.append);
    }

    #[test]
    fn test_rejects_bad_repository_names() {
        for name in ["app", "/app", "acme/", "acme/app/extra"] {
            assert!(args(name).spec().is_err(), "{name} should be rejected");
        }
    }

    #[test]
    fn test_parse_permission_error_is_readable() {
        let err = parse_permission("alice=owner").unwrap_err();
        assert!(err.contains("alice=owner"));
    }
}
