//
//  quayctl
//  api/quay/team.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Organization teams and their members.
//!
//! Teams are created and updated with the same
//! `PUT organization/{orgname}/team/{teamname}` call. The current team
//! settings come from the organization's `teams` map, so a team lookup costs
//! nothing once the organization is cached.

use std::collections::BTreeSet;

use clap::ValueEnum;
use serde_json::{json, Value};

use crate::api::client::{FetchOptions, Resource};
use crate::api::common::{ApiError, ChangeOutcome, DesiredFields};
use crate::api::endpoint::Endpoint;
use crate::engine::Engine;

use super::DesiredState;

/// Role a team grants its members in the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TeamRole {
    Member,
    Creator,
    Admin,
}

impl TeamRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Creator => "creator",
            Self::Admin => "admin",
        }
    }
}

/// Desired state of a team.
#[derive(Debug, Clone, Default)]
pub struct TeamSpec {
    pub organization: String,
    pub name: String,
    /// Defaults to the team's current role, or `member` for a new team.
    pub role: Option<TeamRole>,
    pub description: Option<String>,
    /// Accounts that must be members.
    pub members: Vec<String>,
    /// Keep members not listed in `members` instead of removing them.
    pub append: bool,
    pub state: DesiredState,
}

impl TeamSpec {
    fn resource(&self) -> Resource {
        Resource::new(
            "team",
            &self.name,
            Endpoint::new("organization/{orgname}/team/{teamname}")
                .bind("orgname", &self.organization)
                .bind("teamname", &self.name),
        )
        .created_by_replace()
    }

    fn member_resource(&self, member: &str) -> Resource {
        Resource::new(
            "team member",
            member,
            Endpoint::new("organization/{orgname}/team/{teamname}/members/{member}")
                .bind("orgname", &self.organization)
                .bind("teamname", &self.name)
                .bind("member", member),
        )
    }
}

/// Brings one team, and its membership, to the desired state.
///
/// # Errors
///
/// [`ApiError::Precondition`] when the organization does not exist (unless
/// the team should be absent) or when an account to add does not exist.
pub async fn ensure(engine: &mut Engine, spec: &TeamSpec) -> Result<ChangeOutcome, ApiError> {
    let Some(org) = engine.get_organization(&spec.organization).await? else {
        if spec.state == DesiredState::Absent {
            return Ok(ChangeOutcome::unchanged());
        }
        return Err(ApiError::Precondition(format!(
            "The {} organization does not exist.",
            spec.organization
        )));
    };

    let team = org
        .get("teams")
        .and_then(|teams| teams.get(&spec.name))
        .cloned();
    let resource = spec.resource();

    if spec.state == DesiredState::Absent {
        let mut outcome = ChangeOutcome::unchanged();
        if let Some(team) = &team {
            // The registry refuses to delete an admin team that is the last one.
            let demote = DesiredFields::new().with("role", TeamRole::Member.as_str());
            outcome = engine.reconcile(Some(team), &demote, &resource).await?;
        }
        let removed = engine.remove(team.as_ref(), &resource).await?;
        return Ok(outcome.merge(removed));
    }

    let role = match (spec.role, &team) {
        (Some(role), _) => role.as_str().to_string(),
        (None, Some(team)) => team
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or(TeamRole::Member.as_str())
            .to_string(),
        (None, None) => TeamRole::Member.as_str().to_string(),
    };
    let desired = DesiredFields::new()
        .with("name", spec.name.as_str())
        .with_opt("description", spec.description.clone())
        .with("role", role);

    let updated = engine.reconcile(team.as_ref(), &desired, &resource).await?;
    let members = sync_members(engine, spec).await?;
    Ok(updated.merge(members))
}

async fn sync_members(engine: &mut Engine, spec: &TeamSpec) -> Result<ChangeOutcome, ApiError> {
    let listing = Endpoint::new("organization/{orgname}/team/{teamname}/members")
        .bind("orgname", &spec.organization)
        .bind("teamname", &spec.name)
        .query("includePending", true);

    let current: BTreeSet<String> = engine
        .fetch(&listing, &FetchOptions::default())
        .await?
        .into_found()
        .and_then(|body| body.get("members").and_then(Value::as_array).cloned())
        .unwrap_or_default()
        .iter()
        .filter_map(|member| member.get("name").and_then(Value::as_str))
        .map(str::to_owned)
        .collect();
    let wanted: BTreeSet<String> = spec.members.iter().cloned().collect();

    let to_add: Vec<&String> = wanted.difference(&current).collect();
    let to_delete: Vec<&String> = if spec.append {
        Vec::new()
    } else {
        current.difference(&wanted).collect()
    };

    let mut missing = Vec::new();
    for member in &to_add {
        if engine.get_account(member).await?.is_none() {
            missing.push(member.as_str());
        }
    }
    if !missing.is_empty() {
        return Err(ApiError::Precondition(format!(
            "At least one user to add as team member does not exist: {}.",
            missing.join(", ")
        )));
    }

    for member in &to_add {
        engine.replace(&spec.member_resource(member), &json!({})).await?;
    }
    for member in &to_delete {
        engine
            .remove(Some(&Value::Bool(true)), &spec.member_resource(member))
            .await?;
    }

    Ok(ChangeOutcome {
        changed: !to_add.is_empty() || !to_delete.is_empty(),
        data: None,
    })
}
