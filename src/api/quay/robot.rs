//
//  quayctl
//  api/quay/robot.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Robot accounts, named `namespace+shortname`.
//!
//! The namespace is either an organization or the caller's own user
//! account. The registry cannot change a robot's description after
//! creation, so an existing robot is always reported as unchanged.

use serde_json::{Map, Value};

use crate::api::client::{FetchOptions, Resource};
use crate::api::common::{ApiError, ChangeOutcome};
use crate::api::endpoint::Endpoint;
use crate::engine::Engine;

use super::DesiredState;

/// Desired state of a robot account.
#[derive(Debug, Clone, Default)]
pub struct RobotSpec {
    /// Full name, `namespace+shortname`.
    pub name: String,
    pub description: Option<String>,
    pub state: DesiredState,
}

/// Brings one robot account to the desired state.
///
/// # Errors
///
/// [`ApiError::Precondition`] when the name has no `+`, when the namespace
/// does not exist, or when it is another user's namespace.
pub async fn ensure(engine: &mut Engine, spec: &RobotSpec) -> Result<ChangeOutcome, ApiError> {
    let Some((namespace, short)) = spec.name.split_once('+') else {
        return Err(ApiError::Precondition(format!(
            "{}: wrong format for the robot account name: `name' must be `namespace+robotshortname'.",
            spec.name
        )));
    };

    let endpoint = robot_endpoint(engine, namespace, short).await?;
    let resource = Resource::new("robot account", &spec.name, endpoint.clone());

    let current = engine
        .fetch(&endpoint, &FetchOptions::default().acceptable([400, 404]))
        .await?
        .into_found();

    if spec.state == DesiredState::Absent {
        return engine.remove(current.as_ref(), &resource).await;
    }
    if current.is_some() {
        tracing::debug!("{} already exists", resource.label());
        return Ok(ChangeOutcome::unchanged());
    }

    let mut body = Map::new();
    if let Some(description) = &spec.description {
        body.insert("description".into(), Value::String(description.clone()));
    }
    engine.replace(&resource, &Value::Object(body)).await
}

async fn robot_endpoint(
    engine: &mut Engine,
    namespace: &str,
    short: &str,
) -> Result<Endpoint, ApiError> {
    if engine.get_organization(namespace).await?.is_some() {
        return Ok(Endpoint::new("organization/{orgname}/robots/{robot_shortname}")
            .bind("orgname", namespace)
            .bind("robot_shortname", short));
    }

    let user = Endpoint::new("users/{username}").bind("username", namespace);
    if !engine.fetch(&user, &FetchOptions::default()).await?.is_found() {
        return Err(ApiError::Precondition(format!(
            "The {namespace} namespace does not exist."
        )));
    }

    let me = engine.who_am_i().await?.unwrap_or_default();
    if me != namespace {
        return Err(ApiError::Precondition(format!(
            "You, {me}, are not the owner of the {namespace} namespace."
        )));
    }
    Ok(Endpoint::new("user/robots/{robot_shortname}").bind("robot_shortname", short))
}
