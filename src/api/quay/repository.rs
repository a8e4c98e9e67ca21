//
//  quayctl
//  api/quay/repository.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Image repositories, their visibility and their permissions.
//!
//! A repository is addressed as `namespace/name` everywhere. Visibility has
//! its own `changevisibility` endpoint; the description is updated with a
//! plain `PUT`. Permissions are granted to users (including robots) or to
//! organization teams, one `PUT` per grantee.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde_json::{json, Value};

use crate::api::client::{FetchOptions, InsertOptions, Resource};
use crate::api::common::{ApiError, ChangeOutcome, DesiredFields};
use crate::api::endpoint::Endpoint;
use crate::engine::Engine;

use super::DesiredState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    fn is_public(self) -> bool {
        self == Self::Public
    }
}

/// Who a permission is granted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grantee {
    User,
    Team,
}

impl Grantee {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Team => "team",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PermissionRole {
    Read,
    Write,
    Admin,
}

impl PermissionRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }
}

/// One repository permission.
///
/// Parsed from `[user:|team:]NAME[=read|write|admin]`; the grantee defaults
/// to `user` and the role to `read`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub grantee: Grantee,
    pub name: String,
    pub role: PermissionRole,
}

impl FromStr for Permission {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ApiError::Precondition(format!(
                "Invalid permission '{value}', expected [user:|team:]NAME[=read|write|admin]"
            ))
        };

        let (grantee, rest) = match value.split_once(':') {
            Some(("user", rest)) => (Grantee::User, rest),
            Some(("team", rest)) => (Grantee::Team, rest),
            Some(_) => return Err(invalid()),
            None => (Grantee::User, value),
        };
        let (name, role) = match rest.split_once('=') {
            Some((name, "read")) => (name, PermissionRole::Read),
            Some((name, "write")) => (name, PermissionRole::Write),
            Some((name, "admin")) => (name, PermissionRole::Admin),
            Some(_) => return Err(invalid()),
            None => (rest, PermissionRole::Read),
        };
        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            grantee,
            name: name.to_string(),
            role,
        })
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}={}", self.grantee.as_str(), self.name, self.role.as_str())
    }
}

/// Desired state of a repository.
#[derive(Debug, Clone, Default)]
pub struct RepositorySpec {
    pub namespace: String,
    pub name: String,
    /// New repositories are private unless told otherwise.
    pub visibility: Option<Visibility>,
    pub description: Option<String>,
    /// `None` leaves permissions alone.
    pub permissions: Option<Vec<Permission>>,
    /// Keep permissions not listed in `permissions`.
    pub append: bool,
    pub state: DesiredState,
}

impl RepositorySpec {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    fn endpoint(&self, template: &str) -> Endpoint {
        Endpoint::new(template).bind("repository", self.full_name())
    }

    fn resource(&self) -> Resource {
        Resource::new("repository", self.full_name(), self.endpoint("repository/{repository}"))
            .with_create_endpoint(Endpoint::new("repository"))
    }

    fn permission_resource(&self, grantee: Grantee, name: &str) -> Resource {
        Resource::new(
            format!("{} repository permission", grantee.as_str()),
            name,
            self.endpoint("repository/{repository}/permissions/{grantee}/{name}")
                .bind("grantee", grantee.as_str())
                .bind("name", name),
        )
    }
}

/// Brings one repository to the desired state.
///
/// # Errors
///
/// [`ApiError::Precondition`] when the repository should exist but its
/// namespace does not.
pub async fn ensure(
    engine: &mut Engine,
    spec: &RepositorySpec,
) -> Result<ChangeOutcome, ApiError> {
    let resource = spec.resource();
    let current = engine
        .fetch(&resource.endpoint, &FetchOptions::default())
        .await?
        .into_found();

    if spec.state == DesiredState::Absent {
        return engine.remove(current.as_ref(), &resource).await;
    }

    if engine.get_namespace(&spec.namespace).await?.is_none() {
        return Err(ApiError::Precondition(format!(
            "The {} namespace does not exist.",
            spec.namespace
        )));
    }

    let mut outcome = match &current {
        None => {
            let body = json!({
                "namespace": spec.namespace,
                "repository": spec.name,
                "repo_kind": "image",
                "description": spec.description.as_deref().unwrap_or_default(),
                "visibility": spec.visibility.unwrap_or(Visibility::Private).as_str(),
            });
            engine
                .insert(&resource, &body, &InsertOptions::default())
                .await?
        }
        Some(current) => {
            let desired =
                DesiredFields::new().with_opt("description", spec.description.as_deref());
            let updated = engine.reconcile(Some(current), &desired, &resource).await?;
            let visibility = change_visibility(engine, spec, current).await?;
            updated.merge(visibility)
        }
    };

    if let Some(permissions) = &spec.permissions {
        for grantee in [Grantee::Team, Grantee::User] {
            let synced = sync_permissions(engine, spec, grantee, permissions).await?;
            outcome = outcome.merge(synced);
        }
    }
    Ok(outcome)
}

async fn change_visibility(
    engine: &mut Engine,
    spec: &RepositorySpec,
    current: &Value,
) -> Result<ChangeOutcome, ApiError> {
    let Some(visibility) = spec.visibility else {
        return Ok(ChangeOutcome::unchanged());
    };
    let Some(is_public) = current.get("is_public").and_then(Value::as_bool) else {
        return Ok(ChangeOutcome::unchanged());
    };
    if is_public == visibility.is_public() {
        return Ok(ChangeOutcome::unchanged());
    }

    let resource = spec
        .resource()
        .with_create_endpoint(spec.endpoint("repository/{repository}/changevisibility"));
    engine
        .insert(
            &resource,
            &json!({"visibility": visibility.as_str()}),
            &InsertOptions::default(),
        )
        .await
}

/// Grants missing or different roles, then revokes unlisted grants unless
/// appending.
async fn sync_permissions(
    engine: &mut Engine,
    spec: &RepositorySpec,
    grantee: Grantee,
    permissions: &[Permission],
) -> Result<ChangeOutcome, ApiError> {
    let listing = spec
        .endpoint("repository/{repository}/permissions/{grantee}/")
        .bind("grantee", grantee.as_str());
    let current: BTreeMap<String, String> = engine
        .fetch(&listing, &FetchOptions::default())
        .await?
        .into_found()
        .and_then(|body| body.get("permissions").and_then(Value::as_object).cloned())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, perm)| {
            let role = perm.get("role").and_then(Value::as_str)?.to_string();
            Some((name, role))
        })
        .collect();
    let wanted: BTreeMap<&str, PermissionRole> = permissions
        .iter()
        .filter(|p| p.grantee == grantee)
        .map(|p| (p.name.as_str(), p.role))
        .collect();

    let mut outcome = ChangeOutcome::unchanged();

    for (name, role) in &wanted {
        if current.get(*name).map(String::as_str) == Some(role.as_str()) {
            continue;
        }
        let resource = spec.permission_resource(grantee, name);
        let granted = engine
            .replace(&resource, &json!({"role": role.as_str()}))
            .await?;
        outcome.changed |= granted.changed;
    }

    if !spec.append {
        for name in current.keys().filter(|name| !wanted.contains_key(name.as_str())) {
            let resource = spec.permission_resource(grantee, name);
            let revoked = engine.remove(Some(&Value::Bool(true)), &resource).await?;
            outcome.changed |= revoked.changed;
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::QuayClient;
    use crate::api::transport::testing::ScriptedTransport;
    use reqwest::{Method, Url};

    const ORG: &str = r#"{"name": "acme"}"#;

    fn engine(transport: &ScriptedTransport) -> Engine {
        Engine::new(QuayClient::new(
            Url::parse("https://quay.example.com").unwrap(),
            Box::new(transport.clone()),
        ))
    }

    fn spec() -> RepositorySpec {
        RepositorySpec {
            namespace: "acme".into(),
            name: "app".into(),
            append: true,
            ..RepositorySpec::default()
        }
    }

    fn body(request: &crate::api::transport::TransportRequest) -> Value {
        serde_json::from_slice(request.body.as_ref().unwrap()).unwrap()
    }

    #[test]
    fn test_permission_parsing() {
        let perm: Permission = "team:ops=admin".parse().unwrap();
        assert_eq!(perm.grantee, Grantee::Team);
        assert_eq!(perm.name, "ops");
        assert_eq!(perm.role, PermissionRole::Admin);

        let perm: Permission = "acme+ci".parse().unwrap();
        assert_eq!(perm.to_string(), "user:acme+ci=read");

        assert!("group:ops".parse::<Permission>().is_err());
        assert!("alice=owner".parse::<Permission>().is_err());
        assert!("team:=read".parse::<Permission>().is_err());
    }

    #[tokio::test]
    async fn test_creates_private_repository() {
        let transport = ScriptedTransport::new();
        transport
            .respond(404, "")
            .respond(200, ORG)
            .respond(201, r#"{"namespace": "acme", "name": "app", "kind": "image"}"#);
        let mut engine = engine(&transport);

        let outcome = ensure(&mut engine, &spec()).await.unwrap();

        assert!(outcome.changed);
        let requests = transport.requests();
        assert_eq!(requests[2].method, Method::POST);
        assert_eq!(requests[2].url.path(), "/api/v1/repository");
        assert_eq!(
            body(&requests[2]),
            json!({
                "namespace": "acme",
                "repository": "app",
                "repo_kind": "image",
                "description": "",
                "visibility": "private"
            })
        );
    }

    #[tokio::test]
    async fn test_missing_namespace_fails() {
        let transport = ScriptedTransport::new();
        transport
            .respond(404, "")
            .respond(404, "")
            .respond(404, "")
            .respond(404, "");
        let mut engine = engine(&transport);

        let err = ensure(&mut engine, &spec()).await.unwrap_err();

        assert_eq!(err.to_string(), "The acme namespace does not exist.");
        assert_eq!(transport.mutating_calls(), 0);
    }

    #[tokio::test]
    async fn test_up_to_date_repository_is_unchanged() {
        let transport = ScriptedTransport::new();
        transport
            .respond(200, r#"{"name": "app", "description": "web", "is_public": false}"#)
            .respond(200, ORG);
        let mut engine = engine(&transport);

        let spec = RepositorySpec {
            description: Some("web".into()),
            visibility: Some(Visibility::Private),
            ..spec()
        };
        let outcome = ensure(&mut engine, &spec).await.unwrap();

        assert!(!outcome.changed);
        assert_eq!(transport.mutating_calls(), 0);
    }

    #[tokio::test]
    async fn test_updates_description_and_visibility() {
        let transport = ScriptedTransport::new();
        transport
            .respond(200, r#"{"name": "app", "description": "old", "is_public": false}"#)
            .respond(200, ORG)
            .respond(200, r#"{"success": true}"#)
            .respond(200, r#"{"success": true}"#);
        let mut engine = engine(&transport);

        let spec = RepositorySpec {
            description: Some("new".into()),
            visibility: Some(Visibility::Public),
            ..spec()
        };
        let outcome = ensure(&mut engine, &spec).await.unwrap();

        assert!(outcome.changed);
        let requests = transport.requests();
        assert_eq!(requests[2].method, Method::PUT);
        assert_eq!(requests[2].url.path(), "/api/v1/repository/acme/app");
        assert_eq!(body(&requests[2]), json!({"description": "new"}));
        assert_eq!(requests[3].method, Method::POST);
        assert_eq!(
            requests[3].url.path(),
            "/api/v1/repository/acme/app/changevisibility"
        );
        assert_eq!(body(&requests[3]), json!({"visibility": "public"}));
    }

    #[tokio::test]
    async fn test_delete_existing_repository() {
        let transport = ScriptedTransport::new();
        transport.respond(200, r#"{"name": "app"}"#).respond(204, "");
        let mut engine = engine(&transport);

        let spec = RepositorySpec {
            state: DesiredState::Absent,
            ..spec()
        };
        let outcome = ensure(&mut engine, &spec).await.unwrap();

        assert!(outcome.changed);
        assert_eq!(
            transport.calls(),
            vec![
                (Method::GET, "/api/v1/repository/acme/app".to_string()),
                (Method::DELETE, "/api/v1/repository/acme/app".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_missing_repository_is_unchanged() {
        let transport = ScriptedTransport::new();
        transport.respond(404, "");
        let mut engine = engine(&transport);

        let spec = RepositorySpec {
            state: DesiredState::Absent,
            ..spec()
        };
        let outcome = ensure(&mut engine, &spec).await.unwrap();

        assert!(!outcome.changed);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_permissions_grant_and_revoke() {
        let transport = ScriptedTransport::new();
        transport
            .respond(200, r#"{"name": "app", "is_public": false}"#)
            .respond(200, ORG)
            .respond(
                200,
                r#"{"permissions": {"ops": {"name": "ops", "role": "read"}}}"#,
            )
            .respond(200, r#"{"role": "write"}"#)
            .respond(
                200,
                r#"{"permissions": {
                    "alice": {"name": "alice", "role": "admin"},
                    "bob": {"name": "bob", "role": "read"}
                }}"#,
            )
            .respond(204, "");
        let mut engine = engine(&transport);

        let spec = RepositorySpec {
            permissions: Some(vec![
                "team:ops=write".parse().unwrap(),
                "alice=admin".parse().unwrap(),
            ]),
            append: false,
            ..spec()
        };
        let outcome = ensure(&mut engine, &spec).await.unwrap();

        assert!(outcome.changed);
        let requests = transport.requests();
        assert_eq!(requests[3].method, Method::PUT);
        assert_eq!(
            requests[3].url.path(),
            "/api/v1/repository/acme/app/permissions/team/ops"
        );
        assert_eq!(body(&requests[3]), json!({"role": "write"}));
        assert_eq!(
            transport.calls().last(),
            Some(&(
                Method::DELETE,
                "/api/v1/repository/acme/app/permissions/user/bob".to_string()
            ))
        );
        assert_eq!(transport.mutating_calls(), 2);
    }

    #[tokio::test]
    async fn test_append_keeps_unlisted_permissions() {
        let transport = ScriptedTransport::new();
        transport
            .respond(200, r#"{"name": "app"}"#)
            .respond(200, ORG)
            .respond(200, r#"{"permissions": {}}"#)
            .respond(
                200,
                r#"{"permissions": {"bob": {"name": "bob", "role": "read"}}}"#,
            );
        let mut engine = engine(&transport);

        let spec = RepositorySpec {
            permissions: Some(Vec::new()),
            ..spec()
        };
        let outcome = ensure(&mut engine, &spec).await.unwrap();

        assert!(!outcome.changed);
        assert_eq!(transport.mutating_calls(), 0);
    }

    #[tokio::test]
    async fn test_check_mode_creates_nothing() {
        let transport = ScriptedTransport::new();
        transport.respond(404, "").respond(200, ORG);
        let mut engine = Engine::new(
            QuayClient::new(
                Url::parse("https://quay.example.com").unwrap(),
                Box::new(transport.clone()),
            )
            .with_check_mode(true),
        );

        let spec = RepositorySpec {
            visibility: Some(Visibility::Public),
            ..spec()
        };
        let outcome = ensure(&mut engine, &spec).await.unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.data.unwrap()["visibility"], "public");
        assert_eq!(transport.mutating_calls(), 0);
    }
}
