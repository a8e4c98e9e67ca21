//
//  quayctl
//  engine/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Reconciliation Engine
//!
//! The [`Engine`] decides whether a resource must be created, updated,
//! deleted or left alone, and performs exactly the calls needed. It owns the
//! [`QuayClient`] (and through it the session) plus the [`NamespaceCache`].
//!
//! ## Reconciliation Rules
//!
//! | Current | Desired | Action |
//! |---------|---------|--------|
//! | absent | empty | nothing |
//! | absent | non-empty | create |
//! | present | equal on every desired key | nothing |
//! | present | any desired key missing or different | replace |
//!
//! Equality is JSON value equality on top-level keys only. A `password` key
//! always counts as different, since the registry never returns it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use quayctl::api::{DesiredFields, Endpoint, FetchOptions, Resource};
//! use quayctl::config::{Config, ConnectionSettings};
//! use quayctl::engine::{Engine, EngineOptions};
//!
//! # async fn example() -> Result<(), quayctl::api::ApiError> {
//! let settings = ConnectionSettings::resolve(None, None, &Config::default())?;
//! let mut engine = Engine::connect(&settings, None, EngineOptions::default()).await?;
//!
//! let endpoint = Endpoint::new("organization/{orgname}").bind("orgname", "acme");
//! let current = engine.fetch(&endpoint, &FetchOptions::default()).await?.into_found();
//! let desired = DesiredFields::new().with("tag_expiration_s", 86400);
//! let resource = Resource::new("organization", "acme", endpoint);
//!
//! let result = engine.reconcile(current.as_ref(), &desired, &resource).await;
//! let outcome = engine.finish(result).await?;
//! println!("changed: {}", outcome.changed);
//! # Ok(())
//! # }
//! ```

mod cache;

pub use cache::NamespaceCache;

use serde_json::Value;

use crate::api::client::{CreateMethod, FetchOptions, InsertOptions, QuayClient, Resource};
use crate::api::common::{ApiError, ChangeOutcome, DesiredFields, Lookup};
use crate::api::endpoint::Endpoint;
use crate::api::transport::HttpTransport;
use crate::auth::AuthCredential;
use crate::config::ConnectionSettings;

/// Field whose value the registry never echoes back.
pub const PASSWORD_FIELD: &str = "password";

/// Engine-wide switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Report changes without sending any mutating request.
    pub check_mode: bool,
}

/// Returns `true` if any desired field is missing from `current` or differs.
///
/// A `password` field always counts as different. Comparison is shallow:
/// nested objects and arrays are compared as whole values.
pub fn needs_update(current: Option<&Value>, desired: &DesiredFields) -> bool {
    desired.iter().any(|(key, wanted)| {
        key == PASSWORD_FIELD || current.and_then(|snapshot| snapshot.get(key)) != Some(wanted)
    })
}

/// Stateful reconciliation engine bound to one registry session.
pub struct Engine {
    client: QuayClient,
    cache: NamespaceCache,
    warnings: Vec<String>,
}

impl Engine {
    pub fn new(client: QuayClient) -> Self {
        Self {
            client,
            cache: NamespaceCache::new(),
            warnings: Vec::new(),
        }
    }

    /// Builds the HTTP transport, the client and, if a credential is given,
    /// logs in.
    ///
    /// # Errors
    ///
    /// Any error from building the transport or from [`QuayClient::login`].
    pub async fn connect(
        settings: &ConnectionSettings,
        credential: Option<&AuthCredential>,
        options: EngineOptions,
    ) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(&settings.transport_options())?;
        let mut client = QuayClient::new(settings.host.clone(), Box::new(transport))
            .with_check_mode(options.check_mode);

        if let Some(credential) = credential {
            tracing::debug!(mode = credential.mode(), host = %settings.host, "logging in");
            client.login(credential).await?;
        }

        Ok(Self::new(client))
    }

    /// Direct access to the underlying client, e.g. for raw requests.
    pub fn client(&mut self) -> &mut QuayClient {
        &mut self.client
    }

    pub fn check_mode(&self) -> bool {
        self.client.check_mode()
    }

    /// Warnings collected so far, oldest first.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    /// [`needs_update`], recording a warning when a password is compared.
    pub fn needs_update(
        &mut self,
        resource: &Resource,
        current: Option<&Value>,
        desired: &DesiredFields,
    ) -> bool {
        if desired.get(PASSWORD_FIELD).is_some() {
            self.warn(format!(
                "The password of {} cannot be compared with the registry; it is always reported as changed.",
                resource.label()
            ));
        }
        needs_update(current, desired)
    }

    /// Brings `resource` to the desired state.
    ///
    /// `current` is the snapshot from a previous [`fetch`](Self::fetch).
    pub async fn reconcile(
        &mut self,
        current: Option<&Value>,
        desired: &DesiredFields,
        resource: &Resource,
    ) -> Result<ChangeOutcome, ApiError> {
        let Some(current) = current else {
            if desired.is_empty() {
                return Ok(ChangeOutcome::unchanged());
            }
            let body = desired.to_value();
            return match resource.create_method {
                CreateMethod::Insert => {
                    self.client
                        .insert(resource, &body, &InsertOptions::default())
                        .await
                }
                CreateMethod::Replace => {
                    self.client
                        .put(resource, resource.create_target(), &body)
                        .await
                }
            };
        };

        if !self.needs_update(resource, Some(current), desired) {
            tracing::debug!("{} is up to date", resource.label());
            return Ok(ChangeOutcome::unchanged());
        }

        self.client.replace(resource, &desired.to_value()).await
    }

    pub async fn fetch(
        &mut self,
        endpoint: &Endpoint,
        options: &FetchOptions,
    ) -> Result<Lookup, ApiError> {
        self.client.fetch(endpoint, options).await
    }

    pub async fn insert(
        &mut self,
        resource: &Resource,
        body: &Value,
        options: &InsertOptions,
    ) -> Result<ChangeOutcome, ApiError> {
        self.client.insert(resource, body, options).await
    }

    pub async fn replace(
        &mut self,
        resource: &Resource,
        body: &Value,
    ) -> Result<ChangeOutcome, ApiError> {
        self.client.replace(resource, body).await
    }

    pub async fn remove(
        &mut self,
        current: Option<&Value>,
        resource: &Resource,
    ) -> Result<ChangeOutcome, ApiError> {
        self.client.remove(current, resource).await
    }

    /// Username of the authenticated account.
    pub async fn who_am_i(&mut self) -> Result<Option<String>, ApiError> {
        let user = self
            .client
            .fetch(&Endpoint::new("user/"), &FetchOptions::default())
            .await?
            .into_found();
        Ok(user
            .as_ref()
            .and_then(|u| u.get("username"))
            .and_then(Value::as_str)
            .map(str::to_owned))
    }

    /// Organization snapshot, memoized for the engine's lifetime.
    ///
    /// The snapshot is tagged with `is_organization: true`. "Not found" is
    /// cached too; errors are not.
    pub async fn get_organization(&mut self, name: &str) -> Result<Option<Value>, ApiError> {
        if let Some(cached) = self.cache.get(name) {
            tracing::debug!(organization = name, "organization cache hit");
            return Ok(cached.cloned());
        }

        let endpoint = Endpoint::new("organization/{orgname}").bind("orgname", name);
        let details = self
            .client
            .fetch(&endpoint, &FetchOptions::default())
            .await?
            .into_found()
            .and_then(|mut org| {
                let map = org.as_object_mut().filter(|m| !m.is_empty())?;
                map.insert("is_organization".into(), Value::Bool(true));
                Some(org)
            });

        self.cache.insert(name, details.clone());
        Ok(details)
    }

    /// Robot or user account.
    ///
    /// `namespace+short` names a robot: first the organization robot, then,
    /// when `namespace` is the caller's own, the caller's personal robot.
    /// Any other name is looked up as a personal robot of the caller, then
    /// as a user.
    pub async fn get_account(&mut self, name: &str) -> Result<Option<Value>, ApiError> {
        if let Some((namespace, short)) = name.split_once('+') {
            let org_robot = Endpoint::new("organization/{orgname}/robots/{robot_shortname}")
                .bind("orgname", namespace)
                .bind("robot_shortname", short);
            if let Some(robot) = self.fetch_robot(&org_robot).await? {
                return Ok(Some(robot));
            }
            if self.who_am_i().await?.as_deref() != Some(namespace) {
                return Ok(None);
            }
            let own_robot = Endpoint::new("user/robots/{robot_shortname}").bind("robot_shortname", short);
            return self.fetch_robot(&own_robot).await;
        }

        let own_robot = Endpoint::new("user/robots/{robot_shortname}").bind("robot_shortname", name);
        if let Some(robot) = self.fetch_robot(&own_robot).await? {
            return Ok(Some(robot));
        }

        let endpoint = Endpoint::new("users/{username}").bind("username", name);
        let user = self
            .client
            .fetch(&endpoint, &FetchOptions::default())
            .await?
            .into_found()
            .and_then(|mut user| {
                let map = user.as_object_mut().filter(|m| !m.is_empty())?;
                let username = map.get("username").cloned().unwrap_or(Value::Null);
                map.insert("name".into(), username);
                map.insert("is_organization".into(), Value::Bool(false));
                map.insert("is_robot".into(), Value::Bool(false));
                Some(user)
            });
        Ok(user)
    }

    async fn fetch_robot(&mut self, endpoint: &Endpoint) -> Result<Option<Value>, ApiError> {
        let robot = self
            .client
            .fetch(endpoint, &FetchOptions::default().acceptable([400, 404]))
            .await?
            .into_found()
            .and_then(|mut robot| {
                let map = robot.as_object_mut().filter(|m| !m.is_empty())?;
                map.insert("is_organization".into(), Value::Bool(false));
                map.insert("is_robot".into(), Value::Bool(true));
                Some(robot)
            });
        Ok(robot)
    }

    /// Team entry from the organization's `teams` map.
    pub async fn get_team(
        &mut self,
        organization: &str,
        team: &str,
    ) -> Result<Option<Value>, ApiError> {
        let org = self.get_organization(organization).await?;
        Ok(org
            .as_ref()
            .and_then(|o| o.get("teams"))
            .and_then(|teams| teams.get(team))
            .cloned())
    }

    /// Organization, or else a user account. Robots are not namespaces.
    pub async fn get_namespace(&mut self, name: &str) -> Result<Option<Value>, ApiError> {
        if let Some(org) = self.get_organization(name).await? {
            return Ok(Some(org));
        }
        let account = self.get_account(name).await?;
        Ok(account.filter(|a| a.get("is_robot") != Some(&Value::Bool(true))))
    }

    /// Logs out, then hands back `result`.
    ///
    /// Call this with the result of the last operation so the session never
    /// outlives the interaction, whether it succeeded or failed.
    pub async fn finish<T>(mut self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        self.client.logout().await;
        result
    }
}
