//
//  quayctl
//  api/quay/organization.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Organizations.
//!
//! Creation goes through `POST organization/`, settings through
//! `PUT organization/{orgname}` and renaming through the superuser endpoint
//! `PUT superuser/organizations/{orgname}`.

use clap::ValueEnum;
use serde_json::{json, Map, Value};

use crate::api::client::{FetchOptions, InsertOptions, Resource};
use crate::api::common::{ApiError, ChangeOutcome, DesiredFields};
use crate::api::endpoint::Endpoint;
use crate::engine::Engine;

use super::DesiredState;

/// How long deleted tags stay recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimeMachineExpiration {
    #[value(name = "0s")]
    Disabled,
    #[value(name = "1d")]
    OneDay,
    #[value(name = "7d")]
    OneWeek,
    #[value(name = "14d")]
    TwoWeeks,
    #[value(name = "1month")]
    OneMonth,
}

impl TimeMachineExpiration {
    /// Value of the organization's `tag_expiration_s` field.
    pub fn seconds(self) -> u64 {
        match self {
            Self::Disabled => 0,
            Self::OneDay => 86_400,
            Self::OneWeek => 604_800,
            Self::TwoWeeks => 1_209_600,
            Self::OneMonth => 2_419_200,
        }
    }
}

/// Desired state of an organization.
#[derive(Debug, Clone, Default)]
pub struct OrganizationSpec {
    pub name: String,
    /// Rename `name` to this, or create it under this name.
    pub new_name: Option<String>,
    pub time_machine_expiration: Option<TimeMachineExpiration>,
    pub state: DesiredState,
}

fn endpoint(name: &str) -> Endpoint {
    Endpoint::new("organization/{orgname}").bind("orgname", name)
}

fn resource(name: &str) -> Resource {
    Resource::new("organization", name, endpoint(name))
        .with_create_endpoint(Endpoint::new("organization/"))
}

/// Brings one organization to the desired state.
///
/// # Errors
///
/// [`ApiError::Precondition`] when both `name` and `new_name` exist, plus
/// anything the underlying calls return.
pub async fn ensure(
    engine: &mut Engine,
    spec: &OrganizationSpec,
) -> Result<ChangeOutcome, ApiError> {
    let options = FetchOptions::default();
    let current = engine.fetch(&endpoint(&spec.name), &options).await?.into_found();
    let renamed = match &spec.new_name {
        Some(new_name) => engine.fetch(&endpoint(new_name), &options).await?.into_found(),
        None => None,
    };

    if let (Some(_), Some(_), Some(new_name)) = (&current, &renamed, &spec.new_name) {
        return Err(ApiError::Precondition(format!(
            "The {new_name} organization (new name) already exists."
        )));
    }

    if spec.state == DesiredState::Absent {
        return match (&spec.new_name, renamed) {
            (Some(new_name), Some(found)) => engine.remove(Some(&found), &resource(new_name)).await,
            _ => engine.remove(current.as_ref(), &resource(&spec.name)).await,
        };
    }

    let mut outcome = ChangeOutcome::unchanged();
    let name = spec.new_name.as_deref().unwrap_or(&spec.name);

    let current = match (current, renamed, &spec.new_name) {
        (Some(found), _, Some(new_name)) => {
            let rename = Resource::new(
                "organization",
                new_name,
                Endpoint::new("superuser/organizations/{orgname}").bind("orgname", &spec.name),
            );
            let desired = DesiredFields::new().with("name", new_name.as_str());
            outcome = engine.reconcile(Some(&found), &desired, &rename).await?;
            found
        }
        (Some(found), _, None) | (None, Some(found), _) => found,
        (None, None, _) => {
            outcome = engine
                .insert(&resource(name), &json!({ "name": name }), &InsertOptions::default())
                .await?;
            Value::Object(Map::new())
        }
    };

    let desired = DesiredFields::new().with_opt(
        "tag_expiration_s",
        spec.time_machine_expiration.map(TimeMachineExpiration::seconds),
    );
    let updated = engine.reconcile(Some(&current), &desired, &resource(name)).await?;

    Ok(outcome.merge(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::QuayClient;
    use crate::api::transport::testing::ScriptedTransport;
    use reqwest::{Method, Url};

    fn engine(transport: &ScriptedTransport) -> Engine {
        Engine::new(QuayClient::new(
            Url::parse("https://quay.example.com").unwrap(),
            Box::new(transport.clone()),
        ))
    }

    fn spec(name: &str) -> OrganizationSpec {
        OrganizationSpec {
            name: name.to_string(),
            ..OrganizationSpec::default()
        }
    }

    #[test]
    fn test_expiration_values() {
        assert_eq!(TimeMachineExpiration::Disabled.seconds(), 0);
        assert_eq!(TimeMachineExpiration::TwoWeeks.seconds(), 1_209_600);
        assert_eq!(TimeMachineExpiration::OneMonth.seconds(), 2_419_200);
    }

    #[tokio::test]
    async fn test_creates_missing_organization() {
        let transport = ScriptedTransport::new();
        transport.respond(404, "").respond(201, r#""Created""#);
        let mut engine = engine(&transport);

        let outcome = ensure(&mut engine, &spec("acme")).await.unwrap();

        assert!(outcome.changed);
        assert_eq!(
            transport.calls(),
            vec![
                (Method::GET, "/api/v1/organization/acme".to_string()),
                (Method::POST, "/api/v1/organization/".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_new_organization_gets_expiration_by_put() {
        let transport = ScriptedTransport::new();
        transport
            .respond(404, "")
            .respond(201, r#""Created""#)
            .respond(200, r#"{"name": "acme", "tag_expiration_s": 86400}"#);
        let mut engine = engine(&transport);

        let spec = OrganizationSpec {
            time_machine_expiration: Some(TimeMachineExpiration::OneDay),
            ..spec("acme")
        };
        let outcome = ensure(&mut engine, &spec).await.unwrap();

        assert!(outcome.changed);
        let calls = transport.calls();
        assert_eq!(calls[2], (Method::PUT, "/api/v1/organization/acme".to_string()));
    }

    #[tokio::test]
    async fn test_existing_organization_is_left_alone() {
        let transport = ScriptedTransport::new();
        transport.respond(200, r#"{"name": "acme", "tag_expiration_s": 1209600}"#);
        let mut engine = engine(&transport);

        let spec = OrganizationSpec {
            time_machine_expiration: Some(TimeMachineExpiration::TwoWeeks),
            ..spec("acme")
        };
        let outcome = ensure(&mut engine, &spec).await.unwrap();

        assert!(!outcome.changed);
        assert_eq!(transport.mutating_calls(), 0);
    }

    #[tokio::test]
    async fn test_rename_uses_superuser_endpoint() {
        let transport = ScriptedTransport::new();
        transport
            .respond(200, r#"{"name": "old"}"#)
            .respond(404, "")
            .respond(200, r#"{"name": "new"}"#);
        let mut engine = engine(&transport);

        let spec = OrganizationSpec {
            new_name: Some("new".into()),
            ..spec("old")
        };
        let outcome = ensure(&mut engine, &spec).await.unwrap();

        assert!(outcome.changed);
        assert_eq!(
            transport.calls()[2],
            (Method::PUT, "/api/v1/superuser/organizations/old".to_string())
        );
    }

    #[tokio::test]
    async fn test_rename_conflict_fails() {
        let transport = ScriptedTransport::new();
        transport
            .respond(200, r#"{"name": "old"}"#)
            .respond(200, r#"{"name": "new"}"#);
        let mut engine = engine(&transport);

        let spec = OrganizationSpec {
            new_name: Some("new".into()),
            ..spec("old")
        };
        let err = ensure(&mut engine, &spec).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(transport.mutating_calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_absent_is_unchanged() {
        let transport = ScriptedTransport::new();
        transport.respond(404, "");
        let mut engine = engine(&transport);

        let spec = OrganizationSpec {
            state: DesiredState::Absent,
            ..spec("ghost")
        };
        let outcome = ensure(&mut engine, &spec).await.unwrap();

        assert!(!outcome.changed);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_existing() {
        let transport = ScriptedTransport::new();
        transport.respond(200, r#"{"name": "acme"}"#).respond(204, "");
        let mut engine = engine(&transport);

        let spec = OrganizationSpec {
            state: DesiredState::Absent,
            ..spec("acme")
        };
        assert!(ensure(&mut engine, &spec).await.unwrap().changed);
        assert_eq!(
            transport.calls()[1],
            (Method::DELETE, "/api/v1/organization/acme".to_string())
        );
    }
}
