//
//  quayctl
//  api/client.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Quay API Client
//!
//! [`QuayClient`] is the JSON resource accessor: it turns endpoint templates
//! into URLs under `/api/v1/`, attaches the session headers, classifies the
//! answer and exposes four resource-level operations.
//!
//! | Operation | Method | Success statuses |
//! |-----------|--------|------------------|
//! | [`fetch`](QuayClient::fetch) | GET | 200 (acceptable statuses mean "absent") |
//! | [`insert`](QuayClient::insert) | POST | 200, 201, 204 by default |
//! | [`replace`](QuayClient::replace) | PUT | 200, 201 |
//! | [`remove`](QuayClient::remove) | DELETE | 200, 201, 202, 204 (400 and 404 mean already gone) |
//!
//! In check mode the three mutating operations never reach the network and
//! report what they would have done.

use reqwest::{Method, StatusCode, Url};
use serde_json::{Map, Value};

use crate::auth::{AuthCredential, Session};

use super::common::{
    classify, normalize_keys, ApiError, ChangeOutcome, Classified, Lookup, StatusSet,
};
use super::endpoint::{api_url, Endpoint};
use super::transport::{ApiResponse, Transport, TransportRequest};

/// What a failed read turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Return the error to the caller.
    #[default]
    Abort,
    /// Return [`Lookup::Failed`] instead. Authentication and login errors
    /// still abort.
    Soft,
}

/// Options for [`QuayClient::fetch`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Statuses meaning "the resource does not exist". Defaults to `{404}`.
    pub acceptable: StatusSet,
    pub on_error: ErrorMode,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            acceptable: StatusSet::from([404]),
            on_error: ErrorMode::Abort,
        }
    }
}

impl FetchOptions {
    /// Default options in soft error mode.
    pub fn soft() -> Self {
        Self {
            on_error: ErrorMode::Soft,
            ..Self::default()
        }
    }

    /// Replaces the set of "absent" statuses.
    pub fn acceptable(mut self, codes: impl Into<StatusSet>) -> Self {
        self.acceptable = codes.into();
        self
    }
}

/// Options for [`QuayClient::insert`].
#[derive(Debug, Clone)]
pub struct InsertOptions {
    /// Statuses that count as a successful creation.
    pub acceptable: StatusSet,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            acceptable: StatusSet::from([200, 201, 204]),
        }
    }
}

/// How a missing resource gets created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateMethod {
    /// `POST` to the creation endpoint.
    #[default]
    Insert,
    /// `PUT` to the creation endpoint. Teams are created this way.
    Replace,
}

/// A remote resource as the mutating operations see it.
///
/// `kind` and `name` only feed log lines and error messages.
#[derive(Debug, Clone)]
pub struct Resource {
    pub kind: String,
    pub name: String,
    /// Where the resource lives; used for updates and deletion.
    pub endpoint: Endpoint,
    /// Where it is created, when that differs from `endpoint`.
    pub create_endpoint: Option<Endpoint>,
    pub create_method: CreateMethod,
}

impl Resource {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            endpoint,
            create_endpoint: None,
            create_method: CreateMethod::Insert,
        }
    }

    pub fn with_create_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.create_endpoint = Some(endpoint);
        self
    }

    pub fn created_by_replace(mut self) -> Self {
        self.create_method = CreateMethod::Replace;
        self
    }

    /// The endpoint creation requests go to.
    pub fn create_target(&self) -> &Endpoint {
        self.create_endpoint.as_ref().unwrap_or(&self.endpoint)
    }

    /// `"<kind> <name>"`, as used in messages.
    pub fn label(&self) -> String {
        format!("{} {}", self.kind, self.name)
    }
}

/// Client for the Quay REST API.
///
/// Owns the [`Session`] and the [`Transport`]. Operations take `&mut self`
/// because any response may rotate the session's CSRF token.
pub struct QuayClient {
    transport: Box<dyn Transport>,
    session: Session,
    check_mode: bool,
}

impl QuayClient {
    /// Creates an unauthenticated client for the registry at `base_url`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use quayctl::api::{HttpTransport, QuayClient, TransportOptions};
    /// use quayctl::config::parse_host;
    ///
    /// # fn example() -> Result<(), quayctl::api::ApiError> {
    /// let transport = HttpTransport::new(&TransportOptions::default())?;
    /// let client = QuayClient::new(parse_host("quay.example.com")?, Box::new(transport));
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(base_url: Url, transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            session: Session::new(base_url),
            check_mode: false,
        }
    }

    /// Enables or disables check mode.
    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    pub fn check_mode(&self) -> bool {
        self.check_mode
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Authenticates the underlying session.
    pub async fn login(&mut self, credential: &AuthCredential) -> Result<(), ApiError> {
        self.session.login(self.transport.as_ref(), credential).await
    }

    /// Signs out (interactive sessions) and discards credentials.
    pub async fn logout(&mut self) {
        self.session.logout(self.transport.as_ref()).await;
    }

    /// Resolves `endpoint` into a full URL on the registry.
    pub fn build_url(&self, endpoint: &Endpoint) -> Result<Url, ApiError> {
        let mut url = api_url(self.session.base_url(), &endpoint.resolve()?);
        if !endpoint.query_pairs().is_empty() {
            url.query_pairs_mut().extend_pairs(endpoint.query_pairs());
        }
        Ok(url)
    }

    /// Sends one request and classifies the answer.
    ///
    /// POST and PUT always carry a JSON body (`{}` when `body` is `None`);
    /// GET and DELETE never do. This is the escape hatch behind the `api`
    /// command; the resource operations below are built on it.
    pub async fn request(
        &mut self,
        method: Method,
        endpoint: &Endpoint,
        body: Option<&Value>,
        acceptable: &StatusSet,
    ) -> Result<(Url, Classified), ApiError> {
        let url = self.build_url(endpoint)?;
        let body = if method == Method::POST || method == Method::PUT {
            let payload = body.cloned().unwrap_or_else(|| Value::Object(Map::new()));
            Some(payload.to_string().into_bytes())
        } else {
            None
        };

        let request = TransportRequest {
            method: method.clone(),
            url: url.clone(),
            headers: self.session.headers(),
            body,
        };
        let response = self.transport.send(request).await?;
        self.session.observe(&response);

        let classified = classify(&method, &url, response, acceptable)?;
        Ok((url, classified))
    }

    /// Reads one resource.
    ///
    /// Returns [`Lookup::Absent`] when the status is in `options.acceptable`,
    /// and the decoded, key-normalized body on `200`. Any other status is an
    /// error, or [`Lookup::Failed`] in soft mode.
    pub async fn fetch(
        &mut self,
        endpoint: &Endpoint,
        options: &FetchOptions,
    ) -> Result<Lookup, ApiError> {
        match self.fetch_strict(endpoint, &options.acceptable).await {
            Err(e) if options.on_error == ErrorMode::Soft && !e.always_aborts() => {
                tracing::debug!(error = %e, "read failed, reporting a soft failure");
                Ok(Lookup::Failed(e))
            }
            other => other,
        }
    }

    async fn fetch_strict(
        &mut self,
        endpoint: &Endpoint,
        acceptable: &StatusSet,
    ) -> Result<Lookup, ApiError> {
        let (url, classified) = self.request(Method::GET, endpoint, None, acceptable).await?;
        let response = classified.into_response();

        if acceptable.contains(response.status) {
            return Ok(Lookup::Absent);
        }
        if response.status != StatusCode::OK {
            return Err(ApiError::client_request(
                format!("Unable to get {}", url.path()),
                &response,
            ));
        }

        let mut snapshot = decode(&Method::GET, &url, &response)?;
        normalize_keys(&mut snapshot);
        Ok(Lookup::Found(snapshot))
    }

    /// Creates a resource with `POST` to its creation endpoint.
    pub async fn insert(
        &mut self,
        resource: &Resource,
        body: &Value,
        options: &InsertOptions,
    ) -> Result<ChangeOutcome, ApiError> {
        if self.check_mode {
            tracing::info!("check mode: would create {}", resource.label());
            return Ok(ChangeOutcome::changed(Some(body.clone())));
        }

        let (url, classified) = self
            .request(Method::POST, resource.create_target(), Some(body), &options.acceptable)
            .await?;
        let response = classified.into_response();

        if !options.acceptable.contains(response.status) {
            return Err(ApiError::client_request(
                format!("Unable to create {}", resource.label()),
                &response,
            ));
        }

        tracing::info!("created {}", resource.label());
        Ok(ChangeOutcome::changed(Some(decode(&Method::POST, &url, &response)?)))
    }

    /// Unconditionally overwrites a resource with `PUT`.
    pub async fn replace(
        &mut self,
        resource: &Resource,
        body: &Value,
    ) -> Result<ChangeOutcome, ApiError> {
        self.put(resource, &resource.endpoint, body).await
    }

    /// `PUT` to an arbitrary endpoint on behalf of `resource`.
    pub(crate) async fn put(
        &mut self,
        resource: &Resource,
        endpoint: &Endpoint,
        body: &Value,
    ) -> Result<ChangeOutcome, ApiError> {
        if self.check_mode {
            tracing::info!("check mode: would update {}", resource.label());
            return Ok(ChangeOutcome::changed(Some(body.clone())));
        }

        let (url, classified) = self
            .request(Method::PUT, endpoint, Some(body), &StatusSet::empty())
            .await?;
        let response = classified.into_response();

        if !matches!(response.status.as_u16(), 200 | 201) {
            return Err(ApiError::client_request(
                format!("Unable to update {}", resource.label()),
                &response,
            ));
        }

        tracing::info!("updated {}", resource.label());
        Ok(ChangeOutcome::changed(Some(decode(&Method::PUT, &url, &response)?)))
    }

    /// Deletes a resource known to exist.
    ///
    /// `current` is the snapshot from an earlier [`fetch`](Self::fetch); when
    /// it is `None` nothing is sent and the outcome is unchanged. A `400` or
    /// `404` answer means someone else already removed it.
    pub async fn remove(
        &mut self,
        current: Option<&Value>,
        resource: &Resource,
    ) -> Result<ChangeOutcome, ApiError> {
        if current.is_none() {
            tracing::debug!("{} does not exist, nothing to delete", resource.label());
            return Ok(ChangeOutcome::unchanged());
        }
        if self.check_mode {
            tracing::info!("check mode: would delete {}", resource.label());
            return Ok(ChangeOutcome::changed(None));
        }

        let (_, classified) = self
            .request(
                Method::DELETE,
                &resource.endpoint,
                None,
                &StatusSet::from([404]),
            )
            .await?;
        let response = classified.into_response();

        match response.status.as_u16() {
            200 | 201 | 202 | 204 => {
                tracing::info!("deleted {}", resource.label());
                Ok(ChangeOutcome::changed(None))
            }
            400 | 404 => {
                tracing::debug!("{} was already gone", resource.label());
                Ok(ChangeOutcome::unchanged())
            }
            _ => Err(ApiError::client_request(
                format!("Unable to delete {}", resource.label()),
                &response,
            )),
        }
    }
}

fn decode(method: &Method, url: &Url, response: &ApiResponse) -> Result<Value, ApiError> {
    response.json().map_err(|source| ApiError::Decode {
        method: method.clone(),
        path: url.path().to_string(),
        source,
    })
}
