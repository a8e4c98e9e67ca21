//
//  quayctl
//  api/common/pagination.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Pagination for Quay listing endpoints.
//!
//! Quay listings are page-numbered: the client asks for `page=N&limit=M`
//! and every page carries `has_additional` telling whether another one
//! follows. Items live under an endpoint-specific key (`tags` for
//! repository tags, `repositories` for repository listings).
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `page` | Page number, 1-based |
//! | `has_additional` | `true` if another page follows |
//! | `<items key>` | The items of this page |
//!
//! # Example
//!
//! ```rust
//! use quayctl::api::common::PageResponse;
//!
//! let json = r#"{"page": 1, "has_additional": true, "tags": [{"name": "latest"}]}"#;
//! let page: PageResponse = serde_json::from_str(json).unwrap();
//! assert!(page.has_next());
//! assert_eq!(page.items("tags").len(), 1);
//! ```

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::client::{FetchOptions, QuayClient};
use crate::api::endpoint::Endpoint;

use super::ApiError;

/// Default number of items requested per page.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// One page of a Quay listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PageResponse {
    /// Page number echoed by the server, if any.
    #[serde(default)]
    pub page: Option<u32>,

    /// `true` if another page follows this one.
    #[serde(default)]
    pub has_additional: bool,

    /// Every other field, including the items array.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl PageResponse {
    pub fn has_next(&self) -> bool {
        self.has_additional
    }

    /// Items stored under `key`; empty when the key is missing or not an array.
    pub fn items(&self, key: &str) -> &[Value] {
        self.fields
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Takes the items stored under `key`.
    pub fn into_items(mut self, key: &str) -> Vec<Value> {
        match self.fields.remove(key) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }
}

/// Walks a page-numbered listing and gathers its items.
///
/// Requests pages 1, 2, 3, ... and stops after a page without
/// `has_additional`, an empty page, an absent listing or `max_pages` pages.
#[derive(Debug, Clone)]
pub struct Paginator {
    endpoint: Endpoint,
    items_key: String,
    limit: u32,
    max_pages: Option<u32>,
}

impl Paginator {
    pub fn new(endpoint: Endpoint, items_key: impl Into<String>) -> Self {
        Self {
            endpoint,
            items_key: items_key.into(),
            limit: DEFAULT_PAGE_LIMIT,
            max_pages: None,
        }
    }

    /// Items requested per page.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Upper bound on the number of pages fetched.
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Collects every item of every page.
    pub async fn collect(&self, client: &mut QuayClient) -> Result<Vec<Value>, ApiError> {
        self.collect_filtered(client, |_| true).await
    }

    /// Collects the items for which `keep` returns `true`.
    pub async fn collect_filtered<F>(
        &self,
        client: &mut QuayClient,
        mut keep: F,
    ) -> Result<Vec<Value>, ApiError>
    where
        F: FnMut(&Value) -> bool,
    {
        let mut collected = Vec::new();
        let mut page: u32 = 1;

        loop {
            let endpoint = self
                .endpoint
                .clone()
                .query("page", page)
                .query("limit", self.limit);

            let Some(body) = client
                .fetch(&endpoint, &FetchOptions::default())
                .await?
                .into_result()?
            else {
                tracing::debug!(page, "listing not found");
                break;
            };

            let response: PageResponse =
                serde_json::from_value(body).map_err(|source| ApiError::Decode {
                    method: Method::GET,
                    path: client
                        .build_url(&endpoint)
                        .map(|url| url.path().to_string())
                        .unwrap_or_else(|_| endpoint.template().to_string()),
                    source,
                })?;

            let has_next = response.has_next();
            let items = response.into_items(&self.items_key);
            if items.is_empty() {
                break;
            }

            tracing::debug!(page, count = items.len(), "fetched listing page");
            collected.extend(items.into_iter().filter(|item| keep(item)));

            if !has_next {
                break;
            }
            if self.max_pages.is_some_and(|max| page >= max) {
                tracing::warn!(
                    "stopped after {} pages of {}; the listing is incomplete",
                    page,
                    self.endpoint.template()
                );
                break;
            }
            page += 1;
        }

        Ok(collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::{HttpTransport, TransportOptions};
    use mockito::Matcher;
    use reqwest::Url;
    use serde_json::json;

    fn client_for(server: &mockito::Server) -> QuayClient {
        let transport = HttpTransport::new(&TransportOptions::default()).unwrap();
        QuayClient::new(Url::parse(&server.url()).unwrap(), Box::new(transport))
    }

    fn tags() -> Endpoint {
        Endpoint::new("repository/{repository}/tag/").bind("repository", "ns/app")
    }

    fn page_query(page: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), page.into()),
            Matcher::UrlEncoded("limit".into(), "100".into()),
        ])
    }

    #[test]
    fn test_page_response_defaults() {
        let page: PageResponse = serde_json::from_str(r#"{"tags": []}"#).unwrap();
        assert!(!page.has_next());
        assert!(page.items("tags").is_empty());
        assert!(page.items("missing").is_empty());
    }

    #[tokio::test]
    async fn test_single_page_makes_one_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/repository/ns/app/tag/")
            .match_query(page_query("1"))
            .with_status(200)
            .with_body(r#"{"page": 1, "has_additional": false, "tags": [{"name": "v1"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let mut client = client_for(&server);
        let items = Paginator::new(tags(), "tags").collect(&mut client).await.unwrap();

        mock.assert_async().await;
        assert_eq!(items, vec![json!({"name": "v1"})]);
    }

    #[tokio::test]
    async fn test_follows_has_additional() {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        for (page, more) in [("1", true), ("2", true), ("3", false)] {
            let body = json!({"has_additional": more, "tags": [{"name": format!("t{page}")}]});
            mocks.push(
                server
                    .mock("GET", "/api/v1/repository/ns/app/tag/")
                    .match_query(page_query(page))
                    .with_status(200)
                    .with_body(body.to_string())
                    .expect(1)
                    .create_async()
                    .await,
            );
        }

        let mut client = client_for(&server);
        let items = Paginator::new(tags(), "tags").collect(&mut client).await.unwrap();

        for mock in mocks {
            mock.assert_async().await;
        }
        let names: Vec<&str> = items.iter().filter_map(|t| t["name"].as_str()).collect();
        assert_eq!(names, ["t1", "t2", "t3"]);
    }

    #[tokio::test]
    async fn test_empty_page_stops_even_with_more_flag() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/api/v1/repository/ns/app/tag/")
            .match_query(page_query("1"))
            .with_status(200)
            .with_body(r#"{"has_additional": true, "tags": []}"#)
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/api/v1/repository/ns/app/tag/")
            .match_query(page_query("2"))
            .expect(0)
            .create_async()
            .await;

        let mut client = client_for(&server);
        let items = Paginator::new(tags(), "tags").collect(&mut client).await.unwrap();

        assert!(items.is_empty());
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_max_pages_bounds_requests() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/repository/ns/app/tag/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"has_additional": true, "tags": [{"name": "x"}]}"#)
            .expect(2)
            .create_async()
            .await;

        let mut client = client_for(&server);
        let items = Paginator::new(tags(), "tags")
            .max_pages(2)
            .collect(&mut client)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_filter_keeps_matching_items() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/repository/ns/app/tag/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "has_additional": false,
                    "tags": [
                        {"name": "a", "manifest_digest": "sha256:1"},
                        {"name": "b", "manifest_digest": "sha256:2"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let mut client = client_for(&server);
        let items = Paginator::new(tags(), "tags")
            .collect_filtered(&mut client, |tag| tag["manifest_digest"] == "sha256:2")
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "b");
    }

    #[tokio::test]
    async fn test_absent_listing_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/repository/ns/app/tag/")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let mut client = client_for(&server);
        let items = Paginator::new(tags(), "tags").collect(&mut client).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_page_names_request_path() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/repository/ns/app/tag/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[1, 2]")
            .create_async()
            .await;

        let mut client = client_for(&server);
        let err = Paginator::new(tags(), "tags")
            .collect(&mut client)
            .await
            .unwrap_err();

        match err {
            ApiError::Decode { path, .. } => assert_eq!(path, "/api/v1/repository/ns/app/tag/"),
            other => panic!("expected a decode error, got {other:?}"),
        }
    }
}
