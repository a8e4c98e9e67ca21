//
//  quayctl
//  api/quay/tag.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Repository tag listing.

use serde_json::Value;

use crate::api::common::{ApiError, Paginator};
use crate::api::endpoint::Endpoint;
use crate::engine::Engine;

/// Filters applied to a tag listing.
#[derive(Debug, Clone, Default)]
pub struct TagQuery {
    /// Only this tag name (server-side filter).
    pub tag: Option<String>,
    /// Only tags pointing at this manifest digest.
    pub digest: Option<String>,
    /// Skip expired and deleted tags.
    pub only_active: bool,
}

/// Lists the tags of `namespace/repository`, following every page.
///
/// A missing namespace or repository gives an empty list.
pub async fn list(
    engine: &mut Engine,
    namespace: &str,
    repository: &str,
    query: &TagQuery,
) -> Result<Vec<Value>, ApiError> {
    if engine.get_namespace(namespace).await?.is_none() {
        tracing::debug!(namespace, "namespace not found, no tags to list");
        return Ok(Vec::new());
    }

    let mut endpoint = Endpoint::new("repository/{repository}/tag/")
        .bind("repository", format!("{namespace}/{repository}"));
    if query.only_active {
        endpoint = endpoint.query("onlyActiveTags", true);
    }
    if let Some(tag) = &query.tag {
        endpoint = endpoint.query("specificTag", tag);
    }

    let paginator = Paginator::new(endpoint, "tags");
    match &query.digest {
        Some(digest) => {
            paginator
                .collect_filtered(engine.client(), |tag| {
                    tag.get("manifest_digest").and_then(Value::as_str) == Some(digest.as_str())
                })
                .await
        }
        None => paginator.collect(engine.client()).await,
    }
}
