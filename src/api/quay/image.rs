//
//  quayctl
//  api/quay/image.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Image references.

use std::fmt;
use std::str::FromStr;

use crate::api::common::ApiError;
use crate::engine::Engine;

/// Tag assumed when a reference names neither a tag nor a digest.
pub const DEFAULT_TAG: &str = "latest";

/// A parsed `[namespace/]repository[:tag|@digest]` reference.
///
/// # Example
///
/// ```rust
/// use quayctl::api::quay::image::ImageRef;
///
/// let image: ImageRef = "acme/app@sha256:0123".parse().unwrap();
/// assert_eq!(image.namespace.as_deref(), Some("acme"));
/// assert_eq!(image.digest.as_deref(), Some("sha256:0123"));
/// assert!(image.tag.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub namespace: Option<String>,
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageRef {
    /// The tag to use: the explicit one, else `latest` unless a digest is given.
    pub fn effective_tag(&self) -> Option<&str> {
        match (&self.tag, &self.digest) {
            (Some(tag), _) => Some(tag),
            (None, Some(_)) => None,
            (None, None) => Some(DEFAULT_TAG),
        }
    }

    /// The namespace, falling back to the authenticated user's own.
    ///
    /// # Errors
    ///
    /// [`ApiError::Precondition`] when the reference has no namespace and the
    /// session is anonymous.
    pub async fn resolve_namespace(&self, engine: &mut Engine) -> Result<String, ApiError> {
        if let Some(namespace) = &self.namespace {
            return Ok(namespace.clone());
        }
        engine.who_am_i().await?.ok_or_else(|| {
            ApiError::Precondition(format!(
                "The image name must include the namespace: <namespace>/{}",
                self.repository
            ))
        })
    }
}

impl FromStr for ImageRef {
    type Err = ApiError;

    fn from_str(reference: &str) -> Result<Self, Self::Err> {
        let invalid = || ApiError::Precondition(format!("Invalid image reference '{reference}'"));

        let (name, tag, digest) = match reference.split_once('@') {
            Some((name, digest)) => (name, None, Some(digest)),
            None => match reference.rsplit_once(':') {
                Some((name, tag)) => (name, Some(tag), None),
                None => (reference, None, None),
            },
        };

        let (namespace, repository) = match name.split_once('/') {
            Some((namespace, repository)) => (Some(namespace), repository),
            None => (None, name),
        };

        if repository.is_empty()
            || repository.contains('/')
            || namespace.is_some_and(str::is_empty)
            || tag.is_some_and(str::is_empty)
            || digest.is_some_and(str::is_empty)
        {
            return Err(invalid());
        }

        Ok(Self {
            namespace: namespace.map(str::to_owned),
            repository: repository.to_string(),
            tag: tag.map(str::to_owned),
            digest: digest.map(str::to_owned),
        })
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{namespace}/")?;
        }
        f.write_str(&self.repository)?;
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")
        } else if let Some(tag) = &self.tag {
            write!(f, ":{tag}")
        } else {
            Ok(())
        }
    }
}
