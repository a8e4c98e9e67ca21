//
//  quayctl
//  api/endpoint.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Endpoint templates.
//!
//! Registry paths are written relative to `/api/v1/` with `{name}`
//! placeholders, e.g. `organization/{orgname}/team/{teamname}`. An
//! [`Endpoint`] carries the template, its bindings and the query parameters
//! until the client turns it into a URL.

use reqwest::Url;

use super::common::ApiError;

/// Path prefix every registry API call lives under.
pub const API_PREFIX: &str = "/api/v1/";

/// A path template with placeholder bindings and query parameters.
///
/// # Example
///
/// ```rust
/// use quayctl::api::Endpoint;
///
/// let endpoint = Endpoint::new("organization/{orgname}/robots/{robot_shortname}")
///     .bind("orgname", "acme")
///     .bind("robot_shortname", "ci");
/// assert_eq!(endpoint.resolve().unwrap(), "organization/acme/robots/ci");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    template: String,
    bindings: Vec<(String, String)>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            bindings: Vec::new(),
            query: Vec::new(),
        }
    }

    /// Binds `{name}` to `value`. Values are inserted verbatim, without
    /// escaping, so a value may itself contain `/`.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.bindings.iter_mut().find(|(bound, _)| *bound == name) {
            Some(slot) => slot.1 = value,
            None => self.bindings.push((name, value)),
        }
        self
    }

    /// Sets a query parameter, replacing an earlier value for the same key.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.query.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.query.push((key, value)),
        }
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    fn binding(&self, name: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value.as_str())
    }

    /// Substitutes every placeholder in a single pass.
    ///
    /// Substituted values are not scanned again, so a value containing
    /// `{...}` is inserted literally. A `{` with no closing `}` is kept as is.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnboundPlaceholder`] for a placeholder with no binding.
    pub fn resolve(&self) -> Result<String, ApiError> {
        let mut resolved = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            resolved.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let Some(close) = after.find('}') else {
                resolved.push_str(&rest[open..]);
                return Ok(resolved);
            };

            let name = &after[..close];
            let value = self
                .binding(name)
                .ok_or_else(|| ApiError::UnboundPlaceholder {
                    template: self.template.clone(),
                    placeholder: name.to_string(),
                })?;
            resolved.push_str(value);
            rest = &after[close + 1..];
        }

        resolved.push_str(rest);
        Ok(resolved)
    }
}

/// Builds `<scheme>://<host>[:port]/api/v1/<path>` from the registry base URL.
///
/// Any path or query on `base` is replaced. Leading slashes on `path` are
/// dropped so `"/user/"` and `"user/"` give the same URL.
pub(crate) fn api_url(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    url.set_path(&format!("{API_PREFIX}{}", path.trim_start_matches('/')));
    url.set_query(None);
    url.set_fragment(None);
    url
}
