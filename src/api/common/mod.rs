//
//  quayctl
//  api/common/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Common API Types for the Quay Registry
//!
//! This module provides the shared vocabulary of the client layer: errors,
//! acceptable status sets, the tri-state lookup result, change outcomes and
//! the desired-field sets that drive reconciliation.
//!
//! # Overview
//!
//! - [`ApiError`] - Unified error type for all API operations
//! - [`StatusSet`] - HTTP statuses a caller treats as expected
//! - [`Lookup`] - Found / absent / soft-failed result of a read
//! - [`ChangeOutcome`] - Whether an operation modified remote state
//! - [`DesiredFields`] - Fields a caller wants a resource to have
//! - Pagination types (re-exported from [`pagination`] submodule)
//!
//! # Example
//!
//! ```rust
//! use quayctl::api::common::{ChangeOutcome, DesiredFields};
//!
//! let mut desired = DesiredFields::new();
//! desired.set("name", "ops").set_opt("description", None::<String>);
//! assert_eq!(desired.len(), 1);
//!
//! let outcome = ChangeOutcome::unchanged().merge(ChangeOutcome::changed(None));
//! assert!(outcome.changed);
//! ```

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};

mod error;
mod pagination;

pub use error::*;
pub use pagination::*;

/// A set of HTTP status codes a caller considers expected.
///
/// Passed to the classifier so that, for example, a `404` on a read is
/// reported as "absent" instead of an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSet(Vec<u16>);

impl StatusSet {
    /// Builds a set from raw status codes.
    pub fn new(codes: impl IntoIterator<Item = u16>) -> Self {
        let mut codes: Vec<u16> = codes.into_iter().collect();
        codes.sort_unstable();
        codes.dedup();
        Self(codes)
    }

    /// The empty set: nothing is acceptable beyond the classifier's own rules.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Returns `true` if `status` is in the set.
    pub fn contains(&self, status: StatusCode) -> bool {
        self.0.binary_search(&status.as_u16()).is_ok()
    }

    /// The raw codes, sorted.
    pub fn codes(&self) -> &[u16] {
        &self.0
    }
}

impl<const N: usize> From<[u16; N]> for StatusSet {
    fn from(codes: [u16; N]) -> Self {
        Self::new(codes)
    }
}

/// Result of reading a single resource.
///
/// `Failed` is only produced in soft error mode; in the default abort mode a
/// failed read is returned as `Err` instead.
#[derive(Debug)]
pub enum Lookup {
    /// The resource exists; holds its normalized snapshot.
    Found(Value),
    /// The server answered with one of the acceptable "missing" statuses.
    Absent,
    /// The read failed and the caller asked for a soft failure.
    Failed(ApiError),
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Borrows the snapshot if the resource was found.
    pub fn found(&self) -> Option<&Value> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Takes the snapshot if the resource was found, discarding failures.
    pub fn into_found(self) -> Option<Value> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Converts to a `Result`, turning a soft failure back into an error.
    pub fn into_result(self) -> Result<Option<Value>, ApiError> {
        match self {
            Self::Found(value) => Ok(Some(value)),
            Self::Absent => Ok(None),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Outcome of a mutating operation.
///
/// `changed` is `true` iff a mutating request was sent and accepted, or, in
/// check mode, would have been sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeOutcome {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ChangeOutcome {
    /// Nothing was (or would have been) modified.
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Remote state was modified; `data` is the decoded response body, if any.
    pub fn changed(data: Option<Value>) -> Self {
        Self {
            changed: true,
            data: data.filter(|value| !value.is_null()),
        }
    }

    /// Combines two steps of a workflow.
    ///
    /// The result is changed if either step changed; the later step's data
    /// wins when both carry some.
    pub fn merge(self, later: ChangeOutcome) -> Self {
        Self {
            changed: self.changed || later.changed,
            data: later.data.or(self.data),
        }
    }
}

/// Fields a caller wants a resource to have.
///
/// Keys set to `None` or JSON `null` are left out, so "unspecified" never
/// reaches the comparison or the request body. A field cannot be cleared
/// through this type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesiredFields(Map<String, Value>);

impl DesiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any previous value. `null` (including a
    /// `None` converted to a value) is skipped.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        if !value.is_null() {
            self.0.insert(key.into(), value);
        }
        self
    }

    /// Sets a field only when `value` is `Some`.
    pub fn set_opt<V: Into<Value>>(
        &mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.set(key, value);
        }
        self
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder form of [`set_opt`](Self::set_opt).
    pub fn with_opt<V: Into<Value>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.set_opt(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// The fields as a JSON object, ready to be sent as a request body.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for DesiredFields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for DesiredFields {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Adds an underscore-free alias for every top-level key containing `_`.
///
/// `{"tag_expiration_s": 60}` becomes
/// `{"tag_expiration_s": 60, "tagexpirations": 60}`. Nested objects are not
/// touched and non-object values are left as they are. Applying it twice
/// gives the same result as applying it once. A key that already exists
/// under the alias name keeps its own value.
pub fn normalize_keys(snapshot: &mut Value) {
    let Value::Object(map) = snapshot else {
        return;
    };

    let aliases: Vec<(String, Value)> = map
        .iter()
        .filter(|(key, _)| key.contains('_'))
        .map(|(key, value)| (key.replace('_', ""), value.clone()))
        .collect();

    for (alias, value) in aliases {
        map.entry(alias).or_insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_set() {
        let set = StatusSet::from([404, 400, 404]);
        assert_eq!(set.codes(), &[400, 404]);
        assert!(set.contains(StatusCode::NOT_FOUND));
        assert!(!set.contains(StatusCode::OK));
        assert!(!StatusSet::empty().contains(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_normalize_adds_aliases() {
        let mut value = json!({"tag_expiration_s": 60, "name": "acme", "is_org": true});
        normalize_keys(&mut value);
        assert_eq!(value["tagexpirations"], json!(60));
        assert_eq!(value["tag_expiration_s"], json!(60));
        assert_eq!(value["isorg"], json!(true));
        assert_eq!(value["name"], json!("acme"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut once = json!({"a_b": 1, "ab": 2, "nested": {"x_y": 3}});
        normalize_keys(&mut once);
        let mut twice = once.clone();
        normalize_keys(&mut twice);
        assert_eq!(once, twice);
        assert_eq!(once["a_b"], json!(1));
        assert_eq!(once["ab"], json!(2));
        assert_eq!(once["nested"], json!({"x_y": 3}));
    }

    #[test]
    fn test_normalize_ignores_non_objects() {
        let mut value = json!(["a_b"]);
        normalize_keys(&mut value);
        assert_eq!(value, json!(["a_b"]));
    }

    #[test]
    fn test_desired_fields_skip_none() {
        let desired = DesiredFields::new()
            .with("name", "ops")
            .with_opt("description", None::<String>)
            .with_opt("role", Some("admin"));
        assert_eq!(desired.to_value(), json!({"name": "ops", "role": "admin"}));
    }

    #[test]
    fn test_desired_fields_never_hold_null() {
        let desired = DesiredFields::new()
            .with("name", "ops")
            .with("description", None::<String>)
            .with("role", Value::Null);
        assert_eq!(desired.to_value(), json!({"name": "ops"}));
        assert!(desired.get("description").is_none());
        assert_eq!(desired.len(), 1);
    }

    #[test]
    fn test_change_outcome_merge() {
        let first = ChangeOutcome::changed(Some(json!({"step": 1})));
        let merged = first.clone().merge(ChangeOutcome::unchanged());
        assert!(merged.changed);
        assert_eq!(merged.data, Some(json!({"step": 1})));

        let merged = first.merge(ChangeOutcome::changed(Some(json!({"step": 2}))));
        assert_eq!(merged.data, Some(json!({"step": 2})));

        assert!(!ChangeOutcome::unchanged()
            .merge(ChangeOutcome::unchanged())
            .changed);
    }

    #[test]
    fn test_changed_drops_null_data() {
        assert_eq!(ChangeOutcome::changed(Some(Value::Null)).data, None);
    }

    #[test]
    fn test_lookup_accessors() {
        let found = Lookup::Found(json!({"name": "x"}));
        assert!(found.is_found());
        assert_eq!(found.found().unwrap()["name"], "x");
        assert!(Lookup::Absent.is_absent());
        assert!(Lookup::Absent.into_result().unwrap().is_none());

        let failed = Lookup::Failed(ApiError::Precondition("nope".into()));
        assert!(failed.into_result().is_err());
    }
}
