//
//  quayctl
//  engine/cache.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Per-engine memo of organization lookups.

use std::collections::HashMap;

use serde_json::Value;

/// Organization snapshots keyed on the exact name that was looked up.
///
/// `Some(None)` from [`get`](Self::get) means "looked up, does not exist".
/// Entries are never invalidated; a fresh engine starts with a fresh cache.
#[derive(Debug, Default)]
pub struct NamespaceCache {
    entries: HashMap<String, Option<Value>>,
}

impl NamespaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entry, or `None` when the name was never looked up.
    pub fn get(&self, name: &str) -> Option<Option<&Value>> {
        self.entries.get(name).map(Option::as_ref)
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: Option<Value>) {
        self.entries.insert(name.into(), entry);
    }

    #[cfg(test)]
    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_miss_found_and_not_found() {
        let mut cache = NamespaceCache::new();
        assert!(cache.get("acme").is_none());
        assert!(cache.is_empty());

        cache.insert("acme", Some(json!({"name": "acme"})));
        cache.insert("ghost", None);

        assert_eq!(cache.get("acme"), Some(Some(&json!({"name": "acme"}))));
        assert_eq!(cache.get("ghost"), Some(None));
        assert!(cache.contains("ghost"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_keys_are_exact() {
        let mut cache = NamespaceCache::new();
        cache.insert("Acme", None);
        assert!(!cache.contains("acme"));
    }
}
