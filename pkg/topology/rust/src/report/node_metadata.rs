// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

/// Observed facts about one node, keyed by attribute name.
///
/// Different reporters may contribute disjoint sets of keys for the same
/// node; [`NodeMetadata::merge`] unions them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeMetadata(BTreeMap<String, String>);

impl NodeMetadata {
    pub fn new() -> Self {
        NodeMetadata(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder form of [`NodeMetadata::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Key-wise union. When both sides hold the same key the value from
    /// `other` wins: the right-hand side is the most recent observation.
    pub fn merge(&mut self, other: &NodeMetadata) {
        for (key, value) in &other.0 {
            match self.0.get_mut(key) {
                Some(existing) if existing == value => {}
                Some(existing) => existing.clone_from(value),
                None => {
                    self.0.insert(key.clone(), value.clone());
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NodeMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        NodeMetadata(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a NodeMetadata {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_unions_disjoint_keys() {
        let mut left: NodeMetadata = [("pid", "1")].into_iter().collect();
        let right: NodeMetadata = [("comm", "init")].into_iter().collect();
        left.merge(&right);

        assert_eq!(left.get("pid"), Some("1"));
        assert_eq!(left.get("comm"), Some("init"));
        assert_eq!(left.len(), 2);
    }

    #[test]
    fn test_merge_right_hand_value_wins() {
        let mut left: NodeMetadata = [("threads", "4"), ("pid", "1")].into_iter().collect();
        let right: NodeMetadata = [("threads", "9")].into_iter().collect();
        left.merge(&right);

        assert_eq!(left.get("threads"), Some("9"));
        assert_eq!(left.get("pid"), Some("1"));

        let mut reversed = right.clone();
        reversed.merge(&[("threads", "4")].into_iter().collect());
        assert_eq!(reversed.get("threads"), Some("4"));
    }

    #[test]
    fn test_merge_with_self_is_identity() {
        let md = NodeMetadata::new().with("pid", "1").with("comm", "init");
        let mut merged = md.clone();
        merged.merge(&md);
        assert_eq!(merged, md);
    }

    #[test]
    fn test_merge_empty() {
        let md = NodeMetadata::new().with("pid", "1");
        let mut merged = md.clone();
        merged.merge(&NodeMetadata::new());
        assert_eq!(merged, md);

        let mut empty = NodeMetadata::new();
        empty.merge(&md);
        assert_eq!(empty, md);
    }
}
