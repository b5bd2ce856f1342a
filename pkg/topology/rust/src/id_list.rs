// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A list of string IDs which is always sorted ascending and never holds
/// duplicates. Backs adjacency sets and render-node membership sets.
///
/// Deserialization goes through [`IDList::make`], so a peer sending an
/// unsorted or duplicated list cannot break the invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct IDList(Vec<String>);

impl IDList {
    pub fn new() -> Self {
        IDList(Vec::new())
    }

    /// Normalizes an arbitrary sequence of ids into sorted, unique form.
    pub fn make<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        ids.sort_unstable();
        ids.dedup();
        IDList(ids)
    }

    /// Inserts each id at its sorted position. Ids already present are skipped.
    pub fn add<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            let id = id.into();
            if let Err(pos) = self.position(&id) {
                self.0.insert(pos, id);
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_ok()
    }

    /// Sorted union of both lists, linear in their combined length.
    pub fn merge(&self, other: &IDList) -> IDList {
        let mut merged = Vec::with_capacity(self.0.len() + other.0.len());
        let mut left = self.0.iter().peekable();
        let mut right = other.0.iter().peekable();

        loop {
            let next = match (left.peek(), right.peek()) {
                (Some(l), Some(r)) => match l.cmp(r) {
                    Ordering::Less => left.next(),
                    Ordering::Greater => right.next(),
                    Ordering::Equal => {
                        right.next();
                        left.next()
                    }
                },
                (Some(_), None) => left.next(),
                (None, Some(_)) => right.next(),
                (None, None) => break,
            };
            if let Some(id) = next {
                merged.push(id.clone());
            }
        }

        IDList(merged)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    fn position(&self, id: &str) -> std::result::Result<usize, usize> {
        self.0.binary_search_by(|probe| probe.as_str().cmp(id))
    }
}

impl From<Vec<String>> for IDList {
    fn from(ids: Vec<String>) -> Self {
        IDList::make(ids)
    }
}

impl From<IDList> for Vec<String> {
    fn from(list: IDList) -> Self {
        list.0
    }
}

impl<S: Into<String>> FromIterator<S> for IDList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        IDList::make(iter)
    }
}

impl<'a> IntoIterator for &'a IDList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
