//! Pane parameters
//!
//! Provides [`PaneParams`], the ordered key/value view-state carried by each
//! router pane sibling.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Params that are never inherited from a group root by its later siblings
pub const EXCLUSIVE_PARAMS: &[&str] = &["view", "since", "rev"];

/// Param keys with a meaning to the desk itself
pub const RESERVED_PARAMS: &[&str] = &["view", "expanded", "template", "since", "rev"];

/// Check if a param key is exclusive to the sibling that sets it
#[inline]
#[must_use]
pub fn is_exclusive_param(key: &str) -> bool {
    EXCLUSIVE_PARAMS.contains(&key)
}

/// Ordered pane parameters
///
/// Entries keep the order they were written in and duplicate keys are kept
/// verbatim; lookups resolve to the last occurrence. Equality ignores the
/// relative order of distinct keys but not the order of repeated ones.
#[derive(Debug, Clone, Default)]
pub struct PaneParams(Vec<(String, String)>);

impl PaneParams {
    /// Create empty params
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of entries (duplicates included)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value for `key` (last occurrence wins)
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in order
    #[inline]
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Check if `key` is present
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Check if `key` is present with a non-empty value
    #[inline]
    #[must_use]
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    /// Append an entry without touching existing ones
    #[inline]
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Set `key`, replacing the first occurrence in place and dropping the rest
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter().position(|(k, _)| *k == key) {
            Some(idx) => {
                self.0[idx].1 = value;
                let mut seen = false;
                self.0.retain(|(k, _)| {
                    if *k != key {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.0.push((key, value)),
        }
    }

    /// Set `key`, returning the updated params
    #[inline]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Remove every occurrence of `key`, returning the last value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let last = self.get(key).map(str::to_string);
        self.0.retain(|(k, _)| k != key);
        last
    }

    /// Keep only entries matching the predicate
    #[inline]
    pub fn retain(&mut self, mut f: impl FnMut(&str, &str) -> bool) {
        self.0.retain(|(k, v)| f(k, v));
    }

    /// Iterate entries in order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Distinct keys in first-seen order
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (k, _) in &self.0 {
            if !keys.contains(&k.as_str()) {
                keys.push(k);
            }
        }
        keys
    }

    /// Copy of these params without exclusive keys
    #[must_use]
    pub fn without_exclusive(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| !is_exclusive_param(k))
                .cloned()
                .collect(),
        )
    }

    /// Copy containing only the given keys
    #[must_use]
    pub fn pick(&self, keys: &[&str]) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| keys.contains(&k.as_str()))
                .cloned()
                .collect(),
        )
    }

    /// Copy without the given keys
    #[must_use]
    pub fn omit(&self, keys: &[&str]) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .cloned()
                .collect(),
        )
    }

    /// Params a later sibling ends up with: the root's non-exclusive entries
    /// it does not override, followed by its own entries verbatim
    #[must_use]
    pub fn inherit_from(&self, root: &PaneParams) -> Self {
        let mut merged: Vec<(String, String)> = root
            .0
            .iter()
            .filter(|(k, _)| !is_exclusive_param(k) && !self.contains_key(k))
            .cloned()
            .collect();
        merged.extend(self.0.iter().cloned());
        Self(merged)
    }

    /// Overlay `other` on top of these params (object-spread semantics)
    #[must_use]
    pub fn merged(&self, other: &PaneParams) -> Self {
        let mut out = self.clone();
        for (k, v) in other.iter() {
            out.set(k, v);
        }
        out
    }

    fn sorted(&self) -> Vec<&(String, String)> {
        let mut entries: Vec<&(String, String)> = self.0.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl PartialEq for PaneParams {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.sorted() == other.sorted()
    }
}

impl Eq for PaneParams {}

impl Hash for PaneParams {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (k, v) in self.sorted() {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PaneParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for PaneParams {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl Serialize for PaneParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PaneParams {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ParamsVisitor;

        impl<'de> Visitor<'de> for ParamsVisitor {
            type Value = PaneParams;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of string params")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    entries.push((k, v));
                }
                Ok(PaneParams(entries))
            }
        }

        deserializer.deserialize_map(ParamsVisitor)
    }
}
