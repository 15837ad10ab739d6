//! Expansion tracker
//!
//! Persistent set of tree nodes the user has opened. A key's presence means the
//! node renders expanded; absence means collapsed. Keys are only added and
//! removed by explicit expand/collapse, plus [`ExpansionTracker::forget_entity`]
//! after a delete.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::ConsoleResult;

/// Identity of a tree node for expansion purposes. The resource id tells apart
/// the same entity shown under different root views.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionKey {
    pub entity_id: String,
    pub parent_id: Option<String>,
    pub resource_id: Option<String>,
}

impl ExpansionKey {
    pub fn new(
        entity_id: impl Into<String>,
        parent_id: Option<&str>,
        resource_id: Option<&str>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            parent_id: parent_id.map(str::to_string),
            resource_id: resource_id.map(str::to_string),
        }
    }

    fn mentions(&self, id: &str) -> bool {
        self.entity_id == id
            || self.parent_id.as_deref() == Some(id)
            || self.resource_id.as_deref() == Some(id)
    }
}

impl std::fmt::Display for ExpansionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (parent: {}, resource: {})",
            self.entity_id,
            self.parent_id.as_deref().unwrap_or("-"),
            self.resource_id.as_deref().unwrap_or("-")
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionTracker {
    expanded: BTreeSet<ExpansionKey>,
}

impl ExpansionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, key: &ExpansionKey) -> bool {
        self.expanded.contains(key)
    }

    /// Returns true if the key was not tracked before
    pub fn add_expanded_node(&mut self, key: ExpansionKey) -> bool {
        self.expanded.insert(key)
    }

    /// Returns true if the key was tracked
    pub fn remove_expanded_node(&mut self, key: &ExpansionKey) -> bool {
        self.expanded.remove(key)
    }

    /// Drop every key that refers to `id` as entity, parent or resource.
    /// Returns the number of keys removed.
    pub fn forget_entity(&mut self, id: &str) -> usize {
        let before = self.expanded.len();
        self.expanded.retain(|key| !key.mentions(id));
        before - self.expanded.len()
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ExpansionKey> {
        self.expanded.iter()
    }

    /// Load a tracker saved by [`ExpansionTracker::save`]. A missing file is an
    /// empty tracker.
    pub fn load(path: &Path) -> ConsoleResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let keys: Vec<ExpansionKey> = serde_json::from_str(&content)?;
        Ok(Self {
            expanded: keys.into_iter().collect(),
        })
    }

    pub fn save(&self, path: &Path) -> ConsoleResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let keys: Vec<&ExpansionKey> = self.expanded.iter().collect();
        std::fs::write(path, serde_json::to_string_pretty(&keys)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_remove() {
        let mut tracker = ExpansionTracker::new();
        let key = ExpansionKey::new("n1", None, Some("r1"));

        assert!(!tracker.is_expanded(&key));
        assert!(tracker.add_expanded_node(key.clone()));
        assert!(tracker.is_expanded(&key));
        assert!(!tracker.add_expanded_node(key.clone()));
        assert!(tracker.remove_expanded_node(&key));
        assert!(!tracker.is_expanded(&key));
        assert!(!tracker.remove_expanded_node(&key));
    }

    #[test]
    fn distinct_triples_do_not_interfere() {
        let mut tracker = ExpansionTracker::new();
        let a = ExpansionKey::new("n1", None, Some("r1"));
        let b = ExpansionKey::new("n1", None, Some("r2"));
        let c = ExpansionKey::new("n1", Some("p1"), Some("r1"));
        let d = ExpansionKey::new("n1", None, None);

        tracker.add_expanded_node(a.clone());
        tracker.add_expanded_node(b.clone());
        tracker.add_expanded_node(c.clone());
        tracker.remove_expanded_node(&b);

        assert!(tracker.is_expanded(&a));
        assert!(!tracker.is_expanded(&b));
        assert!(tracker.is_expanded(&c));
        assert!(!tracker.is_expanded(&d));
    }

    #[test]
    fn forget_entity_matches_any_position() {
        let mut tracker = ExpansionTracker::new();
        tracker.add_expanded_node(ExpansionKey::new("r1", None, Some("r1")));
        tracker.add_expanded_node(ExpansionKey::new("n1", Some("r1"), None));
        tracker.add_expanded_node(ExpansionKey::new("n2", None, Some("r1")));
        tracker.add_expanded_node(ExpansionKey::new("n3", None, Some("r9")));

        assert_eq!(tracker.forget_entity("r1"), 3);
        assert_eq!(tracker.len(), 1);
    }
}
