//! Entity tree view
//!
//! Holds the rendered node arena for one tree-view session together with the
//! injected [`ExpansionTracker`]. Rendering dispatches on entity type (see
//! `render`), expand/collapse and delete live in `render` as well, and the
//! inline name editor in `rename`.

pub mod effect;
pub mod expansion;
pub mod node;
pub mod rename;
pub mod render;

pub use effect::Effect;
pub use expansion::{ExpansionKey, ExpansionTracker};
pub use node::{Affordance, ExpandState, NameLabel, NodeHandle, UploadState, VisualNode};
pub use rename::{EditKey, RenameSession};
pub use render::Rendered;

use std::collections::BTreeMap;

use crate::error::{ConsoleError, ConsoleResult};

#[derive(Debug, Default)]
pub struct TreeView {
    nodes: BTreeMap<NodeHandle, VisualNode>,
    roots: Vec<NodeHandle>,
    next_handle: u64,
    tracker: ExpansionTracker,
    effects: Vec<Effect>,
    selected: Option<NodeHandle>,
}

impl TreeView {
    pub fn new(tracker: ExpansionTracker) -> Self {
        Self {
            tracker,
            ..Default::default()
        }
    }

    pub fn tracker(&self) -> &ExpansionTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ExpansionTracker {
        &mut self.tracker
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&VisualNode> {
        self.nodes.get(&handle)
    }

    pub(crate) fn node_mut(&mut self, handle: NodeHandle) -> ConsoleResult<&mut VisualNode> {
        self.nodes
            .get_mut(&handle)
            .ok_or(ConsoleError::UnknownNode(handle))
    }

    pub fn roots(&self) -> &[NodeHandle] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn selected(&self) -> Option<NodeHandle> {
        self.selected
    }

    /// Node rendered for exactly this `(entity, parent, resource)` triple
    pub fn find(
        &self,
        entity_id: &str,
        parent_id: Option<&str>,
        resource_id: Option<&str>,
    ) -> Option<NodeHandle> {
        self.nodes.values().find_map(|n| {
            (n.entity_id == entity_id
                && n.parent_id.as_deref() == parent_id
                && n.resource_id.as_deref() == resource_id)
                .then_some(n.handle)
        })
    }

    /// Every node showing `entity_id`, in render order
    pub fn find_by_entity(&self, entity_id: &str) -> Vec<NodeHandle> {
        self.nodes
            .values()
            .filter(|n| n.entity_id == entity_id)
            .map(|n| n.handle)
            .collect()
    }

    /// Drain the queued side effects
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn pending_effects(&self) -> &[Effect] {
        &self.effects
    }

    pub(crate) fn push_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Depth-first listing from the roots, for drawing
    pub fn walk(&self) -> Vec<(usize, &VisualNode)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, NodeHandle)> =
            self.roots.iter().rev().map(|h| (0, *h)).collect();
        while let Some((depth, handle)) = stack.pop() {
            if let Some(node) = self.nodes.get(&handle) {
                out.push((depth, node));
                stack.extend(node.children.iter().rev().map(|c| (depth + 1, *c)));
            }
        }
        out
    }

    /// Generic click on a node: selects it unless click handling is suspended
    /// (name being edited). Returns whether the click was handled.
    pub fn click_node(&mut self, handle: NodeHandle) -> ConsoleResult<bool> {
        let node = self.node_mut(handle)?;
        if node.click_suspended {
            return Ok(false);
        }
        self.selected = Some(handle);
        Ok(true)
    }

    pub(crate) fn insert_node(&mut self, mut node: VisualNode) -> NodeHandle {
        let handle = NodeHandle(self.next_handle);
        self.next_handle += 1;
        node.handle = handle;

        match node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent) => parent.children.push(handle),
            None => {
                node.parent = None;
                self.roots.push(handle);
            }
        }
        self.nodes.insert(handle, node);
        handle
    }

    /// Remove a node and its whole subtree. Returns the entity ids removed,
    /// root of the subtree first.
    pub fn remove_node(&mut self, handle: NodeHandle) -> ConsoleResult<Vec<String>> {
        let parent = self
            .nodes
            .get(&handle)
            .ok_or(ConsoleError::UnknownNode(handle))?
            .parent;

        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent) => parent.children.retain(|c| *c != handle),
            None => self.roots.retain(|r| *r != handle),
        }

        let mut removed_handles = Vec::new();
        let mut removed_ids = Vec::new();
        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            if let Some(node) = self.nodes.remove(&h) {
                stack.extend(node.children.iter().rev().copied());
                removed_handles.push(h);
                removed_ids.push(node.entity_id);
            }
        }

        if self.selected.is_some_and(|s| removed_handles.contains(&s)) {
            self.selected = None;
        }
        self.effects.retain(|effect| match effect {
            Effect::FetchChildren { node, .. } | Effect::Upload { node, .. } => {
                !removed_handles.contains(node)
            }
            _ => true,
        });

        Ok(removed_ids)
    }

    /// Remove the rendered children of a node, keeping the node itself
    pub(crate) fn clear_children(&mut self, handle: NodeHandle) -> ConsoleResult<()> {
        let children = self
            .node(handle)
            .ok_or(ConsoleError::UnknownNode(handle))?
            .children
            .clone();
        for child in children {
            self.remove_node(child)?;
        }
        Ok(())
    }
}
