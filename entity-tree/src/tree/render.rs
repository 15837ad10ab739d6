//! Type dispatch and tree rendering
//!
//! `render` picks one strategy per entity type. Folder, group and generic
//! element strategies append their own type-specific children and report
//! [`Rendered::Handled`]; every other strategy creates a single node.

use tracing::{debug, info, warn};

use super::node::{Affordance, ExpandState, NameLabel, UploadState, VisualNode};
use super::{Effect, NodeHandle, TreeView};
use crate::error::{ConsoleError, ConsoleResult};
use crate::model::{Entity, EntityKind, EntityType};

/// Outcome of rendering one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendered {
    /// A single node; callers may treat it as a flat child
    Node(NodeHandle),
    /// The strategy already appended the entity's children itself
    Handled(NodeHandle),
}

impl Rendered {
    pub fn handle(&self) -> NodeHandle {
        match self {
            Self::Node(h) | Self::Handled(h) => *h,
        }
    }

    /// The created node, unless the strategy handled its own children
    pub fn flat_node(&self) -> Option<NodeHandle> {
        match self {
            Self::Node(h) => Some(*h),
            Self::Handled(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Placement<'a> {
    parent: Option<NodeHandle>,
    parent_id: Option<&'a str>,
    resource_id: Option<&'a str>,
}

impl<'a> Placement<'a> {
    fn under(parent: NodeHandle, parent_id: &'a str, resource_id: Option<&'a str>) -> Self {
        Self {
            parent: Some(parent),
            parent_id: Some(parent_id),
            resource_id,
        }
    }
}

impl TreeView {
    /// Render an entity below the node showing `parent_id` (or as a root when
    /// there is none). With `replace_existing`, a node already rendered for
    /// the same `(entity, parent, resource)` triple is removed first.
    /// `has_children` gives the node an expand affordance.
    pub fn render(
        &mut self,
        entity: &Entity,
        parent_id: Option<&str>,
        resource_id: Option<&str>,
        replace_existing: bool,
        has_children: bool,
    ) -> Rendered {
        let parent = parent_id.and_then(|pid| self.locate_parent(pid, resource_id));
        let at = Placement {
            parent,
            parent_id,
            resource_id,
        };
        self.dispatch(entity, at, replace_existing, has_children)
    }

    fn dispatch(
        &mut self,
        entity: &Entity,
        at: Placement<'_>,
        replace: bool,
        has_children: bool,
    ) -> Rendered {
        debug!(entity = %entity.id, kind = entity.type_name(), "render");

        match &entity.kind {
            EntityKind::Resource
            | EntityKind::Component
            | EntityKind::Content
            | EntityKind::User => Rendered::Node(self.append_node(entity, at, replace, has_children)),

            EntityKind::Image | EntityKind::File => {
                let handle = self.append_node(entity, at, replace, has_children);
                self.stage_upload(handle, entity);
                Rendered::Node(handle)
            }

            EntityKind::Folder {
                folders,
                images,
                files,
            } => {
                let folder = self.append_node(entity, at, replace, has_children);
                let below = Placement::under(folder, &entity.id, at.resource_id);
                for sub in folders {
                    self.dispatch(sub, below, replace, has_children);
                }
                for image in images {
                    self.append_node(image, below, replace, has_children);
                }
                // Images also show up in `files`; only plain files go here.
                for file in files.iter().filter(|f| f.entity_type() == EntityType::File) {
                    self.append_node(file, below, replace, has_children);
                }
                Rendered::Handled(folder)
            }

            EntityKind::Group { users } => {
                let group = self.append_node(entity, at, replace, has_children);
                let below = Placement::under(group, &entity.id, at.resource_id);
                for user in users {
                    self.append_node(user, below, replace, has_children);
                }
                Rendered::Handled(group)
            }

            EntityKind::Element { elements, .. } => {
                let element = self.append_node(entity, at, replace, has_children);
                let below = Placement::under(element, &entity.id, at.resource_id);
                for child in elements {
                    match child.entity_type() {
                        EntityType::Element => {
                            self.dispatch(child, below, replace, has_children);
                        }
                        EntityType::Content => {
                            self.append_node(child, below, replace, has_children);
                        }
                        other => {
                            debug!(parent = %entity.id, child = %child.id, kind = %other, "skipping non-element child");
                        }
                    }
                }
                Rendered::Handled(element)
            }
        }
    }

    /// Walk an entity graph already laid out in tree form (`children`),
    /// rendering every child below `parent` and recursing into each child's
    /// subtree regardless of type. Nodes drawn here show their whole subtree
    /// and are leaves: there is nothing left to fetch for them.
    pub fn render_tree(&mut self, parent: &Entity, root_id: Option<&str>) {
        let anchor = self.locate_parent(&parent.id, root_id);
        self.render_tree_under(parent, anchor, root_id);
    }

    fn render_tree_under(
        &mut self,
        parent: &Entity,
        anchor: Option<NodeHandle>,
        root_id: Option<&str>,
    ) {
        for child in &parent.children {
            let at = Placement {
                parent: anchor,
                parent_id: Some(&parent.id),
                resource_id: root_id,
            };
            let handle = match &child.kind {
                EntityKind::Folder { files, .. } => {
                    let folder = self.append_node(child, at, false, false);
                    let below = Placement::under(folder, &child.id, root_id);
                    for file in files {
                        self.append_node(file, below, false, false);
                    }
                    folder
                }
                _ => self.append_node(child, at, false, false),
            };
            self.render_tree_under(child, Some(handle), root_id);
        }
    }

    fn append_node(
        &mut self,
        entity: &Entity,
        at: Placement<'_>,
        replace: bool,
        has_children: bool,
    ) -> NodeHandle {
        let resource_id = at
            .resource_id
            .map(str::to_string)
            .or_else(|| entity.resource_id.clone())
            .or_else(|| (entity.entity_type() == EntityType::Resource).then(|| entity.id.clone()));

        if replace {
            if let Some(existing) = self.find(&entity.id, at.parent_id, resource_id.as_deref()) {
                // The node was just looked up, removal cannot miss.
                let _ = self.remove_node(existing);
            }
        }

        // A node whose entity still has children may not be deleted.
        let delete = if entity.has_typed_children() || !entity.children.is_empty() {
            Affordance::Disabled
        } else {
            Affordance::Enabled
        };

        let node = VisualNode {
            handle: NodeHandle(0),
            entity_id: entity.id.clone(),
            entity_type: entity.entity_type(),
            type_name: entity.type_name().to_string(),
            parent: at.parent,
            parent_id: at.parent_id.map(str::to_string),
            resource_id,
            children: Vec::new(),
            delete,
            expand: if has_children {
                ExpandState::Collapsed
            } else {
                ExpandState::Leaf
            },
            name: NameLabel::Label(entity.name.clone()),
            upload: UploadState::NotRequired,
            click_suspended: false,
            buttons_visible: true,
        };
        let handle = self.insert_node(node);

        if has_children {
            let key = self.nodes[&handle].key();
            if self.tracker.is_expanded(&key) {
                debug!(%key, "restoring expanded node");
                self.open(handle);
            }
        }
        handle
    }

    fn locate_parent(&self, parent_id: &str, resource_id: Option<&str>) -> Option<NodeHandle> {
        let candidates = self.find_by_entity(parent_id);
        candidates
            .iter()
            .copied()
            .find(|h| self.nodes[h].resource_id.as_deref() == resource_id)
            .or_else(|| candidates.first().copied())
    }

    // ---------------------------------------------------------------------
    // Expand / collapse
    // ---------------------------------------------------------------------

    /// Flip a node between collapsed and expanded. The node's own
    /// [`ExpandState`] decides the direction. Leaves are left alone.
    pub fn toggle(&mut self, handle: NodeHandle) -> ConsoleResult<ExpandState> {
        let state = self.node_mut(handle)?.expand;
        match state {
            ExpandState::Leaf => Ok(ExpandState::Leaf),
            ExpandState::Collapsed => {
                self.open(handle);
                Ok(ExpandState::Fetching)
            }
            ExpandState::Fetching | ExpandState::Expanded => {
                self.clear_children(handle)?;
                let node = self.node_mut(handle)?;
                node.expand = ExpandState::Collapsed;
                let key = node.key();
                self.tracker.remove_expanded_node(&key);
                Ok(ExpandState::Collapsed)
            }
        }
    }

    fn open(&mut self, handle: NodeHandle) {
        let Some(node) = self.nodes.get_mut(&handle) else {
            return;
        };
        node.expand = ExpandState::Fetching;
        let key = node.key();
        let effect = Effect::FetchChildren {
            node: handle,
            entity_id: node.entity_id.clone(),
            resource_id: node.resource_id.clone(),
        };
        self.tracker.add_expanded_node(key);
        self.push_effect(effect);
    }

    /// Render fetched children below a node that is waiting for them. A
    /// response for a node that is no longer fetching is stale and dropped.
    pub fn attach_children(
        &mut self,
        handle: NodeHandle,
        children: &[Entity],
    ) -> ConsoleResult<Vec<Rendered>> {
        let node = self.node_mut(handle)?;
        if node.expand != ExpandState::Fetching {
            warn!(node = %handle, entity = %node.entity_id, state = ?node.expand, "discarding stale children");
            return Ok(Vec::new());
        }
        let parent_id = node.entity_id.clone();
        let resource_id = node.resource_id.clone();

        let mut rendered = Vec::with_capacity(children.len());
        for child in children {
            // A child that arrives with its subtree is drawn whole, like `render_tree`.
            let inline = !child.children.is_empty();
            let has_children = child.has_typed_children() && !inline;
            let at = Placement::under(handle, &parent_id, resource_id.as_deref());
            let result = self.dispatch(child, at, true, has_children);
            if inline {
                self.render_tree_under(child, Some(result.handle()), resource_id.as_deref());
            }
            rendered.push(result);
        }

        let node = self.node_mut(handle)?;
        node.expand = ExpandState::Expanded;
        if !children.is_empty() {
            node.delete = Affordance::Disabled;
        }
        Ok(rendered)
    }

    /// Children could not be loaded: fall back to collapsed and stop tracking
    /// the node as open.
    pub fn cancel_fetch(&mut self, handle: NodeHandle) -> ConsoleResult<()> {
        let node = self.node_mut(handle)?;
        if node.expand != ExpandState::Fetching {
            return Ok(());
        }
        node.expand = ExpandState::Collapsed;
        let key = node.key();
        self.tracker.remove_expanded_node(&key);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Uploads
    // ---------------------------------------------------------------------

    fn stage_upload(&mut self, handle: NodeHandle, entity: &Entity) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.upload = UploadState::Pending;
            self.push_effect(Effect::Upload {
                node: handle,
                entity: entity.clone(),
            });
        }
    }

    /// Promote a staged node once its upload confirmed, or remove it and
    /// hand the failure back.
    pub fn settle_upload(
        &mut self,
        handle: NodeHandle,
        outcome: ConsoleResult<()>,
    ) -> ConsoleResult<()> {
        match outcome {
            Ok(()) => {
                self.node_mut(handle)?.upload = UploadState::Committed;
                Ok(())
            }
            Err(e) => {
                warn!(node = %handle, error = %e, "upload failed, removing node");
                if self.node(handle).is_some() {
                    self.remove_node(handle)?;
                }
                Err(e)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Delete
    // ---------------------------------------------------------------------

    /// Confirmation text for deleting a node, or `None` while its delete
    /// affordance is disabled.
    pub fn delete_prompt(&self, handle: NodeHandle) -> ConsoleResult<Option<String>> {
        let node = self.node(handle).ok_or(ConsoleError::UnknownNode(handle))?;
        if !node.delete.is_enabled() {
            return Ok(None);
        }
        Ok(Some(format!(
            "Delete {} '{}' [{}]?",
            node.type_name.to_lowercase(),
            node.display_name(),
            node.entity_id
        )))
    }

    /// Drop every node showing a deleted entity and its expansion keys.
    /// Returns the number of nodes removed.
    pub fn forget_entity(&mut self, entity_id: &str) -> usize {
        let mut removed = 0;
        for handle in self.find_by_entity(entity_id) {
            if self.node(handle).is_some() {
                if let Ok(ids) = self.remove_node(handle) {
                    removed += ids.len();
                }
            }
        }
        let keys = self.tracker.forget_entity(entity_id);
        info!(entity = entity_id, nodes = removed, keys, "entity removed from tree");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ExpansionKey, ExpansionTracker};
    use serde_json::json;

    fn entity(value: serde_json::Value) -> Entity {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn flat_strategies_return_node() {
        for ty in ["Resource", "Component", "Content", "User", "Image", "File"] {
            let mut view = TreeView::default();
            let rendered = view.render(&entity(json!({"id": "x", "type": ty})), None, None, false, false);
            assert!(rendered.flat_node().is_some(), "{} should render flat", ty);
            assert_eq!(view.len(), 1);
        }
    }

    #[test]
    fn collection_strategies_return_handled() {
        for ty in ["Folder", "Group", "Element", "Something"] {
            let mut view = TreeView::default();
            let rendered = view.render(&entity(json!({"id": "x", "type": ty})), None, None, false, false);
            assert!(rendered.flat_node().is_none(), "{} should be handled", ty);
        }
    }

    #[test]
    fn folder_files_only_take_literal_files() {
        let mut view = TreeView::default();
        let folder = entity(json!({
            "id": "n1", "type": "Folder",
            "files": [{"id": "f1", "type": "File"}, {"id": "i1", "type": "Image"}]
        }));
        let handle = view.render(&folder, None, None, false, false).handle();

        let node = view.node(handle).unwrap();
        assert_eq!(node.children.len(), 1);
        assert_eq!(view.node(node.children[0]).unwrap().entity_id, "f1");
        assert_eq!(node.delete, Affordance::Disabled);
    }

    #[test]
    fn group_renders_users_below() {
        let mut view = TreeView::default();
        let group = entity(json!({
            "id": "g1", "type": "Group",
            "users": [{"id": "u1", "type": "User", "name": "ann"}, {"id": "u2", "type": "User"}]
        }));
        let handle = view.render(&group, None, None, false, false).handle();
        let node = view.node(handle).unwrap();
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.delete, Affordance::Disabled);
        assert_eq!(view.node(node.children[0]).unwrap().parent_id.as_deref(), Some("g1"));
    }

    #[test]
    fn element_children_filtered_by_type() {
        let mut view = TreeView::default();
        let div = entity(json!({
            "id": "e1", "type": "Element",
            "elements": [
                {"id": "e2", "type": "Element"},
                {"id": "c1", "type": "Content"},
                {"id": "u1", "type": "User"}
            ]
        }));
        let handle = view.render(&div, None, None, false, false).handle();
        let children: Vec<_> = view.node(handle).unwrap().children.iter()
            .map(|h| view.node(*h).unwrap().entity_id.clone())
            .collect();
        assert_eq!(children, vec!["e2", "c1"]);
    }

    #[test]
    fn top_level_files_are_staged_for_upload() {
        let mut view = TreeView::default();
        let handle = view
            .render(&entity(json!({"id": "f1", "type": "File"})), None, None, false, false)
            .handle();

        assert_eq!(view.node(handle).unwrap().upload, UploadState::Pending);
        assert!(matches!(view.pending_effects(), [Effect::Upload { node, .. }] if *node == handle));

        view.settle_upload(handle, Ok(())).unwrap();
        assert_eq!(view.node(handle).unwrap().upload, UploadState::Committed);
    }

    #[test]
    fn failed_upload_removes_node() {
        let mut view = TreeView::default();
        let handle = view
            .render(&entity(json!({"id": "i1", "type": "Image"})), None, None, false, false)
            .handle();
        let err = view.settle_upload(
            handle,
            Err(ConsoleError::Upload { entity_id: "i1".into(), reason: "quota".into() }),
        );
        assert!(err.is_err());
        assert!(view.node(handle).is_none());
        assert!(view.roots().is_empty());
    }

    #[test]
    fn replace_existing_swaps_node() {
        let mut view = TreeView::default();
        let page = entity(json!({"id": "p1", "type": "Content", "name": "old"}));
        view.render(&page, None, None, false, false);
        let renamed = entity(json!({"id": "p1", "type": "Content", "name": "new"}));
        let handle = view.render(&renamed, None, None, true, false).handle();

        assert_eq!(view.len(), 1);
        assert_eq!(view.node(handle).unwrap().display_name(), "new");
    }

    #[test]
    fn toggle_tracks_expansion() {
        let mut view = TreeView::default();
        let handle = view
            .render(&entity(json!({"id": "c1", "type": "Component"})), None, Some("r1"), false, true)
            .handle();
        let key = ExpansionKey::new("c1", None, Some("r1"));

        assert_eq!(view.toggle(handle).unwrap(), ExpandState::Fetching);
        assert!(view.tracker().is_expanded(&key));
        assert!(matches!(view.take_effects().as_slice(), [Effect::FetchChildren { entity_id, .. }] if entity_id == "c1"));

        view.attach_children(handle, &[entity(json!({"id": "x1", "type": "Content"}))]).unwrap();
        assert_eq!(view.node(handle).unwrap().expand, ExpandState::Expanded);
        assert_eq!(view.node(handle).unwrap().children.len(), 1);

        assert_eq!(view.toggle(handle).unwrap(), ExpandState::Collapsed);
        assert!(!view.tracker().is_expanded(&key));
        assert!(view.node(handle).unwrap().children.is_empty());
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn fetched_subtrees_are_drawn_whole() {
        let mut view = TreeView::default();
        let handle = view
            .render(&entity(json!({"id": "c1", "type": "Component"})), None, None, false, true)
            .handle();
        view.toggle(handle).unwrap();

        view.attach_children(
            handle,
            &[entity(json!({"id": "e1", "type": "Element", "children": [
                {"id": "t1", "type": "Content", "children": [{"id": "t2", "type": "Content"}]}
            ]}))],
        )
        .unwrap();

        let ids: Vec<_> = view.walk().iter().map(|(d, n)| (*d, n.entity_id.clone())).collect();
        assert_eq!(
            ids,
            vec![
                (0, "c1".to_string()),
                (1, "e1".to_string()),
                (2, "t1".to_string()),
                (3, "t2".to_string()),
            ]
        );
        let e1 = view.find("e1", Some("c1"), None).unwrap();
        assert_eq!(view.node(e1).unwrap().expand, ExpandState::Leaf);
    }

    #[test]
    fn tracked_node_opens_on_render() {
        let mut tracker = ExpansionTracker::new();
        tracker.add_expanded_node(ExpansionKey::new("c1", None, Some("r1")));
        let mut view = TreeView::new(tracker);

        let handle = view
            .render(&entity(json!({"id": "c1", "type": "Component"})), None, Some("r1"), false, true)
            .handle();
        assert_eq!(view.node(handle).unwrap().expand, ExpandState::Fetching);
        assert_eq!(view.take_effects().len(), 1);
    }

    #[test]
    fn stale_children_are_dropped() {
        let mut view = TreeView::default();
        let handle = view
            .render(&entity(json!({"id": "c1", "type": "Component"})), None, None, false, true)
            .handle();
        view.toggle(handle).unwrap();
        view.toggle(handle).unwrap();

        let rendered = view
            .attach_children(handle, &[entity(json!({"id": "x1", "type": "Content"}))])
            .unwrap();
        assert!(rendered.is_empty());
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn delete_prompt_respects_affordance() {
        let mut view = TreeView::default();
        let leaf = view
            .render(&entity(json!({"id": "c1", "type": "Content", "name": "Intro"})), None, None, false, false)
            .handle();
        let folder = view
            .render(&entity(json!({"id": "d1", "type": "Folder", "folders": [{"id": "d2", "type": "Folder"}]})), None, None, false, false)
            .handle();

        assert_eq!(
            view.delete_prompt(leaf).unwrap().as_deref(),
            Some("Delete content 'Intro' [c1]?")
        );
        assert_eq!(view.delete_prompt(folder).unwrap(), None);
    }

    #[test]
    fn render_tree_walks_children() {
        let mut view = TreeView::default();
        let root = entity(json!({
            "id": "r1", "type": "Resource",
            "children": [
                {"id": "e1", "type": "Element", "children": [
                    {"id": "c1", "type": "Content"}
                ]},
                {"id": "d1", "type": "Folder", "files": [{"id": "f1", "type": "File"}]}
            ]
        }));
        let root_handle = view.render(&root, None, None, false, false).handle();
        view.render_tree(&root, Some("r1"));

        let ids: Vec<_> = view.walk().iter().map(|(depth, n)| (*depth, n.entity_id.clone())).collect();
        assert_eq!(
            ids,
            vec![
                (0, "r1".to_string()),
                (1, "e1".to_string()),
                (2, "c1".to_string()),
                (1, "d1".to_string()),
                (2, "f1".to_string()),
            ]
        );
        assert_eq!(view.node(root_handle).unwrap().delete, Affordance::Disabled);
        // no uploads on the tree walk
        assert!(view.pending_effects().is_empty());
    }
}
