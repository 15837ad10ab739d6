//! Console session
//!
//! Ties one [`TreeView`] and the [`PropertyInspector`] to the transport. Tree
//! and inspector operations are synchronous and only queue [`Effect`]s; the
//! session is where those effects meet the network. Each public operation
//! runs the effects it caused before returning.

use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ConsoleError, ConsoleResult};
use crate::inspector::{AccessControlPanel, FieldRef, PropertyInspector};
use crate::model::Entity;
use crate::transport::{
    AcceptingUploader, CommandSurface, ConfirmSurface, RecordSource, UploadSurface,
};
use crate::tree::{Effect, ExpandState, ExpansionTracker, NodeHandle, Rendered, TreeView};

/// Guard against fetch loops when every fetched level auto-expands again
const MAX_EFFECT_ROUNDS: usize = 64;

const DEFAULT_PAGE_SIZE: usize = 10;

/// What a batch of effects did
#[derive(Debug, Default)]
pub struct EffectReport {
    pub children_attached: usize,
    pub uploads_committed: usize,
    pub properties_set: usize,
    pub previews_reloaded: usize,
    /// Failures are reported here, never swallowed
    pub failures: Vec<ConsoleError>,
}

impl EffectReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: EffectReport) {
        self.children_attached += other.children_attached;
        self.uploads_committed += other.uploads_committed;
        self.properties_set += other.properties_set;
        self.previews_reloaded += other.previews_reloaded;
        self.failures.extend(other.failures);
    }
}

pub struct ConsoleSession {
    view: TreeView,
    inspector: PropertyInspector,
    commands: Arc<dyn CommandSurface>,
    records: Arc<dyn RecordSource>,
    uploads: Arc<dyn UploadSurface>,
    confirm: Arc<dyn ConfirmSurface>,
    page_size: usize,
    tracker_file: Option<PathBuf>,
}

impl ConsoleSession {
    pub fn new(
        commands: Arc<dyn CommandSurface>,
        records: Arc<dyn RecordSource>,
        confirm: Arc<dyn ConfirmSurface>,
    ) -> Self {
        Self {
            view: TreeView::default(),
            inspector: PropertyInspector::new(),
            commands,
            records,
            uploads: Arc::new(AcceptingUploader),
            confirm,
            page_size: DEFAULT_PAGE_SIZE,
            tracker_file: None,
        }
    }

    pub fn with_uploads(mut self, uploads: Arc<dyn UploadSurface>) -> Self {
        self.uploads = uploads;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_tracker(mut self, tracker: ExpansionTracker) -> Self {
        self.view = TreeView::new(tracker);
        self
    }

    /// Load the expansion tracker from `path` and save it back there after
    /// every change.
    pub fn with_tracker_file(mut self, path: impl Into<PathBuf>) -> ConsoleResult<Self> {
        let path = path.into();
        self.view = TreeView::new(ExpansionTracker::load(&path)?);
        self.tracker_file = Some(path);
        Ok(self)
    }

    pub fn view(&self) -> &TreeView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut TreeView {
        &mut self.view
    }

    pub fn inspector(&self) -> &PropertyInspector {
        &self.inspector
    }

    pub fn inspector_mut(&mut self) -> &mut PropertyInspector {
        &mut self.inspector
    }

    // ---------------------------------------------------------------------
    // Tree
    // ---------------------------------------------------------------------

    /// Render one entity and run whatever it queued (uploads, eager fetches
    /// of nodes that were left open).
    pub async fn render(
        &mut self,
        entity: &Entity,
        parent_id: Option<&str>,
        resource_id: Option<&str>,
        replace_existing: bool,
        has_children: bool,
    ) -> (Rendered, EffectReport) {
        let rendered = self
            .view
            .render(entity, parent_id, resource_id, replace_existing, has_children);
        let report = self.run_effects().await;
        (rendered, report)
    }

    /// Render a graph that is already laid out as a tree. Its children are
    /// drawn inline, so a root with tree-form children is a leaf and never
    /// fetches.
    pub async fn render_tree(&mut self, root: &Entity) -> (Rendered, EffectReport) {
        let has_children = root.has_typed_children() && root.children.is_empty();
        let rendered = self.view.render(root, None, None, false, has_children);
        let resource_id = self
            .view
            .node(rendered.handle())
            .and_then(|n| n.resource_id.clone());
        self.view.render_tree(root, resource_id.as_deref());
        let report = self.run_effects().await;
        (rendered, report)
    }

    /// Expand or collapse a node, loading children when it opens
    pub async fn toggle(&mut self, handle: NodeHandle) -> ConsoleResult<(ExpandState, EffectReport)> {
        self.view.toggle(handle)?;
        let mut report = self.run_effects().await;
        if let Err(e) = self.persist_tracker() {
            report.failures.push(e);
        }
        let state = self
            .view
            .node(handle)
            .map(|n| n.expand)
            .ok_or(ConsoleError::UnknownNode(handle))?;
        Ok((state, report))
    }

    /// Drain the view's outbox until no more effects are queued. The tracker
    /// is saved whenever the effects changed it.
    pub async fn run_effects(&mut self) -> EffectReport {
        let before = self.view.tracker().clone();
        let mut report = self.drain_effects().await;
        if *self.view.tracker() != before {
            if let Err(e) = self.persist_tracker() {
                report.failures.push(e);
            }
        }
        report
    }

    async fn drain_effects(&mut self) -> EffectReport {
        let mut report = EffectReport::default();
        for _ in 0..MAX_EFFECT_ROUNDS {
            let effects = self.view.take_effects();
            if effects.is_empty() {
                return report;
            }
            let round = self.apply_effects(effects).await;
            report.merge(round);
        }
        warn!(rounds = MAX_EFFECT_ROUNDS, "effects still pending, giving up");
        report
    }

    async fn apply_effects(&mut self, effects: Vec<Effect>) -> EffectReport {
        let mut report = EffectReport::default();
        let mut fetches = Vec::new();
        let mut staged = Vec::new();

        for effect in effects {
            match effect {
                Effect::FetchChildren {
                    node,
                    entity_id,
                    resource_id,
                } => fetches.push((node, entity_id, resource_id)),
                Effect::Upload { node, entity } => staged.push((node, entity)),
                Effect::SetProperty {
                    entity_id,
                    key,
                    value,
                } => match self.commands.set_property(&entity_id, &key, &value).await {
                    Ok(()) => report.properties_set += 1,
                    Err(e) => {
                        warn!(entity = %entity_id, key = %key, error = %e, "set property failed");
                        report.failures.push(e);
                    }
                },
                Effect::ReloadPreviews => {
                    debug!("previews reloaded");
                    report.previews_reloaded += 1;
                }
            }
        }

        for outcome in self.settle_uploads(staged).await {
            match outcome {
                Ok(()) => report.uploads_committed += 1,
                Err(e) => report.failures.push(e),
            }
        }

        let results = join_all(fetches.into_iter().map(|(node, entity_id, resource_id)| {
            let commands = Arc::clone(&self.commands);
            async move {
                let result = commands.children(&entity_id, resource_id.as_deref()).await;
                (node, entity_id, result)
            }
        }))
        .await;

        for (node, entity_id, result) in results {
            if self.view.node(node).is_none() {
                debug!(%node, entity = %entity_id, "node gone before its children arrived");
                continue;
            }
            match result {
                Ok(children) => match self.view.attach_children(node, &children) {
                    Ok(rendered) => report.children_attached += rendered.len(),
                    Err(e) => report.failures.push(e),
                },
                Err(e) => {
                    warn!(entity = %entity_id, error = %e, "children fetch failed");
                    if let Err(e) = self.view.cancel_fetch(node) {
                        report.failures.push(e);
                    }
                    report.failures.push(e);
                }
            }
        }
        report
    }

    /// Upload every staged node concurrently, then promote or remove each
    /// one according to its own outcome.
    pub async fn settle_uploads(
        &mut self,
        staged: Vec<(NodeHandle, Entity)>,
    ) -> Vec<ConsoleResult<()>> {
        let outcomes = join_all(staged.iter().map(|(_, entity)| self.uploads.upload(entity))).await;

        staged
            .into_iter()
            .zip(outcomes)
            .map(|((node, entity), outcome)| {
                let outcome = outcome.map_err(|e| match e {
                    ConsoleError::Upload { .. } => e,
                    other => ConsoleError::Upload {
                        entity_id: entity.id.clone(),
                        reason: other.to_string(),
                    },
                });
                self.view.settle_upload(node, outcome)
            })
            .collect()
    }

    // ---------------------------------------------------------------------
    // Rename
    // ---------------------------------------------------------------------

    /// Run the whole rename lifecycle for a node: open the editor, type the
    /// new name and press Enter.
    pub async fn rename(
        &mut self,
        handle: NodeHandle,
        new_name: &str,
    ) -> ConsoleResult<(Option<String>, EffectReport)> {
        self.view.make_name_editable(handle)?;
        self.view.edit_name(handle, new_name)?;
        let committed = self
            .view
            .name_key_press(handle, crate::tree::EditKey::Enter)?;
        Ok((committed, self.run_effects().await))
    }

    /// Commit an open name editor because it lost focus
    pub async fn name_blur(
        &mut self,
        handle: NodeHandle,
    ) -> ConsoleResult<(Option<String>, EffectReport)> {
        let committed = self.view.name_blur(handle)?;
        Ok((committed, self.run_effects().await))
    }

    // ---------------------------------------------------------------------
    // Delete
    // ---------------------------------------------------------------------

    /// Delete the entity behind a node after confirmation. Returns false
    /// when the affordance is disabled, the user declined or the server had
    /// nothing to delete.
    pub async fn delete(&mut self, handle: NodeHandle) -> ConsoleResult<bool> {
        let Some(prompt) = self.view.delete_prompt(handle)? else {
            debug!(node = %handle, "delete disabled");
            return Ok(false);
        };
        if !self.confirm.confirm(&prompt) {
            return Ok(false);
        }

        let entity_id = self
            .view
            .node(handle)
            .map(|n| n.entity_id.clone())
            .ok_or(ConsoleError::UnknownNode(handle))?;
        if !self.commands.delete_node(&entity_id).await? {
            warn!(entity = %entity_id, "server reported nothing to delete");
            return Ok(false);
        }

        info!(entity = %entity_id, "entity deleted");
        self.view.forget_entity(&entity_id);
        self.persist_tracker()?;
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Inspector
    // ---------------------------------------------------------------------

    /// Open the inspector and load every view. Results are applied as they
    /// complete, in no particular order.
    pub async fn open_inspector(&mut self, entity: &Entity) -> usize {
        let requests = self.inspector.open(entity);
        let page_size = self.page_size;

        let mut pending: FuturesUnordered<_> = requests
            .into_iter()
            .map(|request| {
                let records = Arc::clone(&self.records);
                async move {
                    let result = records
                        .fetch_view(&request.entity_id, request.view, page_size)
                        .await;
                    (request.generation, request.view, result)
                }
            })
            .collect();

        let mut applied = 0;
        while let Some((generation, view, result)) = pending.next().await {
            if self.inspector.apply_fetch(generation, view, result) {
                applied += 1;
            }
        }
        applied
    }

    pub fn close_inspector(&mut self) {
        self.inspector.close();
    }

    /// Field lost focus: commit it
    pub async fn blur_field(&mut self, field: &FieldRef) -> ConsoleResult<EffectReport> {
        let effects = self.inspector.blur_field(field)?;
        Ok(self.apply_effects(effects).await)
    }

    pub async fn toggle_switch(&mut self, field: &FieldRef) -> ConsoleResult<EffectReport> {
        let effects = self.inspector.toggle_switch(field)?;
        Ok(self.apply_effects(effects).await)
    }

    /// Set one property directly
    pub async fn set_property(&self, id: &str, key: &str, value: &Value) -> ConsoleResult<()> {
        self.commands.set_property(id, key, value).await?;
        info!(entity = id, key, "property set");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Access control
    // ---------------------------------------------------------------------

    pub async fn access_panel(&self, entity_id: &str) -> ConsoleResult<AccessControlPanel> {
        let mut panel = AccessControlPanel::new(entity_id);
        let keys: Vec<_> = AccessControlPanel::property_keys().collect();
        let values = join_all(
            keys.iter()
                .map(|key| self.commands.get_property(entity_id, key)),
        )
        .await;
        for (key, value) in keys.into_iter().zip(values) {
            panel.apply_property(key, &value?);
        }
        Ok(panel)
    }

    pub async fn click_access_switch(
        &mut self,
        panel: &mut AccessControlPanel,
        key: &str,
    ) -> ConsoleResult<EffectReport> {
        let effect = panel.click(key)?;
        Ok(self.apply_effects(vec![effect]).await)
    }

    // ---------------------------------------------------------------------
    // Expansion persistence
    // ---------------------------------------------------------------------

    pub fn persist_tracker(&self) -> ConsoleResult<()> {
        match &self.tracker_file {
            Some(path) => self.view.tracker().save(path),
            None => Ok(()),
        }
    }
}
