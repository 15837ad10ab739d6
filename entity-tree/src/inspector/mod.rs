//! Property inspector
//!
//! Tabbed view of one entity's attributes and relationships:
//!
//! - one tab per view (`all`, `in`, `out`, and `html` for everything that is
//!   not a content node), each filled lazily by its own fetch
//! - one table per fetched record, one row per key
//! - edits commit per field when the field loses focus
//!
//! Opening always starts a fresh session with a new generation number. Fetch
//! results carry the generation they were issued for and are dropped when it
//! no longer matches, so a slow response cannot land in a newer session.

pub mod access;
pub mod format;

pub use access::{AccessControlPanel, VisibilitySwitch};
pub use format::{commit_value, format_key, format_value, RenderedValue};

use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::{ConsoleError, ConsoleResult};
use crate::model::{Entity, EntityType, Record};
use crate::tree::Effect;

/// Key prefix of rendering attributes in the `html` view
pub const HTML_KEY_PREFIX: &str = "_html_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewName {
    All,
    In,
    Out,
    Html,
}

impl ViewName {
    /// Views offered for an entity type
    pub fn for_type(entity_type: EntityType) -> &'static [ViewName] {
        match entity_type {
            EntityType::Content => &[ViewName::All, ViewName::In, ViewName::Out],
            _ => &[ViewName::All, ViewName::In, ViewName::Out, ViewName::Html],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::In => "in",
            Self::Out => "out",
            Self::Html => "html",
        }
    }

    /// Path segment appended to the entity URL
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::In => "in",
            Self::Out => "out",
            Self::Html => HTML_KEY_PREFIX,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "Node",
            Self::In => "Incoming",
            Self::Out => "Outgoing",
            Self::Html => "HTML",
        }
    }

    fn key_label(&self, key: &str) -> String {
        match self {
            Self::Html => key.replacen(HTML_KEY_PREFIX, "", 1),
            Self::In | Self::Out => key.to_string(),
            Self::All => format_key(key),
        }
    }
}

impl FromStr for ViewName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            "html" | "_html_" => Ok(Self::Html),
            _ => Err(format!(
                "Unknown view '{}'. Valid options: all, in, out, html",
                s
            )),
        }
    }
}

impl std::fmt::Display for ViewName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRow {
    pub key: String,
    /// Key as displayed for this view
    pub label: String,
    pub value: RenderedValue,
    pub editable: bool,
    /// Field currently focused
    pub active: bool,
    /// Draft differs from what was fetched
    pub changed: bool,
    raw: Value,
}

impl PropertyRow {
    fn new(view: ViewName, key: &str, raw: &Value) -> Self {
        let value = format_value(key, raw);
        Self {
            key: key.to_string(),
            label: view.key_label(key),
            editable: value.is_editable(),
            value,
            active: false,
            changed: false,
            raw: raw.clone(),
        }
    }

    /// Value as fetched
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Rows of one fetched record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    pub record_id: String,
    pub rows: Vec<PropertyRow>,
}

impl RecordTable {
    fn from_record(view: ViewName, record: &Record) -> Self {
        let record_id = match record.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self {
            record_id,
            rows: record
                .iter()
                .map(|(key, raw)| PropertyRow::new(view, key, raw))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TabState {
    Loading,
    Loaded(Vec<RecordTable>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewTab {
    pub view: ViewName,
    pub label: &'static str,
    pub header_active: bool,
    pub body_visible: bool,
    pub state: TabState,
}

/// Addresses one row in the open inspector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub view: ViewName,
    pub record_id: String,
    pub key: String,
}

impl FieldRef {
    pub fn new(view: ViewName, record_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            view,
            record_id: record_id.into(),
            key: key.into(),
        }
    }
}

/// A view fetch to issue for an inspector session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub entity_id: String,
    pub view: ViewName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectorSession {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub generation: u64,
    pub tabs: Vec<ViewTab>,
}

impl InspectorSession {
    pub fn title(&self) -> String {
        format!("Edit Properties of {}", self.entity_id)
    }

    pub fn tab(&self, view: ViewName) -> Option<&ViewTab> {
        self.tabs.iter().find(|t| t.view == view)
    }

    pub fn active_view(&self) -> Option<ViewName> {
        self.tabs.iter().find(|t| t.body_visible).map(|t| t.view)
    }

    fn row_mut(&mut self, field: &FieldRef) -> ConsoleResult<&mut PropertyRow> {
        let tab = self
            .tabs
            .iter_mut()
            .find(|t| t.view == field.view)
            .ok_or_else(|| ConsoleError::NotFound(format!("view {}", field.view)))?;
        let TabState::Loaded(tables) = &mut tab.state else {
            return Err(ConsoleError::NotFound(format!("view {} not loaded", field.view)));
        };
        tables
            .iter_mut()
            .filter(|t| t.record_id == field.record_id)
            .flat_map(|t| t.rows.iter_mut())
            .find(|r| r.key == field.key)
            .ok_or_else(|| {
                ConsoleError::NotFound(format!(
                    "field {} of record '{}' in view {}",
                    field.key, field.record_id, field.view
                ))
            })
    }
}

/// The single inspector of a console session
#[derive(Debug, Default)]
pub struct PropertyInspector {
    session: Option<InspectorSession>,
    generation: u64,
}

impl PropertyInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&InspectorSession> {
        self.session.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Open (or reopen) the inspector for an entity. Prior content is
    /// discarded; only the `all` tab is visible. Returns one fetch per view.
    pub fn open(&mut self, entity: &Entity) -> Vec<FetchRequest> {
        self.generation += 1;
        let generation = self.generation;
        let views = ViewName::for_type(entity.entity_type());

        let tabs = views
            .iter()
            .map(|view| ViewTab {
                view: *view,
                label: view.label(),
                header_active: *view == ViewName::All,
                body_visible: *view == ViewName::All,
                state: TabState::Loading,
            })
            .collect();

        self.session = Some(InspectorSession {
            entity_id: entity.id.clone(),
            entity_type: entity.entity_type(),
            generation,
            tabs,
        });
        debug!(entity = %entity.id, generation, "inspector opened");

        views
            .iter()
            .map(|view| FetchRequest {
                generation,
                entity_id: entity.id.clone(),
                view: *view,
            })
            .collect()
    }

    /// Close the inspector. Responses still in flight become stale.
    pub fn close(&mut self) {
        self.session = None;
        self.generation += 1;
    }

    /// Fill a tab from a fetch result. Returns false when the result belongs
    /// to an older session and was dropped.
    pub fn apply_fetch(
        &mut self,
        generation: u64,
        view: ViewName,
        result: ConsoleResult<Vec<Record>>,
    ) -> bool {
        let Some(session) = self.session.as_mut().filter(|s| s.generation == generation) else {
            warn!(generation, current = self.generation, %view, "dropping stale inspector response");
            return false;
        };
        let Some(tab) = session.tabs.iter_mut().find(|t| t.view == view) else {
            return false;
        };
        tab.state = match result {
            Ok(records) => TabState::Loaded(
                records
                    .iter()
                    .map(|record| RecordTable::from_record(view, record))
                    .collect(),
            ),
            Err(e) => {
                warn!(entity = %session.entity_id, %view, error = %e, "inspector fetch failed");
                TabState::Failed(e.to_string())
            }
        };
        true
    }

    /// Show exactly one tab
    pub fn select_tab(&mut self, view: ViewName) -> ConsoleResult<()> {
        let session = self.open_session()?;
        if session.tab(view).is_none() {
            return Err(ConsoleError::NotFound(format!("view {}", view)));
        }
        for tab in &mut session.tabs {
            tab.body_visible = false;
            tab.header_active = false;
        }
        for tab in session.tabs.iter_mut().filter(|t| t.view == view) {
            tab.body_visible = true;
            tab.header_active = true;
        }
        Ok(())
    }

    pub fn focus_field(&mut self, field: &FieldRef) -> ConsoleResult<()> {
        self.open_session()?.row_mut(field)?.active = true;
        Ok(())
    }

    /// Replace the draft text of an input row
    pub fn edit_field(&mut self, field: &FieldRef, text: &str) -> ConsoleResult<()> {
        let row = self.open_session()?.row_mut(field)?;
        if let RenderedValue::Input(draft) = &mut row.value {
            if draft != text {
                *draft = text.to_string();
                row.changed = true;
            }
        }
        Ok(())
    }

    /// Field lost focus: clear the active marker and commit the current value,
    /// changed or not.
    pub fn blur_field(&mut self, field: &FieldRef) -> ConsoleResult<Vec<Effect>> {
        let session = self.open_session()?;
        let entity_id = session.entity_id.clone();
        let row = session.row_mut(field)?;
        row.active = false;

        let value = match &row.value {
            RenderedValue::Input(text) => commit_value(&row.raw, text),
            RenderedValue::Switch(on) => Value::Bool(*on),
            RenderedValue::Text(_) => return Ok(Vec::new()),
        };

        let mut effects = vec![Effect::SetProperty {
            entity_id,
            key: row.key.clone(),
            value,
        }];
        if std::mem::take(&mut row.changed) {
            effects.push(Effect::ReloadPreviews);
        }
        Ok(effects)
    }

    /// Flip a boolean row and commit it
    pub fn toggle_switch(&mut self, field: &FieldRef) -> ConsoleResult<Vec<Effect>> {
        let session = self.open_session()?;
        let entity_id = session.entity_id.clone();
        let row = session.row_mut(field)?;
        let RenderedValue::Switch(on) = &mut row.value else {
            return Ok(Vec::new());
        };
        *on = !*on;
        Ok(vec![
            Effect::SetProperty {
                entity_id,
                key: row.key.clone(),
                value: Value::Bool(*on),
            },
            Effect::ReloadPreviews,
        ])
    }

    fn open_session(&mut self) -> ConsoleResult<&mut InspectorSession> {
        self.session
            .as_mut()
            .ok_or_else(|| ConsoleError::NotFound("inspector is closed".to_string()))
    }
}
