//! Headless visual nodes
//!
//! A [`VisualNode`] is what a front end draws for one entity: its label, the
//! delete and expand affordances, and upload staging. Front ends read these
//! fields; only [`super::TreeView`] mutates them.

use super::expansion::ExpansionKey;
use super::rename::RenameSession;
use crate::model::EntityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub(crate) u64);

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether an action button responds to clicks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Affordance {
    #[default]
    Enabled,
    Disabled,
}

impl Affordance {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// State of a node's lazily fetched child list. The expand icon is derived
/// from this, never the other way round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpandState {
    /// No expand affordance
    #[default]
    Leaf,
    Collapsed,
    /// Children requested, response outstanding
    Fetching,
    Expanded,
}

impl ExpandState {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Leaf => " ",
            Self::Collapsed => "▸",
            Self::Fetching => "◐",
            Self::Expanded => "▾",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Fetching | Self::Expanded)
    }
}

/// Upload staging for file and image nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    NotRequired,
    /// Shown, but the backing upload has not confirmed yet
    Pending,
    Committed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NameLabel {
    Label(String),
    Editing(RenameSession),
}

impl NameLabel {
    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualNode {
    pub handle: NodeHandle,
    pub entity_id: String,
    pub entity_type: EntityType,
    /// Wire type string (differs from `entity_type` for unknown types)
    pub type_name: String,
    pub parent: Option<NodeHandle>,
    pub parent_id: Option<String>,
    pub resource_id: Option<String>,
    pub children: Vec<NodeHandle>,
    pub delete: Affordance,
    pub expand: ExpandState,
    pub name: NameLabel,
    pub upload: UploadState,
    /// Generic click handling (selection) is off while the name is edited
    pub click_suspended: bool,
    pub buttons_visible: bool,
}

impl VisualNode {
    pub fn key(&self) -> ExpansionKey {
        ExpansionKey::new(
            self.entity_id.clone(),
            self.parent_id.as_deref(),
            self.resource_id.as_deref(),
        )
    }

    /// Text shown for the name, whether or not it is being edited
    pub fn display_name(&self) -> &str {
        match &self.name {
            NameLabel::Label(name) => name,
            NameLabel::Editing(session) => session.buffer(),
        }
    }
}
