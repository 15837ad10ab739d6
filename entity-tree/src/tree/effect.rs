use serde_json::Value;

use super::NodeHandle;
use crate::model::Entity;

/// Side effects requested by tree operations.
///
/// Rendering, toggling and renaming never do I/O themselves; they queue
/// effects on the view and the session drains them against the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Load the children of an expanded node
    FetchChildren {
        node: NodeHandle,
        entity_id: String,
        resource_id: Option<String>,
    },
    /// Upload the backing file of a staged file/image node
    Upload { node: NodeHandle, entity: Entity },
    SetProperty {
        entity_id: String,
        key: String,
        value: Value,
    },
    /// Refresh page previews that depend on edited entities
    ReloadPreviews,
}
