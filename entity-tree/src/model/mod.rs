//! Entity model and fetched property records

pub mod entity;

pub use entity::{sort_by_name, Entity, EntityKind, EntityType};

/// One fetched record: an arbitrary string-keyed mapping, in server order
pub type Record = indexmap::IndexMap<String, serde_json::Value>;
