//! Console commands

pub mod config;
pub mod delete;
pub mod expansion;
pub mod inspect;
pub mod rename;
pub mod set;
pub mod tree;

use anyhow::{Context, Result};
use entity_tree::transport::CommandSurface;
use entity_tree::{EffectReport, Entity};
use serde_json::{json, Value};

use super::OutputFormatter;

/// Build an entity from what the server reports for `id`. An explicit type
/// wins over the server's.
pub async fn resolve_entity(
    commands: &dyn CommandSurface,
    id: &str,
    type_override: Option<&str>,
) -> Result<Entity> {
    let (type_name, name) = tokio::join!(
        commands.get_property(id, "type"),
        commands.get_property(id, "name"),
    );
    let type_name = match type_override {
        Some(t) => Value::from(t),
        None => type_name.with_context(|| format!("Failed to read type of {}", id))?,
    };
    let name = name.unwrap_or(Value::Null);

    let entity = serde_json::from_value(json!({
        "id": id,
        "type": type_name.as_str().unwrap_or_default(),
        "name": name.as_str().unwrap_or_default(),
    }))?;
    Ok(entity)
}

/// Print the failures collected while running effects
pub fn report_failures(formatter: &OutputFormatter, report: &EffectReport) {
    for failure in &report.failures {
        formatter.warning(&failure.to_string());
    }
}
