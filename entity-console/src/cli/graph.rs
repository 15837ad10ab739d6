//! Offline entity graph loaded from a JSON file
//!
//! Serves children out of the graph so `tree --file` can expand nodes without
//! a server. Mutations are refused.

use async_trait::async_trait;
use entity_tree::transport::{CommandSurface, RecordSource};
use entity_tree::{ConsoleError, ConsoleResult, Entity, Record, ViewName};
use serde_json::Value;
use std::path::Path;

pub struct GraphSurface {
    roots: Vec<Entity>,
}

impl GraphSurface {
    /// Read a file holding one entity or an array of entities
    pub fn load(path: &Path) -> ConsoleResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ConsoleResult<Self> {
        let roots = match serde_json::from_str::<Value>(content)? {
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<Entity>, _>>()?,
            single => vec![serde_json::from_value(single)?],
        };
        Ok(Self { roots })
    }

    pub fn roots(&self) -> &[Entity] {
        &self.roots
    }

    pub fn roots_mut(&mut self) -> &mut Vec<Entity> {
        &mut self.roots
    }

    fn find(&self, id: &str) -> Option<&Entity> {
        self.roots.iter().find_map(|root| root.find(id))
    }

    fn read_only() -> ConsoleError {
        ConsoleError::Transport("the file graph is read-only".to_string())
    }
}

#[async_trait]
impl CommandSurface for GraphSurface {
    async fn children(&self, id: &str, _resource_id: Option<&str>) -> ConsoleResult<Vec<Entity>> {
        self.find(id)
            .map(|e| e.children.clone())
            .ok_or_else(|| ConsoleError::NotFound(format!("entity {}", id)))
    }

    async fn delete_node(&self, _id: &str) -> ConsoleResult<bool> {
        Err(Self::read_only())
    }

    async fn set_property(&self, _id: &str, _key: &str, _value: &Value) -> ConsoleResult<()> {
        Err(Self::read_only())
    }

    async fn get_property(&self, id: &str, key: &str) -> ConsoleResult<Value> {
        let entity = self
            .find(id)
            .ok_or_else(|| ConsoleError::NotFound(format!("entity {}", id)))?;
        let wire = serde_json::to_value(entity)?;
        Ok(wire.get(key).cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl RecordSource for GraphSurface {
    async fn fetch_view(
        &self,
        id: &str,
        view: ViewName,
        _page_size: usize,
    ) -> ConsoleResult<Vec<Record>> {
        if view != ViewName::All {
            return Ok(Vec::new());
        }
        let entity = self
            .find(id)
            .ok_or_else(|| ConsoleError::NotFound(format!("entity {}", id)))?;
        match serde_json::to_value(entity)? {
            Value::Object(map) => Ok(vec![map
                .into_iter()
                .filter(|(_, v)| !v.is_array())
                .collect()]),
            _ => Ok(Vec::new()),
        }
    }
}
