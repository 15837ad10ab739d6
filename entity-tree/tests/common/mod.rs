#![allow(dead_code)]

use async_trait::async_trait;
use entity_tree::transport::{CommandSurface, ConfirmSurface, RecordSource, UploadSurface};
use entity_tree::{ConsoleError, ConsoleResult, Entity, Record, ViewName};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub fn entity(value: Value) -> Entity {
    serde_json::from_value(value).unwrap()
}

pub fn record(value: Value) -> Record {
    serde_json::from_value(value).unwrap()
}

/// In-memory server: children and view records by entity id, every mutation
/// recorded.
#[derive(Default)]
pub struct FakeServer {
    pub children: HashMap<String, Vec<Entity>>,
    pub views: HashMap<(String, ViewName), Vec<Record>>,
    pub properties: HashMap<(String, String), Value>,
    /// Views answered only after this delay
    pub slow_views: HashMap<ViewName, Duration>,
    pub failing_children: Vec<String>,
    pub sets: Mutex<Vec<(String, String, Value)>>,
    pub deletes: Mutex<Vec<String>>,
    pub children_calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeServer {
    pub fn with_children(mut self, id: &str, children: Vec<Entity>) -> Self {
        self.children.insert(id.to_string(), children);
        self
    }

    pub fn with_view(mut self, id: &str, view: ViewName, records: Vec<Record>) -> Self {
        self.views.insert((id.to_string(), view), records);
        self
    }

    pub fn sets(&self) -> Vec<(String, String, Value)> {
        self.sets.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandSurface for FakeServer {
    async fn children(&self, id: &str, resource_id: Option<&str>) -> ConsoleResult<Vec<Entity>> {
        self.children_calls
            .lock()
            .unwrap()
            .push((id.to_string(), resource_id.map(str::to_string)));
        if self.failing_children.iter().any(|f| f == id) {
            return Err(ConsoleError::Transport("connection reset".to_string()));
        }
        Ok(self.children.get(id).cloned().unwrap_or_default())
    }

    async fn delete_node(&self, id: &str) -> ConsoleResult<bool> {
        self.deletes.lock().unwrap().push(id.to_string());
        Ok(true)
    }

    async fn set_property(&self, id: &str, key: &str, value: &Value) -> ConsoleResult<()> {
        self.sets
            .lock()
            .unwrap()
            .push((id.to_string(), key.to_string(), value.clone()));
        Ok(())
    }

    async fn get_property(&self, id: &str, key: &str) -> ConsoleResult<Value> {
        Ok(self
            .properties
            .get(&(id.to_string(), key.to_string()))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

#[async_trait]
impl RecordSource for FakeServer {
    async fn fetch_view(
        &self,
        id: &str,
        view: ViewName,
        _page_size: usize,
    ) -> ConsoleResult<Vec<Record>> {
        if let Some(delay) = self.slow_views.get(&view) {
            tokio::time::sleep(*delay).await;
        }
        self.views
            .get(&(id.to_string(), view))
            .cloned()
            .ok_or_else(|| ConsoleError::Status {
                status: 404,
                url: format!("/{}/{}", id, view.path_segment()),
            })
    }
}

/// Rejects uploads of the listed entity ids
pub struct SelectiveUploader {
    pub reject: Vec<String>,
}

#[async_trait]
impl UploadSurface for SelectiveUploader {
    async fn upload(&self, entity: &Entity) -> ConsoleResult<()> {
        if self.reject.contains(&entity.id) {
            Err(ConsoleError::Transport("quota exceeded".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Confirmation that records every prompt it was shown
pub struct RecordingConfirm {
    pub answer: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingConfirm {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ConfirmSurface for RecordingConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}
