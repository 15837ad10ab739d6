//! Interfaces to the server and the user
//!
//! The tree and inspector never talk to these directly. The session drains
//! their queued effects against whichever implementations it was built with:
//! [`rest::RestClient`] in production, in-memory fakes in tests.

pub mod rest;

pub use rest::RestClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ConsoleResult;
use crate::inspector::ViewName;
use crate::model::{Entity, Record};

/// Entity commands
#[async_trait]
pub trait CommandSurface: Send + Sync {
    /// Children of an entity, as seen below `resource_id`
    async fn children(&self, id: &str, resource_id: Option<&str>) -> ConsoleResult<Vec<Entity>>;

    /// Returns false when the server had nothing to delete
    async fn delete_node(&self, id: &str) -> ConsoleResult<bool>;

    async fn set_property(&self, id: &str, key: &str, value: &Value) -> ConsoleResult<()>;

    /// `Value::Null` when the entity has no such property
    async fn get_property(&self, id: &str, key: &str) -> ConsoleResult<Value>;
}

/// Per-view attribute sets for the inspector
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_view(
        &self,
        id: &str,
        view: ViewName,
        page_size: usize,
    ) -> ConsoleResult<Vec<Record>>;
}

/// Backing storage for file and image entities
#[async_trait]
pub trait UploadSurface: Send + Sync {
    async fn upload(&self, entity: &Entity) -> ConsoleResult<()>;
}

/// Modal yes/no prompt shown before destructive actions
pub trait ConfirmSurface: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Upload surface for front ends that do not carry file content; every
/// upload is accepted as soon as it is staged.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptingUploader;

#[async_trait]
impl UploadSurface for AcceptingUploader {
    async fn upload(&self, entity: &Entity) -> ConsoleResult<()> {
        tracing::debug!(entity = %entity.id, "upload accepted without content");
        Ok(())
    }
}

/// Answers every prompt with a fixed decision
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl ConfirmSurface for FixedAnswer {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
