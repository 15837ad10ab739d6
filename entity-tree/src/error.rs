//! Error type shared by the tree, inspector, transport and session layers.

use thiserror::Error;

use crate::tree::NodeHandle;

/// Errors surfaced by the console core.
///
/// Disabled actions (deleting a node that still has children, editing a name
/// that is already being committed) are not errors; they resolve to `Ok` with
/// a "nothing happened" value.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unknown node handle: {0:?}")]
    UnknownNode(NodeHandle),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upload of {entity_id} failed: {reason}")]
    Upload { entity_id: String, reason: String },

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serde(String),
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

impl From<std::io::Error> for ConsoleError {
    fn from(e: std::io::Error) -> Self {
        ConsoleError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(e: serde_json::Error) -> Self {
        ConsoleError::Serde(e.to_string())
    }
}

impl From<toml::de::Error> for ConsoleError {
    fn from(e: toml::de::Error) -> Self {
        ConsoleError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ConsoleError::MalformedResponse(e.to_string())
        } else {
            ConsoleError::Transport(e.to_string())
        }
    }
}

impl From<url::ParseError> for ConsoleError {
    fn from(e: url::ParseError) -> Self {
        ConsoleError::Config(format!("invalid URL: {}", e))
    }
}
