//! Entity tree core for the content console
//!
//! Renders a graph of typed content entities as an expandable tree, keeps
//! track of which nodes are open, and drives the property inspector and the
//! inline rename editor. All visual state is headless; the transport is
//! reached through the traits in [`transport`].

pub mod config;
pub mod error;
pub mod inspector;
pub mod model;
pub mod session;
pub mod transport;
pub mod tree;

pub use config::ConsoleConfig;
pub use error::{ConsoleError, ConsoleResult};
pub use inspector::{FieldRef, PropertyInspector, ViewName};
pub use model::{Entity, EntityKind, EntityType, Record};
pub use session::{ConsoleSession, EffectReport};
pub use transport::{CommandSurface, ConfirmSurface, RecordSource, RestClient, UploadSurface};
pub use tree::{Effect, ExpandState, ExpansionKey, ExpansionTracker, NodeHandle, Rendered, TreeView};
