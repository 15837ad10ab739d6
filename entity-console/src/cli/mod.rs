//! Entity console CLI
//!
//! # Commands
//!
//! - `tree` - render an entity graph from a file or the server
//! - `inspect` - property inspector tabs for one entity
//! - `rename` / `set` / `delete` - entity mutations
//! - `expansion` - persisted expansion state
//! - `config` - configuration (show, validate, init)

pub mod commands;
pub mod context;
pub mod graph;
pub mod output;

pub use context::CliContext;
pub use output::{OutputFormat, OutputFormatter};
