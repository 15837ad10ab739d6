//! Configuration for the console core
//!
//! Loaded from a TOML file with environment overrides for the server root
//! and session token.

pub mod types;

pub use types::*;
