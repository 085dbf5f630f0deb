//! Fieldstore – a line-oriented JSON command processor
//!
//! This crate implements a small request/response dispatcher with:
//! - One JSON request per line on stdin, one JSON response per line on stderr
//! - A closed command set (`run`, `get`, `quit`) resolved by static dispatch
//! - A process-lifetime field store shared by all commands
//! - An embedded s-expression script language for `run`, bound only to the
//!   field store (never the host environment)
//! - Per-line error containment: no failure short of process crash escapes
//!   one request into the next

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Script language for the `run` command: AST, parser, evaluator.
pub mod script;
/// NDJSON request loop, command dispatch, and response envelopes.
pub mod service;
/// The shared mutable field store.
pub mod store;

// Re-export key types for convenience
pub use service::{SENTINEL_TOKEN, Service};
pub use store::FieldStore;

/// Current version of the fieldstore crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
