//! The shared field store backing all commands.
//!
//! A single [`FieldStore`] lives for the lifetime of the process. It is owned
//! by the service and passed by reference into each handler invocation, so
//! there is exactly one mutator at a time and no ambient global state.

use serde_json::Value;
use std::collections::HashMap;

/// Process-wide mapping from field name to an arbitrary JSON value.
///
/// By convention callers populate `array` (a sequence of numbers) via `run`
/// scripts and read back a computed aggregate from `result`, but the store
/// places no schema on field names or values: one value per name, mutated in
/// place, no rollback on partially failed scripts.
#[derive(Debug, Default)]
pub struct FieldStore {
    fields: HashMap<String, Value>,
}

impl FieldStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a field, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Write a field, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Whether a field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields currently stored.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the store holds no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
