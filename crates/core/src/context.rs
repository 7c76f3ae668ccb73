//! Task Context
//!
//! The accumulating string → value mapping handed to each tool invocation.
//! A context starts from caller-supplied data and gains a
//! `"<task_id>_result"` entry for every completed dependency.
//!
//! Contexts are owned by a single execution run. The executor clones the
//! running context per task, so a tool can never observe or mutate another
//! task's view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Suffix appended to a task id to form its result key.
pub const RESULT_KEY_SUFFIX: &str = "_result";

/// Build the context key under which a task's result is exposed.
pub fn result_key(task_id: &str) -> String {
    format!("{}{}", task_id, RESULT_KEY_SUFFIX)
}

/// String-keyed context passed to capability providers.
///
/// Backed by a `BTreeMap` so serialization (e.g. embedding the context in a
/// planning prompt) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskContext {
    values: BTreeMap<String, Value>,
}

impl TaskContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a raw value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Look up a value as a string slice. Non-string values return `None`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Record a dependency result under `"<task_id>_result"`.
    pub fn insert_result(&mut self, task_id: &str, result: impl Into<String>) {
        self.values
            .insert(result_key(task_id), Value::String(result.into()));
    }

    /// Iterate over all dependency results (`(task_id, result)` pairs).
    pub fn dependency_results(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().filter_map(|(key, value)| {
            let task_id = key.strip_suffix(RESULT_KEY_SUFFIX)?;
            Some((task_id, value.as_str()?))
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the context is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Serialize the context as a compact JSON object.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(&self.values).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<BTreeMap<String, Value>> for TaskContext {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, Value)> for TaskContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
