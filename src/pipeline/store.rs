// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Result store
//!
//! Holds the most recent output of every step that has run on a pipeline
//! instance. Values are shared (`Arc`) so a skipped run-once step keeps the
//! exact same value across runs.

use std::ops::Index;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::{PipelineError, PipelineResult};

/// Per-pipeline table of step name to last computed value
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    results: IndexMap<String, Arc<Value>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored value for `name`, or [`PipelineError::MissingResult`]
    pub fn get(&self, name: &str) -> PipelineResult<&Value> {
        self.shared(name).map(|v| v.as_ref())
    }

    /// Shared handle to the stored value
    pub fn shared(&self, name: &str) -> PipelineResult<&Arc<Value>> {
        self.results
            .get(name)
            .ok_or_else(|| PipelineError::MissingResult {
                name: name.to_string(),
            })
    }

    /// Record view of an object-shaped result
    pub fn record(&self, name: &str) -> PipelineResult<Record<'_>> {
        let (key, value) = self
            .results
            .get_key_value(name)
            .ok_or_else(|| PipelineError::MissingResult {
                name: name.to_string(),
            })?;
        Record::new(key, value)
    }

    /// Store or overwrite the value for `name`
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Arc<Value> {
        let value = Arc::new(value);
        self.results.insert(name.into(), Arc::clone(&value));
        value
    }

    pub fn contains(&self, name: &str) -> bool {
        self.results.contains_key(name)
    }

    /// Drop the stored value for `name`, so a run-once step runs again
    pub fn forget(&mut self, name: &str) -> Option<Arc<Value>> {
        self.results.shift_remove(name)
    }

    /// Drop every stored value
    pub fn clear(&mut self) {
        self.results.clear();
    }

    /// Names with a stored value, in order of first computation
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Field-by-field view over an object-shaped value.
///
/// `record["key"]` follows `serde_json` indexing and yields `Null` for a
/// missing key; [`Record::field`] fails instead.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    name: &'a str,
    fields: &'a Map<String, Value>,
}

impl<'a> Record<'a> {
    /// View `value` as a record; fails with [`PipelineError::NotARecord`]
    /// for anything that is not a JSON object
    pub fn new(name: &'a str, value: &'a Value) -> PipelineResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { name, fields }),
            _ => Err(PipelineError::NotARecord {
                name: name.to_string(),
            }),
        }
    }

    /// Name of the step (or input) this record came from
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Checked field access
    pub fn field(&self, key: &str) -> PipelineResult<&'a Value> {
        self.fields
            .get(key)
            .ok_or_else(|| PipelineError::MissingField {
                record: self.name.to_string(),
                field: key.to_string(),
            })
    }

    /// Deserialize a field into a concrete type
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> PipelineResult<T> {
        let value = self.field(key)?;
        T::deserialize(value).map_err(|e| PipelineError::InvalidField {
            record: self.name.to_string(),
            field: key.to_string(),
            message: e.to_string(),
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &'a Map<String, Value> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Index<&str> for Record<'_> {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(key).unwrap_or(&NULL)
    }
}
