// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Named inputs handed to a step invocation

use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{PipelineError, PipelineResult};
use crate::pipeline::Record;

/// Dependency results, config options and run parameters for one step call.
///
/// Later insertions under an existing name replace the value but keep the
/// name's original position.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    step: String,
    values: IndexMap<String, Arc<Value>>,
}

impl Inputs {
    /// Empty inputs for the named step
    pub fn new(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            values: IndexMap::new(),
        }
    }

    /// Builder-style insert, handy when invoking a step by hand
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, Arc::new(value.into()));
        self
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: Arc<Value>) {
        self.values.insert(name.into(), value);
    }

    /// Name of the step these inputs belong to
    pub fn step(&self) -> &str {
        &self.step
    }

    /// Look up an input, failing with [`PipelineError::MissingInput`]
    pub fn get(&self, name: &str) -> PipelineResult<&Value> {
        self.value(name).ok_or_else(|| PipelineError::MissingInput {
            step: self.step.clone(),
            name: name.to_string(),
        })
    }

    /// Look up an input without failing
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name).map(|v| v.as_ref())
    }

    /// Deserialize an input into a concrete type
    pub fn parse<T: DeserializeOwned>(&self, name: &str) -> PipelineResult<T> {
        let value = self.get(name)?;
        T::deserialize(value).map_err(|e| PipelineError::InvalidField {
            record: self.step.clone(),
            field: name.to_string(),
            message: e.to_string(),
        })
    }

    /// View an object-shaped input as a [`Record`]
    pub fn record(&self, name: &str) -> PipelineResult<Record<'_>> {
        let (key, value) = self
            .values
            .get_key_value(name)
            .ok_or_else(|| PipelineError::MissingInput {
                step: self.step.clone(),
                name: name.to_string(),
            })?;
        Record::new(key, value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Input names in merge order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
