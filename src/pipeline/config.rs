// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Pipeline configuration
//!
//! A flat, insertion-ordered map of option name to JSON value. Updates merge
//! key by key. Options can be loaded from YAML, TOML or JSON files.

use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::{PipelineError, PipelineResult};

/// Configuration options shared by every step invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    options: IndexMap<String, Value>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a `.yaml`/`.yml`, `.toml` or `.json` file
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::ConfigRead {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let parsed = match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            _ => {
                return Err(PipelineError::ConfigFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        parsed.map_err(|e| PipelineError::ConfigRead {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse options from a YAML mapping
    pub fn from_yaml(yaml: &str) -> PipelineResult<Self> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse options from a TOML table
    pub fn from_toml(toml: &str) -> PipelineResult<Self> {
        let value: Value = toml::from_str(toml)?;
        Self::from_value(value)
    }

    /// Parse options from a JSON object
    pub fn from_json(json: &str) -> PipelineResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    fn from_value(value: Value) -> PipelineResult<Self> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            // An empty YAML document
            Value::Null => Ok(Self::new()),
            other => Err(PipelineError::InvalidOption {
                option: "<root>".into(),
                reason: format!("expected a table of options, found {}", type_name(&other)),
                help: Some("Write options as top-level key/value pairs".into()),
            }),
        }
    }

    /// Parse a `key=value` assignment; the value is read as JSON and falls
    /// back to a plain string
    pub fn parse_assignment(assignment: &str) -> PipelineResult<(String, Value)> {
        let (key, raw) = assignment
            .split_once('=')
            .ok_or_else(|| PipelineError::InvalidOption {
                option: assignment.to_string(),
                reason: "expected KEY=VALUE".into(),
                help: Some("For example: --set threshold=0.5".into()),
            })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(PipelineError::InvalidOption {
                option: assignment.to_string(),
                reason: "option name is empty".into(),
                help: None,
            });
        }

        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok((key.to_string(), value))
    }

    /// Set a single option
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Merge options over the current ones, key by key
    pub fn merge<I, K, V>(&mut self, options: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in options {
            self.options.insert(key.into(), value.into());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Config {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = Self::new();
        config.merge(iter);
        config
    }
}

impl<'a> IntoIterator for &'a Config {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.iter()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a table",
    }
}
