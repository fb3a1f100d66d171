// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Error types with actionable messages
//!
//! Every failure a pipeline can produce is a variant of [`PipelineError`].
//! Errors raised by step bodies are carried through unchanged in
//! [`PipelineError::Step`].

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for nowpipes operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Main error type for nowpipes
#[derive(Error, Debug, Diagnostic)]
pub enum PipelineError {
    // ─────────────────────────────────────────────────────────────────────────
    // Registration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Cannot register '{name}': {reason}")]
    #[diagnostic(code(nowpipes::registration))]
    Registration {
        name: String,
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Resolution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Circular dependency detected between: {}", steps.join(", "))]
    #[diagnostic(
        code(nowpipes::circular_dependency),
        help("Review the dependency names of these steps to remove the cycle")
    )]
    CircularDependency { steps: Vec<String> },

    #[error("Step '{name}' is in the execution order but not in the registry")]
    #[diagnostic(
        code(nowpipes::unknown_step),
        help("The execution order must be resolved from the registry being run")
    )]
    UnknownStep { name: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Result Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("No results found for step '{name}'")]
    #[diagnostic(
        code(nowpipes::missing_result),
        help("Have you defined or run the step '{name}'?")
    )]
    MissingResult { name: String },

    #[error("Step '{step}' needs '{name}', which is neither a step result, a config option nor a run parameter")]
    #[diagnostic(
        code(nowpipes::missing_input),
        help("Register a step named '{name}', set it with config(), or pass it as a run parameter")
    )]
    MissingInput { step: String, name: String },

    #[error("Result '{name}' is not a record")]
    #[diagnostic(
        code(nowpipes::not_a_record),
        help("Only steps returning a JSON object can be read field by field")
    )]
    NotARecord { name: String },

    #[error("Record '{record}' has no field '{field}'")]
    #[diagnostic(code(nowpipes::missing_field))]
    MissingField { record: String, field: String },

    #[error("Field '{field}' of '{record}' has an unexpected type: {message}")]
    #[diagnostic(code(nowpipes::invalid_field))]
    InvalidField {
        record: String,
        field: String,
        message: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Error returned by a step body, passed through as-is.
    #[error(transparent)]
    #[diagnostic(code(nowpipes::step_failed))]
    Step(anyhow::Error),

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read config file '{path}': {error}")]
    #[diagnostic(code(nowpipes::config_read))]
    ConfigRead { path: PathBuf, error: String },

    #[error("Unsupported config file format: {path}")]
    #[diagnostic(
        code(nowpipes::config_format),
        help("Supported formats: .yaml, .yml, .toml, .json")
    )]
    ConfigFormat { path: PathBuf },

    #[error("Invalid option '{option}': {reason}")]
    #[diagnostic(code(nowpipes::invalid_option))]
    InvalidOption {
        option: String,
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Parsing Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(nowpipes::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(nowpipes::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(nowpipes::toml_error))]
    Toml { message: String },
}

impl From<serde_yaml::Error> for PipelineError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for PipelineError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl PipelineError {
    /// Create a registration error for a plain function passed where a step was expected
    pub fn unmarked_function(name: &str) -> Self {
        Self::Registration {
            name: name.to_string(),
            reason: "it is a plain function, not a step".to_string(),
            help: Some(format!(
                "Declare it with analysis!(fn {}(...) {{ ... }}) or wrap it in FnStep::new",
                if name.is_empty() { "name" } else { name }
            )),
        }
    }

    /// Create a registration error for a step whose name cannot be used as a dependency name
    pub fn invalid_step_name(name: &str) -> Self {
        Self::Registration {
            name: name.to_string(),
            reason: "step names must be identifiers ([A-Za-z_][A-Za-z0-9_]*)".to_string(),
            help: Some("Dependents refer to steps by name, so the name must be usable as a parameter name".into()),
        }
    }

    /// The error returned by the failing step, if this is a step failure
    pub fn step_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Step(e) => Some(e),
            _ => None,
        }
    }

    /// Whether this error came from a step body rather than from the pipeline itself
    pub fn is_step_failure(&self) -> bool {
        matches!(self, Self::Step(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_result_message_names_the_step() {
        let err = PipelineError::MissingResult {
            name: "multiply".into(),
        };
        assert_eq!(err.to_string(), "No results found for step 'multiply'");

        let help = err.help().map(|h| h.to_string()).unwrap();
        assert!(help.contains("defined or run"));
        assert!(help.contains("multiply"));
    }

    #[test]
    fn test_step_error_is_transparent() {
        let err = PipelineError::Step(anyhow::anyhow!("division by zero"));
        assert_eq!(err.to_string(), "division by zero");
        assert!(err.is_step_failure());
        assert_eq!(err.step_error().unwrap().to_string(), "division by zero");
    }

    #[test]
    fn test_cycle_lists_steps() {
        let err = PipelineError::CircularDependency {
            steps: vec!["a".into(), "b".into()],
        };
        assert!(err.to_string().contains("a, b"));
    }
}
