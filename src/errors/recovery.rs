// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

use super::PipelineError;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Suggest fixing a circular dependency
    pub fn fix_circular_dependency(steps: &[String]) -> Self {
        Self {
            action: "Remove circular dependency".into(),
            steps: vec![
                format!("Steps stuck in the cycle: {}", steps.join(" → ")),
                "A step cannot depend, directly or transitively, on itself".into(),
                "Rename a parameter or move shared work into a new step".into(),
            ],
            commands: vec![
                "# Visualize the dependency graph:".into(),
                "nowpipes graph --format mermaid".into(),
            ],
        }
    }

    /// Suggest supplying a missing input
    pub fn supply_input(step: &str, name: &str) -> Self {
        Self {
            action: format!("Provide '{}'", name),
            steps: vec![
                format!("Step '{}' declares '{}' as an input", step, name),
                format!("No step named '{}' is registered", name),
                "Set it as a config option or pass it as a run parameter".into(),
            ],
            commands: vec![
                format!("nowpipes run --set {}=<value>", name),
                format!("nowpipes run --param {}=<value>", name),
            ],
        }
    }

    /// Suggest running the pipeline before reading a result
    pub fn run_first(name: &str) -> Self {
        Self {
            action: format!("Run the pipeline before reading '{}'", name),
            steps: vec![
                format!("Check that a step named '{}' is registered", name),
                "Results only exist after the step has run at least once".into(),
            ],
            commands: vec![format!("nowpipes run --show {}", name)],
        }
    }

    /// Pick a suggestion for an error, if one applies
    pub fn for_error(error: &PipelineError) -> Option<Self> {
        match error {
            PipelineError::CircularDependency { steps } => {
                Some(Self::fix_circular_dependency(steps))
            }
            PipelineError::MissingInput { step, name } => Some(Self::supply_input(step, name)),
            PipelineError::MissingResult { name } => Some(Self::run_first(name)),
            _ => None,
        }
    }

    /// Format as a human-readable string
    pub fn format(&self) -> String {
        let mut out = format!("{}\n", self.action);

        for (i, step) in self.steps.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, step));
        }

        if !self.commands.is_empty() {
            out.push('\n');
            for cmd in &self.commands {
                out.push_str(&format!("  {}\n", cmd));
            }
        }

        out
    }
}
