// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Pipeline validation
//!
//! Checks a registry and configuration before running.

use crate::pipeline::{Config, DependencyGraph, StepRegistry};

/// Pipeline validator
pub struct PipelineValidator;

impl PipelineValidator {
    /// Validate registered steps against the current configuration
    pub fn validate(registry: &StepRegistry, config: &Config) -> ValidationResult {
        let mut result = ValidationResult::new();

        if registry.is_empty() {
            result.add_warning("Pipeline has no steps registered");
            return result;
        }

        let graph = DependencyGraph::build(registry);

        for cycle in graph.find_cycles() {
            let mut path = cycle.clone();
            path.push(cycle[0].clone());
            result.add_error(&format!("Circular dependency: {}", path.join(" → ")));
        }

        for step in registry.iter() {
            let name = step.name();

            for input in graph.external_inputs(name).unwrap_or_default() {
                if !config.contains(input) {
                    result.add_warning(&format!(
                        "Step '{}': '{}' is not a step or config option and must be passed as a run parameter",
                        name, input
                    ));
                }
            }

            for dep in graph.dependencies(name).unwrap_or_default() {
                if config.contains(&dep) {
                    result.add_warning(&format!(
                        "Step '{}': config option '{}' shadows the result of step '{}'",
                        name, dep, dep
                    ));
                }
            }
        }

        result
    }
}

/// Result of pipeline validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
