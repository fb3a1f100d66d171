// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! The pipeline instance
//!
//! Owns one registry, one configuration and one result store. Results
//! accumulate across runs on the same instance.
//!
//! `run` takes `&mut self`; sharing an instance between threads needs
//! external synchronization.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::PipelineResult;
use crate::pipeline::{
    Component, Config, DependencyGraph, PipelineExecutor, PipelineValidator, Record,
    ResultStore, RunOptions, RunReport, Step, StepRegistry, ValidationResult,
};

/// A dependency-driven pipeline of named steps
#[derive(Debug, Default)]
pub struct Pipeline {
    registry: StepRegistry,
    config: Config,
    results: ResultStore,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Register steps and namespaces; see [`StepRegistry::register_many`]
    pub fn add<I, C>(&mut self, components: I) -> PipelineResult<usize>
    where
        I: IntoIterator<Item = C>,
        C: Into<Component>,
    {
        self.registry.register_many(components)
    }

    /// Register a single step
    pub fn add_step(&mut self, step: impl Step + 'static) -> PipelineResult<()> {
        self.registry.register(Arc::new(step))
    }

    /// Merge options into the configuration
    pub fn config<I, K, V>(&mut self, options: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.config.merge(options);
        self
    }

    /// Merge options from a YAML, TOML or JSON file into the configuration
    pub fn config_from_file(&mut self, path: &Path) -> PipelineResult<&mut Self> {
        let loaded = Config::from_file(path)?;
        tracing::debug!(path = %path.display(), options = loaded.len(), "loaded config file");
        self.config.merge(loaded.iter().map(|(k, v)| (k, v.clone())));
        Ok(self)
    }

    /// Current configuration
    pub fn options(&self) -> &Config {
        &self.config
    }

    /// Run every step once, in dependency order
    pub fn run(&mut self) -> PipelineResult<RunReport> {
        self.run_with(&RunOptions::default())
    }

    /// Run with run-once names, run parameters and progress options
    pub fn run_with(&mut self, options: &RunOptions) -> PipelineResult<RunReport> {
        PipelineExecutor::new(&self.registry, &self.config).execute(&mut self.results, options)
    }

    /// Result of a step, or [`PipelineError::MissingResult`](crate::PipelineError::MissingResult)
    pub fn get_result(&self, name: &str) -> PipelineResult<&Value> {
        self.results.get(name)
    }

    /// Shared handle to a step's result
    pub fn shared_result(&self, name: &str) -> PipelineResult<Arc<Value>> {
        self.results.shared(name).map(Arc::clone)
    }

    /// Record view of an object-shaped result
    pub fn record(&self, name: &str) -> PipelineResult<Record<'_>> {
        self.results.record(name)
    }

    pub fn has_result(&self, name: &str) -> bool {
        self.results.contains(name)
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    /// Drop a stored result so the step runs again even if run-once
    pub fn forget(&mut self, name: &str) -> Option<Arc<Value>> {
        self.results.forget(name)
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Dependency graph of the currently registered steps
    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::build(&self.registry)
    }

    /// Order the next run would use
    pub fn execution_order(&self) -> PipelineResult<Vec<String>> {
        self.graph().resolve()
    }

    pub fn validate(&self) -> ValidationResult {
        PipelineValidator::validate(&self.registry, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;
    use crate::pipeline::{FnStep, Function, Namespace};
    use serde_json::json;

    crate::analysis!(fn data() {
        Ok(json!({"a": 10, "b": 20}))
    });

    crate::analysis!(fn analysis1(data) {
        Ok(json!(data["a"].as_i64().unwrap_or_default() + 10))
    });

    crate::analysis!(fn analysis2(data) {
        Ok(json!(data["a"].as_i64().unwrap_or_default() + 20))
    });

    crate::analysis!(fn multiply(analysis1, analysis2) {
        Ok(json!(analysis1.as_i64().unwrap_or_default() * analysis2.as_i64().unwrap_or_default()))
    });

    fn example() -> Pipeline {
        let mut pipeline = Pipeline::new();
        pipeline
            .add([multiply(), analysis2(), analysis1(), data()])
            .unwrap();
        pipeline
    }

    #[test]
    fn test_run_computes_all_results() {
        let mut pipeline = example();
        pipeline.run().unwrap();

        assert_eq!(pipeline.get_result("analysis1").unwrap(), &json!(20));
        assert_eq!(pipeline.get_result("analysis2").unwrap(), &json!(30));
        assert_eq!(pipeline.get_result("multiply").unwrap(), &json!(600));
        assert_eq!(pipeline.record("data").unwrap()["b"], json!(20));
    }

    #[test]
    fn test_missing_result_until_run() {
        let mut pipeline = example();
        assert!(matches!(
            pipeline.get_result("multiply"),
            Err(PipelineError::MissingResult { .. })
        ));
        assert!(matches!(
            pipeline.record("data"),
            Err(PipelineError::MissingResult { .. })
        ));

        pipeline.run().unwrap();
        assert!(pipeline.get_result("multiply").is_ok());
        assert!(matches!(
            pipeline.get_result("never_defined"),
            Err(PipelineError::MissingResult { .. })
        ));
    }

    #[test]
    fn test_steps_added_between_runs_are_picked_up() {
        let mut pipeline = Pipeline::new();
        pipeline.add([data()]).unwrap();
        pipeline.run().unwrap();

        pipeline.add([analysis1()]).unwrap();
        let report = pipeline.run().unwrap();

        assert_eq!(report.order, vec!["data", "analysis1"]);
        assert_eq!(pipeline.get_result("analysis1").unwrap(), &json!(20));
    }

    #[test]
    fn test_namespace_and_function_rules() {
        let ns = Namespace::new("module")
            .step(data())
            .function(Function::new("helper", |_| Ok(json!(null))));

        let mut pipeline = Pipeline::new();
        assert_eq!(pipeline.add([ns]).unwrap(), 1);

        let err = pipeline
            .add([Function::new("helper", |_| Ok(json!(null)))])
            .unwrap_err();
        assert!(matches!(err, PipelineError::Registration { .. }));
        assert_eq!(pipeline.registry().names().collect::<Vec<_>>(), vec!["data"]);
    }

    #[test]
    fn test_config_reaches_steps() {
        let mut pipeline = Pipeline::new();
        pipeline
            .add_step(FnStep::new("sum", &["x", "y"], |inputs| {
                let x = inputs.get("x")?.as_i64().unwrap_or_default();
                let y = inputs.get("y")?.as_i64().unwrap_or_default();
                Ok(json!(x + y))
            }))
            .unwrap();

        pipeline.config([("x", 1)]);
        pipeline.config([("y", 2)]);
        pipeline.run().unwrap();
        assert_eq!(pipeline.get_result("sum").unwrap(), &json!(3));

        pipeline.config([("x", 3)]);
        pipeline.run().unwrap();
        assert_eq!(pipeline.get_result("sum").unwrap(), &json!(5));
        assert_eq!(pipeline.options().get("y"), Some(&json!(2)));
    }

    #[test]
    fn test_forget_and_clear() {
        let mut pipeline = example();
        pipeline.run().unwrap();

        assert!(pipeline.forget("data").is_some());
        assert!(!pipeline.has_result("data"));
        assert!(pipeline.has_result("multiply"));

        pipeline.clear_results();
        assert!(pipeline.results().is_empty());
    }

    #[test]
    fn test_execution_order_follows_registration_order() {
        // analysis2 was registered before analysis1, and both become ready
        // in the same pass
        let pipeline = example();
        assert_eq!(
            pipeline.execution_order().unwrap(),
            vec!["data", "analysis2", "analysis1", "multiply"]
        );
    }
}
