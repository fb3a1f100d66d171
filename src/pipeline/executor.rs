// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Pipeline executor
//!
//! Runs registered steps one at a time in resolved order. Each step gets
//! its dependency results, the configuration and the run parameters as
//! named inputs; its output is written back to the result store.
//!
//! A failing step stops the run and its error is returned unchanged.
//! Results stored by earlier steps stay in the store.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::errors::{PipelineError, PipelineResult};
use crate::pipeline::{Config, DependencyGraph, Inputs, Progress, ResultStore, Step, StepRegistry};

/// Options for a single run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Steps to skip when they already have a stored result
    pub run_once: HashSet<String>,
    /// Run-scoped values; override config options with the same name
    pub params: Config,
    /// Print per-step progress and timing
    pub verbose: bool,
    /// Indentation level of progress lines
    pub indent: usize,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_once<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_once.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.set(key, value);
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.params.merge(params);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

/// Timing of one executed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTiming {
    pub name: String,
    pub duration: Duration,
}

/// What a run did
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Resolved execution order
    pub order: Vec<String>,
    /// Steps that ran, in order
    pub executed: Vec<StepTiming>,
    /// Run-once steps skipped because they already had a result
    pub skipped: Vec<String>,
    /// Cumulative time spent in steps
    pub duration: Duration,
}

impl RunReport {
    pub fn was_executed(&self, name: &str) -> bool {
        self.executed.iter().any(|t| t.name == name)
    }

    pub fn was_skipped(&self, name: &str) -> bool {
        self.skipped.iter().any(|s| s == name)
    }

    /// Names of executed steps, in order
    pub fn executed_names(&self) -> Vec<&str> {
        self.executed.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Drives one run over a registry, configuration and result store
pub struct PipelineExecutor<'a> {
    registry: &'a StepRegistry,
    config: &'a Config,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(registry: &'a StepRegistry, config: &'a Config) -> Self {
        Self { registry, config }
    }

    /// Execute every step in resolved order
    pub fn execute(
        &self,
        results: &mut ResultStore,
        options: &RunOptions,
    ) -> PipelineResult<RunReport> {
        // Rebuilt on every run: steps may have been added since the last one
        let order = DependencyGraph::build(self.registry).resolve()?;

        let mut progress = Progress::new(options.verbose, options.indent);
        let mut report = RunReport {
            order: order.clone(),
            ..RunReport::default()
        };

        for name in &order {
            if options.run_once.contains(name) && results.contains(name) {
                tracing::info!(step = %name, "already run, skipping");
                progress.skip(name);
                report.skipped.push(name.clone());
                continue;
            }

            let step = self.step(name)?;

            progress.start(name);
            let start = Instant::now();

            let output = match self.execute_step(step.as_ref(), results, &options.params) {
                Ok(output) => output,
                Err(e) => {
                    progress.fail(name);
                    return Err(e);
                }
            };
            results.set(name.clone(), output);

            let elapsed = start.elapsed();
            progress.finish(name, elapsed);
            tracing::info!(
                step = %name,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "step completed"
            );
            report.executed.push(StepTiming {
                name: name.clone(),
                duration: elapsed,
            });
        }

        progress.done();
        report.duration = progress.total();
        Ok(report)
    }

    /// Look up a step named by the resolved order
    fn step(&self, name: &str) -> PipelineResult<&'a Arc<dyn Step>> {
        self.registry.get(name).ok_or_else(|| PipelineError::UnknownStep {
            name: name.to_string(),
        })
    }

    /// Gather inputs for a step and invoke it
    fn execute_step(
        &self,
        step: &dyn Step,
        results: &ResultStore,
        params: &Config,
    ) -> PipelineResult<Value> {
        let inputs = self.gather_inputs(step, results, params)?;

        step.invoke(&inputs).map_err(|e| {
            tracing::error!(step = step.name(), error = %e, "step failed");
            PipelineError::Step(e)
        })
    }

    /// Merge dependency results, config options and run parameters, in
    /// increasing priority
    fn gather_inputs(
        &self,
        step: &dyn Step,
        results: &ResultStore,
        params: &Config,
    ) -> PipelineResult<Inputs> {
        let mut inputs = Inputs::new(step.name());

        for dep in step.dependency_names() {
            if !self.registry.contains(dep) {
                continue;
            }
            if self.config.contains(dep) || params.contains(dep) {
                tracing::warn!(
                    step = step.name(),
                    dependency = %dep,
                    "dependency result is shadowed by a config option or run parameter"
                );
            }
            inputs.insert(dep.clone(), Arc::clone(results.shared(dep)?));
        }

        for (key, value) in self.config.iter().chain(params.iter()) {
            inputs.insert(key, Arc::new(value.clone()));
        }

        // Names that are not steps must come from config or run parameters
        if let Some(missing) = step
            .dependency_names()
            .iter()
            .find(|dep| !inputs.contains(dep))
        {
            return Err(PipelineError::MissingInput {
                step: step.name().to_string(),
                name: missing.clone(),
            });
        }

        Ok(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FnStep;
    use serde_json::json;
    use std::cell::Cell;
    use std::io::Write;
    use std::rc::Rc;
    use std::sync::Mutex;

    fn registry(steps: Vec<FnStep>) -> StepRegistry {
        let mut registry = StepRegistry::new();
        registry.register_many(steps).unwrap();
        registry
    }

    fn echo_inputs(name: &str, deps: &[&str]) -> FnStep {
        FnStep::new(name, deps, |inputs| {
            let map: serde_json::Map<String, Value> = inputs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            Ok(Value::Object(map))
        })
    }

    #[test]
    fn test_merge_priority_params_over_config_over_results() {
        let registry = registry(vec![
            FnStep::new("x", &[], |_| Ok(json!("from step"))),
            echo_inputs("probe", &["x"]),
        ]);
        let mut config = Config::new();
        config.set("x", "from config").set("y", "config only");

        let mut results = ResultStore::new();
        let options = RunOptions::new().param("y", "from params");
        PipelineExecutor::new(&registry, &config)
            .execute(&mut results, &options)
            .unwrap();

        let probe = results.record("probe").unwrap();
        assert_eq!(probe["x"], json!("from config"));
        assert_eq!(probe["y"], json!("from params"));
        assert_eq!(probe.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_external_dependency_from_params() {
        let registry = registry(vec![FnStep::new("scaled", &["factor"], |inputs| {
            Ok(json!(inputs.get("factor")?.as_i64().unwrap_or(0) * 3))
        })]);
        let config = Config::new();
        let mut results = ResultStore::new();

        let err = PipelineExecutor::new(&registry, &config)
            .execute(&mut results, &RunOptions::new())
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingInput { ref step, ref name } if step == "scaled" && name == "factor"
        ));

        PipelineExecutor::new(&registry, &config)
            .execute(&mut results, &RunOptions::new().param("factor", 2))
            .unwrap();
        assert_eq!(results.get("scaled").unwrap(), &json!(6));
    }

    #[test]
    fn test_step_error_passes_through_and_keeps_earlier_results() {
        #[derive(Debug, thiserror::Error)]
        #[error("bad data")]
        struct BadData;

        let registry = registry(vec![
            FnStep::new("first", &[], |_| Ok(json!(1))),
            FnStep::new("second", &["first"], |_| Err(BadData.into())),
            FnStep::new("third", &["second"], |_| Ok(json!(3))),
        ]);
        let config = Config::new();
        let mut results = ResultStore::new();

        let err = PipelineExecutor::new(&registry, &config)
            .execute(&mut results, &RunOptions::new())
            .unwrap_err();

        assert_eq!(err.to_string(), "bad data");
        assert!(err.step_error().unwrap().downcast_ref::<BadData>().is_some());
        assert!(results.contains("first"));
        assert!(!results.contains("second"));
        assert!(!results.contains("third"));
    }

    #[test]
    fn test_run_once_skips_only_stored_steps() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let registry = registry(vec![FnStep::new("slow", &[], move |_| {
            counter.set(counter.get() + 1);
            Ok(json!(counter.get()))
        })]);
        let config = Config::new();
        let mut results = ResultStore::new();
        let options = RunOptions::new().run_once(["slow"]);
        let executor = PipelineExecutor::new(&registry, &config);

        let first = executor.execute(&mut results, &options).unwrap();
        assert!(first.was_executed("slow"));

        let second = executor.execute(&mut results, &options).unwrap();
        assert!(second.was_skipped("slow"));
        assert_eq!(calls.get(), 1);

        results.forget("slow");
        executor.execute(&mut results, &options).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_cycle_fails_before_any_step_runs() {
        let registry = registry(vec![
            FnStep::new("a", &["b"], |_| Ok(json!(1))),
            FnStep::new("b", &["a"], |_| Ok(json!(2))),
        ]);
        let config = Config::new();
        let mut results = ResultStore::new();

        let err = PipelineExecutor::new(&registry, &config)
            .execute(&mut results, &RunOptions::new())
            .unwrap_err();
        assert!(matches!(err, PipelineError::CircularDependency { .. }));
        assert!(results.is_empty());
    }

    #[test]
    fn test_report_order_and_timings() {
        let registry = registry(vec![
            FnStep::new("b", &["a"], |_| Ok(json!(2))),
            FnStep::new("a", &[], |_| Ok(json!(1))),
        ]);
        let config = Config::new();
        let mut results = ResultStore::new();

        let report = PipelineExecutor::new(&registry, &config)
            .execute(&mut results, &RunOptions::new().verbose(true).indent(1))
            .unwrap();

        assert_eq!(report.order, vec!["a", "b"]);
        assert_eq!(report.executed_names(), vec!["a", "b"]);
        assert!(report.skipped.is_empty());
        let summed: Duration = report.executed.iter().map(|t| t.duration).sum();
        assert_eq!(report.duration, summed);
    }

    #[test]
    fn test_unregistered_step_is_an_error() {
        let registry = registry(vec![FnStep::new("a", &[], |_| Ok(json!(1)))]);
        let config = Config::new();
        let executor = PipelineExecutor::new(&registry, &config);

        assert_eq!(executor.step("a").unwrap().name(), "a");
        assert!(matches!(
            executor.step("ghost"),
            Err(PipelineError::UnknownStep { ref name }) if name == "ghost"
        ));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_shadowed_dependency_logs_a_warning() {
        let registry = registry(vec![
            FnStep::new("load", &[], |_| Ok(json!("from step"))),
            echo_inputs("report", &["load"]),
        ]);
        let mut config = Config::new();
        config.set("load", "from config");

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let mut results = ResultStore::new();
        tracing::subscriber::with_default(subscriber, || {
            PipelineExecutor::new(&registry, &config)
                .execute(&mut results, &RunOptions::new())
                .unwrap();
        });

        let text = logs.text();
        assert!(text.contains("WARN"), "{}", text);
        assert!(text.contains("dependency result is shadowed"), "{}", text);
        assert!(text.contains("step=\"report\""), "{}", text);
        assert_eq!(results.record("report").unwrap()["load"], json!("from config"));
    }

    #[test]
    fn test_unshadowed_run_logs_no_warning() {
        let registry = registry(vec![
            FnStep::new("load", &[], |_| Ok(json!(1))),
            echo_inputs("report", &["load"]),
        ]);
        let config = Config::new();

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let mut results = ResultStore::new();
        tracing::subscriber::with_default(subscriber, || {
            PipelineExecutor::new(&registry, &config)
                .execute(&mut results, &RunOptions::new())
                .unwrap();
        });

        assert!(!logs.text().contains("shadowed"));
    }
}
