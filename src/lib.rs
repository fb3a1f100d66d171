// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! # nowpipes - dependency-driven analysis pipelines
//!
//! Declare analysis steps whose parameter names are the names of the steps
//! (or config options) they consume, register them with a [`Pipeline`], and
//! run them in dependency order. Results are kept on the pipeline between
//! runs.
//!
//! ## Quick Start
//!
//! ```
//! use nowpipes::{analysis, json, Pipeline, RunOptions};
//!
//! analysis!(fn data() {
//!     Ok(json!({"a": 10, "b": 20}))
//! });
//!
//! analysis!(fn scaled(data, factor) {
//!     Ok(json!(data["a"].as_i64().unwrap_or_default() * factor.as_i64().unwrap_or(1)))
//! });
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.add([scaled(), data()]).unwrap();
//! pipeline.config([("factor", 2)]);
//! pipeline.run().unwrap();
//! assert_eq!(pipeline.get_result("scaled").unwrap(), &json!(20));
//!
//! // Run parameters override config for one run; `data` is not recomputed
//! let options = RunOptions::new().param("factor", 3).run_once(["data"]);
//! let report = pipeline.run_with(&options).unwrap();
//! assert!(report.was_skipped("data"));
//! assert_eq!(pipeline.get_result("scaled").unwrap(), &json!(30));
//! ```
//!
//! From the command line, the bundled demo pipeline can be run, graphed and
//! validated:
//!
//! ```bash
//! nowpipes run --show multiply
//! nowpipes graph --format mermaid
//! nowpipes validate --config options.yaml
//! ```

pub mod cli;
pub mod demo;
pub mod errors;
pub mod pipeline;

// Re-export commonly used types
pub use errors::{PipelineError, PipelineResult, RecoverySuggestion};
pub use pipeline::{
    Component, Config, DependencyGraph, FnStep, Function, Inputs, Member, Namespace, Pipeline,
    Record, ResultStore, RunOptions, RunReport, Step, StepRegistry, ValidationResult,
};
pub use serde_json::{json, Value};

#[doc(hidden)]
pub mod __private {
    pub use anyhow;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
