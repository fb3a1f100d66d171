// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Pipeline core
//!
//! Step declaration, registration, dependency resolution, execution and the
//! result store behind [`Pipeline`].

mod config;
mod dag;
mod executor;
mod inputs;
mod instance;
mod progress;
mod registry;
mod step;
mod store;
mod validation;

pub use config::Config;
pub use dag::DependencyGraph;
pub use executor::{PipelineExecutor, RunOptions, RunReport, StepTiming};
pub use inputs::Inputs;
pub use instance::Pipeline;
pub use progress::Progress;
pub use registry::StepRegistry;
pub use step::{Component, FnStep, Function, Member, Namespace, Step};
pub use store::{Record, ResultStore};
pub use validation::{PipelineValidator, ValidationResult};
