// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Run command - execute the pipeline

use colored::Colorize;
use miette::Result;
use serde_json::{Map, Value};
use std::path::PathBuf;

use super::{load_config, report};
use crate::demo;
use crate::pipeline::{Config, RunOptions};

/// Run the pipeline
pub fn run(
    config: Option<PathBuf>,
    set: Vec<String>,
    params: Vec<String>,
    show: Vec<String>,
    verbose: bool,
) -> Result<()> {
    let mut pipeline = demo::pipeline().map_err(report)?;

    load_config(&mut pipeline, config)?;
    for assignment in &set {
        let (key, value) = Config::parse_assignment(assignment).map_err(report)?;
        pipeline.config([(key, value)]);
    }

    let mut options = RunOptions::new().verbose(verbose).indent(1);
    for assignment in &params {
        let (key, value) = Config::parse_assignment(assignment).map_err(report)?;
        options = options.param(key, value);
    }

    // Validate pipeline
    let validation = pipeline.validate();

    if !validation.is_valid() {
        eprintln!("{}", "Pipeline validation failed:".red().bold());
        for error in &validation.errors {
            eprintln!("  {} {}", "✗".red(), error);
        }
        return Err(miette::miette!("Pipeline configuration is invalid"));
    }

    if validation.has_warnings() && verbose {
        eprintln!("{}", "Pipeline warnings:".yellow().bold());
        for warning in &validation.warnings {
            eprintln!("  {} {}", "⚠".yellow(), warning);
        }
        eprintln!();
    }

    // Execute
    let result = pipeline.run_with(&options).map_err(report)?;

    if verbose {
        println!(
            "{} {} step(s) run, {} skipped",
            "Summary:".bold(),
            result.executed.len(),
            result.skipped.len()
        );
    }

    if show.is_empty() {
        return Ok(());
    }

    // Print requested results
    let mut shown = Map::new();
    for name in show {
        let value = pipeline.get_result(&name).map_err(report)?;
        shown.insert(name, value.clone());
    }

    let json = serde_json::to_string_pretty(&Value::Object(shown))
        .map_err(|e| miette::miette!("Failed to serialize results: {}", e))?;
    println!("{}", json);

    Ok(())
}
