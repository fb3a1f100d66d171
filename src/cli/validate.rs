// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Validate command - check the pipeline against its configuration

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::load_config;
use crate::demo;

/// Run the validate command
pub fn run(config: Option<PathBuf>, verbose: bool) -> Result<()> {
    println!("{}", "Validating pipeline...".bold());
    println!();

    let mut pipeline = demo::pipeline().map_err(super::report)?;

    if let Some(ref path) = config {
        match load_config(&mut pipeline, Some(path.clone())) {
            Ok(()) => println!("  {} Config file {} loaded", "✓".green(), path.display()),
            Err(e) => {
                eprintln!("  {} Failed to load config", "✗".red());
                eprintln!();
                return Err(e);
            }
        }
    }

    let validation = pipeline.validate();

    if !validation.errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    if !validation.warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Pipeline summary".bold());
        println!("  Steps: {}", pipeline.registry().len());
        for step in pipeline.registry().iter() {
            let deps = if step.dependency_names().is_empty() {
                String::new()
            } else {
                format!(" [depends: {}]", step.dependency_names().join(", "))
            };
            println!("    - {}{}", step.name(), deps.dimmed());
        }
        if !pipeline.options().is_empty() {
            println!("  Options:");
            for (key, value) in pipeline.options().iter() {
                println!("    - {} = {}", key, value);
            }
        }
    }

    println!();

    if !validation.is_valid() {
        return Err(miette::miette!("Pipeline validation failed"));
    }

    if validation.has_warnings() {
        println!("{}", "Pipeline is valid but has warnings.".yellow().bold());
    } else {
        println!("{}", "Pipeline is valid!".green().bold());
    }
    Ok(())
}
