// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for nowpipes. Every command works on
//! the bundled demo pipeline.

pub mod graph;
pub mod run;
pub mod validate;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use crate::errors::{PipelineError, RecoverySuggestion};

/// Dependency-driven analysis pipelines
#[derive(Parser, Debug)]
#[clap(
    name = "nowpipes",
    version,
    about = "Run, graph and validate dependency-driven analysis pipelines",
    long_about = None,
    after_help = "Examples:\n\
        nowpipes run --show multiply          Run the demo pipeline and print a result\n\
        nowpipes run --set factor=2           Override a config option\n\
        nowpipes graph --format mermaid       Show the dependency graph\n\
        nowpipes validate --config opts.yaml  Check a config file against the pipeline\n\n\
        See 'nowpipes <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline
    Run {
        /// Config file (.yaml, .yml, .toml or .json)
        #[clap(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Set a config option; values are parsed as JSON, else kept as text
        #[clap(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Pass a run parameter, overriding config for this run only
        #[clap(short, long = "param", value_name = "KEY=VALUE")]
        param: Vec<String>,

        /// Print the result of a step as JSON
        #[clap(long, value_name = "STEP")]
        show: Vec<String>,
    },

    /// Show pipeline as a graph
    Graph {
        /// Output format
        #[clap(short, long, value_enum, default_value_t = GraphFormat::Text)]
        format: GraphFormat,
    },

    /// Validate pipeline configuration
    Validate {
        /// Config file to validate against the pipeline
        #[clap(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

/// Print a recovery suggestion when one applies, then hand the error to miette
pub(crate) fn report(error: PipelineError) -> miette::Report {
    if let Some(suggestion) = RecoverySuggestion::for_error(&error) {
        eprintln!("{} {}", "hint:".cyan().bold(), suggestion.format());
    }
    miette::Report::new(error)
}

/// Load a config file into the pipeline, failing early when it does not exist
pub(crate) fn load_config(
    pipeline: &mut crate::Pipeline,
    path: Option<PathBuf>,
) -> miette::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    if !path.exists() {
        return Err(miette::miette!(
            "Config file not found: {}",
            path.display()
        ));
    }

    pipeline.config_from_file(&path).map_err(report)?;
    Ok(())
}
