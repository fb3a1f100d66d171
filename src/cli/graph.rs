// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Graph command - visualize pipeline as a graph

use miette::Result;

use super::{report, GraphFormat};
use crate::demo;

/// Run the graph command
pub fn run(format: GraphFormat, _verbose: bool) -> Result<()> {
    let pipeline = demo::pipeline().map_err(report)?;
    let graph = pipeline.graph();

    // Output in requested format
    let output = match format {
        GraphFormat::Text => graph.to_text().map_err(report)?,
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
    };

    print!("{}", output);

    Ok(())
}
