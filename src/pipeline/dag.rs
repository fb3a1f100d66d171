// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Dependency graph and execution order resolution
//!
//! The graph only has edges between registered steps. Dependency names that
//! do not match a step are external inputs (config options or run
//! parameters) and are tracked separately.
//!
//! Resolution peels the graph: each pass takes every step whose step
//! dependencies have all been emitted, in registration order, and emits
//! them. The ready set is fixed at the start of a pass, so a step freed
//! during a pass waits for the next one.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

use crate::errors::{PipelineError, PipelineResult};
use crate::pipeline::StepRegistry;

/// Step-to-step dependency graph; node order is registration order
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    name_to_index: HashMap<String, NodeIndex>,
    external: HashMap<NodeIndex, Vec<String>>,
}

impl DependencyGraph {
    /// Build the graph from the live registry
    pub fn build(registry: &StepRegistry) -> Self {
        Self::from_dependencies(registry.dependency_map())
    }

    /// Build the graph from `(step, dependency names)` pairs, in order.
    ///
    /// A repeated step name keeps its first position and its last
    /// dependency list.
    pub fn from_dependencies<I, S, D, N>(dependencies: I) -> Self
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let mut graph = DiGraph::new();
        let mut name_to_index: HashMap<String, NodeIndex> = HashMap::new();
        let mut declared: Vec<Vec<String>> = Vec::new();

        // Add all steps as nodes
        for (name, deps) in dependencies {
            let name = name.into();
            let deps: Vec<String> = deps.into_iter().map(Into::into).collect();
            match name_to_index.get(&name) {
                Some(&node) => declared[node.index()] = deps,
                None => {
                    let node = graph.add_node(name.clone());
                    name_to_index.insert(name, node);
                    declared.push(deps);
                }
            }
        }

        // Add dependency edges; anything that is not a step is external
        let mut external = HashMap::new();
        for (idx, deps) in declared.into_iter().enumerate() {
            let step_node = NodeIndex::new(idx);
            let mut outside = Vec::new();

            for dep_name in deps {
                match name_to_index.get(&dep_name) {
                    Some(&dep_node) => {
                        graph.update_edge(dep_node, step_node, ());
                    }
                    None if !outside.contains(&dep_name) => outside.push(dep_name),
                    None => {}
                }
            }

            if !outside.is_empty() {
                external.insert(step_node, outside);
            }
        }

        Self {
            graph,
            name_to_index,
            external,
        }
    }

    /// Resolve the execution order.
    ///
    /// Every step appears exactly once, after all of its step dependencies.
    /// Fails with [`PipelineError::CircularDependency`] listing the steps
    /// that can never become ready.
    pub fn resolve(&self) -> PipelineResult<Vec<String>> {
        let count = self.graph.node_count();
        let mut pending: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();
        let mut emitted = vec![false; count];
        let mut order = Vec::with_capacity(count);

        while order.len() < count {
            let ready: Vec<NodeIndex> = self
                .graph
                .node_indices()
                .filter(|n| !emitted[n.index()] && pending[n.index()] == 0)
                .collect();

            if ready.is_empty() {
                let steps: Vec<String> = self
                    .graph
                    .node_indices()
                    .filter(|n| !emitted[n.index()])
                    .map(|n| self.graph[n].clone())
                    .collect();
                tracing::debug!(?steps, "dependency resolution stuck");
                return Err(PipelineError::CircularDependency { steps });
            }

            for node in ready {
                emitted[node.index()] = true;
                order.push(self.graph[node].clone());
                for dependent in self.graph.neighbors_directed(node, Direction::Outgoing) {
                    pending[dependent.index()] -= 1;
                }
            }
        }

        tracing::debug!(?order, "resolved execution order");
        Ok(order)
    }

    /// Strongly connected groups of steps that depend on each other,
    /// including steps that depend on themselves
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self.graph.contains_edge(component[0], component[0])
            })
            .map(|mut component| {
                component.sort();
                component
                    .into_iter()
                    .map(|n| self.graph[n].clone())
                    .collect()
            })
            .collect();

        cycles.sort_by_key(|c| self.name_to_index[&c[0]]);
        cycles
    }

    /// Step dependencies of a step, in declaration order
    pub fn dependencies(&self, step_name: &str) -> Option<Vec<String>> {
        let node = self.name_to_index.get(step_name)?;
        let mut deps: Vec<String> = self
            .graph
            .neighbors_directed(*node, Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect();
        // petgraph lists neighbors newest edge first
        deps.reverse();
        Some(deps)
    }

    /// Steps that depend directly on a step, in registration order
    pub fn dependents(&self, step_name: &str) -> Option<Vec<String>> {
        let node = self.name_to_index.get(step_name)?;
        let mut deps: Vec<String> = self
            .graph
            .neighbors_directed(*node, Direction::Outgoing)
            .map(|n| self.graph[n].clone())
            .collect();
        deps.reverse();
        Some(deps)
    }

    /// Dependency names of a step that are not steps themselves
    pub fn external_inputs(&self, step_name: &str) -> Option<&[String]> {
        let node = self.name_to_index.get(step_name)?;
        Some(self.external.get(node).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Check if step A depends (directly or transitively) on step B
    pub fn depends_on(&self, step_a: &str, step_b: &str) -> bool {
        let Some(node_a) = self.name_to_index.get(step_a) else {
            return false;
        };
        let Some(node_b) = self.name_to_index.get(step_b) else {
            return false;
        };

        node_a != node_b
            && petgraph::algo::has_path_connecting(&self.graph, *node_b, *node_a, None)
    }

    pub fn contains(&self, step_name: &str) -> bool {
        self.name_to_index.contains_key(step_name)
    }

    /// Step names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(|n| self.graph[n].as_str())
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Generate Mermaid diagram of the graph
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for node in self.graph.node_indices() {
            let name = &self.graph[node];
            out.push_str(&format!("    {}[{}]\n", name, name));
        }

        for edge in self.graph.raw_edges() {
            let from_name = &self.graph[edge.source()];
            let to_name = &self.graph[edge.target()];
            out.push_str(&format!("    {} --> {}\n", from_name, to_name));
        }

        out
    }

    /// Generate DOT diagram of the graph
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for edge in self.graph.raw_edges() {
            let from_name = &self.graph[edge.source()];
            let to_name = &self.graph[edge.target()];
            out.push_str(&format!("    \"{}\" -> \"{}\";\n", from_name, to_name));
        }

        // Isolated nodes have no edge to introduce them
        for node in self.graph.node_indices() {
            if self.graph.neighbors_undirected(node).count() == 0 {
                out.push_str(&format!("    \"{}\";\n", self.graph[node]));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation of execution order
    pub fn to_text(&self) -> PipelineResult<String> {
        let order = self.resolve()?;
        let mut out = String::new();

        for (i, name) in order.iter().enumerate() {
            out.push_str(&format!("{}. {}", i + 1, name));

            let deps = self.dependencies(name).unwrap_or_default();
            if !deps.is_empty() {
                out.push_str(&format!(" [depends: {}]", deps.join(", ")));
            }

            let inputs = self.external_inputs(name).unwrap_or_default();
            if !inputs.is_empty() {
                out.push_str(&format!(" [inputs: {}]", inputs.join(", ")));
            }

            out.push('\n');
        }

        Ok(out)
    }
}
