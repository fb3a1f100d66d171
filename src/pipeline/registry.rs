// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Step registry
//!
//! Stores the registered steps by name. Registration order is kept and is
//! the tie-breaker the resolver uses, so re-registering a name replaces the
//! step but not its position.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::errors::{PipelineError, PipelineResult};
use crate::pipeline::{Component, Member, Step};

/// Named steps in registration order
#[derive(Clone, Default)]
pub struct StepRegistry {
    steps: IndexMap<String, Arc<dyn Step>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step, replacing any step with the same name.
    ///
    /// Dependency names are not checked here: names that are not steps are
    /// expected to come from config or run parameters at run time.
    pub fn register(&mut self, step: Arc<dyn Step>) -> PipelineResult<()> {
        let name = step.name().to_string();
        if !is_valid_name(&name) {
            return Err(PipelineError::invalid_step_name(&name));
        }

        let replaced = self.steps.insert(name.clone(), step).is_some();
        tracing::debug!(step = %name, replaced, "registered step");
        Ok(())
    }

    /// Register steps, namespaces and functions in order.
    ///
    /// Namespaces contribute only their declared steps; helper functions in
    /// them are skipped. A plain function passed directly is rejected.
    /// Components before a failing one stay registered. Returns the number
    /// of steps registered.
    pub fn register_many<I, C>(&mut self, components: I) -> PipelineResult<usize>
    where
        I: IntoIterator<Item = C>,
        C: Into<Component>,
    {
        let mut count = 0;

        for component in components {
            match component.into() {
                Component::Step(step) => {
                    self.register(step)?;
                    count += 1;
                }
                Component::Namespace(namespace) => {
                    for member in namespace.members() {
                        match member {
                            Member::Step(step) => {
                                self.register(Arc::clone(step))?;
                                count += 1;
                            }
                            Member::Function(func) => {
                                tracing::debug!(
                                    namespace = namespace.name(),
                                    function = func.name(),
                                    "skipping helper function"
                                );
                            }
                        }
                    }
                }
                Component::Function(func) => {
                    return Err(PipelineError::unmarked_function(func.name()));
                }
            }
        }

        Ok(count)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Step>> {
        self.steps.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Step names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Step>> {
        self.steps.values()
    }

    /// Snapshot of step name to declared dependency names
    pub fn dependency_map(&self) -> IndexMap<String, Vec<String>> {
        self.steps
            .iter()
            .map(|(name, step)| (name.clone(), step.dependency_names().to_vec()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.steps
                    .iter()
                    .map(|(name, step)| (name, step.dependency_names())),
            )
            .finish()
    }
}

/// Step names double as parameter names, so they must be identifiers
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{FnStep, Function, Namespace};
    use serde_json::{json, Value};

    fn constant(name: &str, deps: &[&str], value: i64) -> FnStep {
        FnStep::new(name, deps, move |_| Ok(json!(value)))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = StepRegistry::new();
        registry.register(Arc::new(constant("a", &[], 1))).unwrap();
        registry.register(Arc::new(constant("b", &["a"], 2))).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("a"));
        assert_eq!(registry.get("b").unwrap().dependency_names(), &["a"]);
    }

    #[test]
    fn test_reregister_replaces_but_keeps_position() {
        let mut registry = StepRegistry::new();
        registry.register(Arc::new(constant("a", &["x"], 1))).unwrap();
        registry.register(Arc::new(constant("b", &[], 2))).unwrap();
        registry.register(Arc::new(constant("a", &["b"], 3))).unwrap();

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);
        let map = registry.dependency_map();
        assert_eq!(map["a"], vec!["b".to_string()]);
    }

    #[test]
    fn test_unknown_dependencies_are_accepted() {
        let mut registry = StepRegistry::new();
        registry
            .register(Arc::new(constant("a", &["not_a_step"], 1)))
            .unwrap();
        assert!(registry.contains("a"));
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let mut registry = StepRegistry::new();
        for bad in ["", "1st", "with space", "dash-ed"] {
            let err = registry
                .register(Arc::new(constant(bad, &[], 1)))
                .unwrap_err();
            assert!(matches!(err, PipelineError::Registration { .. }), "{bad}");
        }
        assert!(registry.is_empty());
        registry.register(Arc::new(constant("_ok2", &[], 1))).unwrap();
    }

    #[test]
    fn test_namespace_skips_helper_functions() {
        let ns = Namespace::new("module")
            .step(constant("a", &[], 1))
            .function(Function::new("helper", |_| Ok(Value::Null)))
            .step(constant("b", &["a"], 2));

        let mut registry = StepRegistry::new();
        let count = registry.register_many([ns]).unwrap();

        assert_eq!(count, 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(!registry.contains("helper"));
    }

    #[test]
    fn test_direct_function_is_rejected() {
        let mut registry = StepRegistry::new();
        let components: Vec<Component> = vec![
            constant("a", &[], 1).into(),
            Function::new("helper", |_| Ok(Value::Null)).into(),
            constant("b", &[], 2).into(),
        ];

        let err = registry.register_many(components).unwrap_err();
        assert!(matches!(err, PipelineError::Registration { ref name, .. } if name == "helper"));
        // Not transactional: earlier components stay
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a"]);
    }
}
