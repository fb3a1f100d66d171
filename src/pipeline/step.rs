// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Step definitions
//!
//! A step is any value implementing [`Step`]: it has a name, an ordered list
//! of dependency names, and can be invoked with the merged [`Inputs`].
//! [`FnStep`] wraps a closure, and the [`analysis!`](crate::analysis) macro
//! derives the dependency names from a function's parameter list.
//!
//! Plain [`Function`]s are callables that were never declared as steps.
//! They can live in a [`Namespace`] next to steps but are never registered.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::pipeline::Inputs;

/// A named, invocable unit of work.
///
/// Implementations should be pure functions of their inputs: the pipeline
/// caches the returned value and hands it to dependents by name.
pub trait Step {
    /// Unique name of the step; dependents refer to it by this name
    fn name(&self) -> &str;

    /// Names this step reads from its inputs, in declaration order
    fn dependency_names(&self) -> &[String];

    /// Run the step
    fn invoke(&self, inputs: &Inputs) -> anyhow::Result<Value>;
}

type StepFn = dyn Fn(&Inputs) -> anyhow::Result<Value>;

/// Closure-backed step
#[derive(Clone)]
pub struct FnStep {
    name: String,
    dependencies: Vec<String>,
    func: Arc<StepFn>,
}

impl FnStep {
    /// Create a step from a name, its dependency names and a body
    pub fn new<F>(name: impl Into<String>, dependencies: &[&str], func: F) -> Self
    where
        F: Fn(&Inputs) -> anyhow::Result<Value> + 'static,
    {
        Self {
            name: name.into(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            func: Arc::new(func),
        }
    }
}

impl Step for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependency_names(&self) -> &[String] {
        &self.dependencies
    }

    fn invoke(&self, inputs: &Inputs) -> anyhow::Result<Value> {
        (self.func)(inputs)
    }
}

impl fmt::Debug for FnStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// A callable that was not declared as a step
#[derive(Clone)]
pub struct Function {
    name: String,
    func: Arc<StepFn>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Inputs) -> anyhow::Result<Value> + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, inputs: &Inputs) -> anyhow::Result<Value> {
        (self.func)(inputs)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Member of a [`Namespace`]
#[derive(Clone)]
pub enum Member {
    /// A declared step; picked up when the namespace is registered
    Step(Arc<dyn Step>),
    /// A helper function; skipped when the namespace is registered
    Function(Function),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Self::Step(step) => step.name(),
            Self::Function(func) => func.name(),
        }
    }

    /// Whether this member was declared as a step
    pub fn is_step(&self) -> bool {
        matches!(self, Self::Step(_))
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step(step) => write!(f, "Member::Step({})", step.name()),
            Self::Function(func) => write!(f, "Member::Function({})", func.name()),
        }
    }
}

/// An ordered collection of steps and helper functions, like a module
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    name: String,
    members: Vec<Member>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Add a declared step
    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.members.push(Member::Step(Arc::new(step)));
        self
    }

    /// Add a helper function
    pub fn function(mut self, func: Function) -> Self {
        self.members.push(Member::Function(func));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All members in insertion order
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Members that were declared as steps, in insertion order
    pub fn steps(&self) -> impl Iterator<Item = &Arc<dyn Step>> {
        self.members.iter().filter_map(|m| match m {
            Member::Step(step) => Some(step),
            Member::Function(_) => None,
        })
    }
}

/// Anything that can be handed to [`Pipeline::add`](crate::Pipeline::add)
#[derive(Debug, Clone)]
pub enum Component {
    Step(Arc<dyn Step>),
    Namespace(Namespace),
    Function(Function),
}

impl Component {
    pub fn step(step: impl Step + 'static) -> Self {
        Self::Step(Arc::new(step))
    }
}

impl From<FnStep> for Component {
    fn from(step: FnStep) -> Self {
        Self::step(step)
    }
}

impl From<Arc<dyn Step>> for Component {
    fn from(step: Arc<dyn Step>) -> Self {
        Self::Step(step)
    }
}

impl From<Box<dyn Step>> for Component {
    fn from(step: Box<dyn Step>) -> Self {
        Self::Step(Arc::from(step))
    }
}

impl From<Namespace> for Component {
    fn from(namespace: Namespace) -> Self {
        Self::Namespace(namespace)
    }
}

impl From<Function> for Component {
    fn from(func: Function) -> Self {
        Self::Function(func)
    }
}

impl fmt::Debug for dyn Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name())
            .field("dependencies", &self.dependency_names())
            .finish()
    }
}

/// Declare a step from a function-like definition.
///
/// The parameter names become the step's dependency names, and each is bound
/// to the matching input as a `&serde_json::Value`. The body must evaluate to
/// `anyhow::Result<serde_json::Value>`. An optional `with <ident>` binds the
/// full [`Inputs`](crate::Inputs), which also carries every config option and
/// run parameter; it is not a dependency.
///
/// ```
/// use nowpipes::{analysis, json, Pipeline};
///
/// analysis!(fn data() {
///     Ok(json!({"a": 10, "b": 20}))
/// });
///
/// analysis!(fn shifted(data) with inputs {
///     let offset = inputs.value("offset").and_then(|v| v.as_i64()).unwrap_or(0);
///     Ok(json!(data["a"].as_i64().unwrap_or_default() + offset))
/// });
///
/// let mut pipeline = Pipeline::new();
/// pipeline.add([data(), shifted()]).unwrap();
/// pipeline.config([("offset", 5)]);
/// pipeline.run().unwrap();
/// assert_eq!(pipeline.get_result("shifted").unwrap(), &json!(15));
/// ```
#[macro_export]
macro_rules! analysis {
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident($($dep:ident),* $(,)?) $(with $all:ident)? $body:block
    ) => {
        $(#[$meta])*
        $vis fn $name() -> $crate::FnStep {
            $crate::FnStep::new(
                stringify!($name),
                &[$(stringify!($dep)),*],
                |_inputs: &$crate::Inputs| -> $crate::__private::anyhow::Result<$crate::Value> {
                    $(let $dep = _inputs.get(stringify!($dep))?;)*
                    $(let $all = _inputs;)?
                    $body
                },
            )
        }
    };
}
