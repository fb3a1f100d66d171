// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nowpipes contributors

//! Bundled demo pipeline
//!
//! A small diamond of steps used by the CLI and the examples in the docs:
//!
//! ```text
//! data ─┬─ analysis1 ─┬─ multiply ─┐
//!       └─ analysis2 ─┴────────────┴─ more
//! ```

use anyhow::anyhow;
use serde_json::{json, Value};

use crate::errors::PipelineResult;
use crate::pipeline::{Function, Namespace, Pipeline, Record};

crate::analysis! {
    /// Source record `{a: 10, b: 20}`
    pub fn data() {
        Ok(json!({"a": 10, "b": 20}))
    }
}

crate::analysis! {
    pub fn analysis1(data) {
        let a: i64 = Record::new("data", data)?.get("a")?;
        Ok(json!(a + 10))
    }
}

crate::analysis! {
    pub fn analysis2(data) {
        let a: i64 = Record::new("data", data)?.get("a")?;
        Ok(json!(a + 20))
    }
}

crate::analysis! {
    pub fn multiply(analysis1, analysis2) {
        Ok(json!(integer(analysis1, "analysis1")? * integer(analysis2, "analysis2")?))
    }
}

crate::analysis! {
    /// Collects the intermediate results into one record
    pub fn more(analysis1, analysis2, multiply) {
        Ok(json!({
            "result1": analysis1,
            "result2": analysis2,
            "multi": multiply,
        }))
    }
}

fn integer(value: &Value, name: &str) -> anyhow::Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| anyhow!("result of '{}' is not an integer: {}", name, value))
}

/// Plain helper living next to the steps; never registered
pub fn describe() -> Function {
    Function::new("describe", |inputs| {
        let names: Vec<&str> = inputs.names().collect();
        Ok(json!(format!("{} input(s): {}", names.len(), names.join(", "))))
    })
}

/// The demo steps and helper, in declaration order
pub fn namespace() -> Namespace {
    Namespace::new("demo")
        .step(data())
        .step(analysis1())
        .step(analysis2())
        .step(multiply())
        .step(more())
        .function(describe())
}

/// A pipeline with the demo namespace registered
pub fn pipeline() -> PipelineResult<Pipeline> {
    let mut pipeline = Pipeline::new();
    pipeline.add([namespace()])?;
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Inputs, Step};

    #[test]
    fn test_demo_results() {
        let mut pipeline = pipeline().unwrap();
        let report = pipeline.run().unwrap();

        assert_eq!(
            report.order,
            vec!["data", "analysis1", "analysis2", "multiply", "more"]
        );
        assert_eq!(pipeline.get_result("multiply").unwrap(), &json!(600));
        assert_eq!(
            pipeline.get_result("more").unwrap(),
            &json!({"result1": 20, "result2": 30, "multi": 600})
        );
    }

    #[test]
    fn test_helper_is_not_registered() {
        let pipeline = pipeline().unwrap();
        assert_eq!(pipeline.registry().len(), 5);
        assert!(!pipeline.registry().contains("describe"));
    }

    #[test]
    fn test_describe() {
        let inputs = Inputs::new("describe").with("x", 1).with("y", 2);
        assert_eq!(describe().call(&inputs).unwrap(), json!("2 input(s): x, y"));
    }

    #[test]
    fn test_multiply_rejects_non_integers() {
        let inputs = Inputs::new("multiply")
            .with("analysis1", "twenty")
            .with("analysis2", 30);
        let err = multiply().invoke(&inputs).unwrap_err();
        assert!(err.to_string().contains("analysis1"));
    }
}
