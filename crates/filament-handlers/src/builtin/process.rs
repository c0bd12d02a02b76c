use futures::future::BoxFuture;
use serde_json::Value;

use filament_core::error::{FilamentError, Result};
use filament_core::traits::NodeHandler;
use filament_core::types::Record;
use filament_expr::Program;

use super::str_param;

/// Transform/filter node backed by the restricted expression language.
///
/// `mode = "transform"` evaluates `expression` once with the incoming
/// `data` value bound as `value` (object fields are also visible directly).
/// `mode = "filter"` evaluates `predicate` per element of an incoming
/// array, with the element bound as `item`.
///
/// Expressions are compiled to a closed AST — there is no dynamic code
/// construction from user strings.
pub struct ProcessHandler;

impl NodeHandler for ProcessHandler {
    fn kind(&self) -> &str {
        "process"
    }

    fn execute(&self, inputs: &Record, parameters: &Record) -> BoxFuture<'_, Result<Record>> {
        let inputs = inputs.clone();
        let parameters = parameters.clone();
        Box::pin(async move {
            let mode = str_param(&parameters, "mode").unwrap_or("transform");
            let data = inputs
                .get("data")
                .ok_or_else(|| FilamentError::MissingInput("data".to_string()))?;

            let result = match mode {
                "transform" => transform(&parameters, data)?,
                "filter" => filter(&parameters, data)?,
                other => {
                    return Err(FilamentError::InvalidParameter {
                        parameter: "mode".into(),
                        message: format!("unknown process mode '{}'", other),
                    });
                }
            };

            let mut outputs = Record::new();
            outputs.insert("data".into(), result);
            Ok(outputs)
        })
    }
}

fn compile(parameters: &Record, key: &str) -> Result<Program> {
    let source = str_param(parameters, key)
        .ok_or_else(|| FilamentError::MissingParameter(key.to_string()))?;
    Program::compile(source).map_err(|e| FilamentError::Expression(e.to_string()))
}

fn transform(parameters: &Record, data: &Value) -> Result<Value> {
    let program = compile(parameters, "expression")?;
    program
        .eval(&scope_for(data, "value"))
        .map_err(|e| FilamentError::Expression(e.to_string()))
}

fn filter(parameters: &Record, data: &Value) -> Result<Value> {
    let program = compile(parameters, "predicate")?;
    let items = data.as_array().ok_or_else(|| FilamentError::Expression(
        "filter input must be an array".to_string(),
    ))?;

    let mut kept = Vec::new();
    for item in items {
        let verdict = program
            .eval(&scope_for(item, "item"))
            .map_err(|e| FilamentError::Expression(e.to_string()))?;
        match verdict {
            Value::Bool(true) => kept.push(item.clone()),
            Value::Bool(false) => {}
            other => {
                return Err(FilamentError::Expression(format!(
                    "filter predicate must return a boolean, got {}",
                    other
                )));
            }
        }
    }
    Ok(Value::Array(kept))
}

/// Bind `subject` under `name`; if it is an object, its fields are visible
/// directly as well.
fn scope_for(subject: &Value, name: &str) -> Value {
    let mut scope = match subject {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    scope.insert(name.to_string(), subject.clone());
    Value::Object(scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(mode: &str, expr_key: &str, expr: &str, data: Value) -> Result<Value> {
        let mut parameters = Record::new();
        parameters.insert("mode".into(), json!(mode));
        parameters.insert(expr_key.into(), json!(expr));

        let mut inputs = Record::new();
        inputs.insert("data".into(), data);

        futures::executor::block_on(ProcessHandler.execute(&inputs, &parameters))
            .map(|mut outputs| outputs.remove("data").unwrap())
    }

    #[test]
    fn test_transform_scalar() {
        let result = run("transform", "expression", "value * 2", json!(21)).unwrap();
        assert_eq!(result, json!(42.0));
    }

    #[test]
    fn test_transform_object_fields_visible() {
        let result = run(
            "transform",
            "expression",
            "price * quantity",
            json!({"price": 3.0, "quantity": 4}),
        )
        .unwrap();
        assert_eq!(result, json!(12.0));
    }

    #[test]
    fn test_filter_array() {
        let result = run(
            "filter",
            "predicate",
            "item > 10",
            json!([5, 15, 10, 25]),
        )
        .unwrap();
        assert_eq!(result, json!([15, 25]));
    }

    #[test]
    fn test_filter_objects() {
        let result = run(
            "filter",
            "predicate",
            r#"status == "active""#,
            json!([
                {"id": 1, "status": "active"},
                {"id": 2, "status": "paused"},
            ]),
        )
        .unwrap();
        assert_eq!(result, json!([{"id": 1, "status": "active"}]));
    }

    #[test]
    fn test_filter_requires_array() {
        let err = run("filter", "predicate", "item > 0", json!(7)).unwrap_err();
        assert!(matches!(err, FilamentError::Expression(_)));
    }

    #[test]
    fn test_filter_requires_boolean_predicate() {
        let err = run("filter", "predicate", "item + 1", json!([1])).unwrap_err();
        assert!(matches!(err, FilamentError::Expression(_)));
    }

    #[test]
    fn test_malformed_expression_is_descriptive() {
        let err = run("transform", "expression", "value +", json!(1)).unwrap_err();
        assert!(err.to_string().contains("expression error"));
    }

    #[test]
    fn test_missing_data_input() {
        let mut parameters = Record::new();
        parameters.insert("expression".into(), json!("value"));
        let err =
            futures::executor::block_on(ProcessHandler.execute(&Record::new(), &parameters))
                .unwrap_err();
        assert!(matches!(err, FilamentError::MissingInput(_)));
    }

    #[test]
    fn test_unknown_mode() {
        let err = run("reduce", "expression", "value", json!(1)).unwrap_err();
        assert!(matches!(err, FilamentError::InvalidParameter { .. }));
    }
}
