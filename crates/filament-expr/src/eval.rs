use serde_json::Value;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::ExprError;

/// Evaluate an expression against a JSON scope.
///
/// Field paths walk the scope object; any missing step resolves to `null`,
/// so absence checks (`x == null`) work without erroring. Type mismatches
/// in operators are errors, not coercions.
pub fn evaluate(expr: &Expr, scope: &Value) -> Result<Value, ExprError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Path(path) => Ok(resolve_path(path, scope)),
        Expr::Unary(op, operand) => {
            let value = evaluate(operand, scope)?;
            match op {
                UnaryOp::Neg => match value.as_f64() {
                    Some(n) => Ok(number(-n)),
                    None => Err(type_mismatch("-", "number", &value)),
                },
                UnaryOp::Not => match value.as_bool() {
                    Some(b) => Ok(Value::Bool(!b)),
                    None => Err(type_mismatch("!", "boolean", &value)),
                },
            }
        }
        Expr::Binary(op, lhs, rhs) => eval_binary(*op, lhs, rhs, scope),
    }
}

fn eval_binary(op: BinaryOp, lhs: &Expr, rhs: &Expr, scope: &Value) -> Result<Value, ExprError> {
    // Short-circuit booleans before evaluating the right side.
    if matches!(op, BinaryOp::And | BinaryOp::Or) {
        let left = evaluate(lhs, scope)?;
        let left = left
            .as_bool()
            .ok_or_else(|| type_mismatch(op.symbol(), "boolean", &left))?;
        match (op, left) {
            (BinaryOp::And, false) => return Ok(Value::Bool(false)),
            (BinaryOp::Or, true) => return Ok(Value::Bool(true)),
            _ => {}
        }
        let right = evaluate(rhs, scope)?;
        let right = right
            .as_bool()
            .ok_or_else(|| type_mismatch(op.symbol(), "boolean", &right))?;
        return Ok(Value::Bool(right));
    }

    let left = evaluate(lhs, scope)?;
    let right = evaluate(rhs, scope)?;

    match op {
        BinaryOp::Eq => Ok(Value::Bool(json_eq(&left, &right))),
        BinaryOp::NotEq => Ok(Value::Bool(!json_eq(&left, &right))),

        BinaryOp::Add => match (&left, &right) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            _ => arith(op, &left, &right, |a, b| Ok(a + b)),
        },
        BinaryOp::Sub => arith(op, &left, &right, |a, b| Ok(a - b)),
        BinaryOp::Mul => arith(op, &left, &right, |a, b| Ok(a * b)),
        BinaryOp::Div => arith(op, &left, &right, |a, b| {
            if b == 0.0 {
                Err(ExprError::DivisionByZero)
            } else {
                Ok(a / b)
            }
        }),
        BinaryOp::Rem => arith(op, &left, &right, |a, b| {
            if b == 0.0 {
                Err(ExprError::DivisionByZero)
            } else {
                Ok(a % b)
            }
        }),

        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            compare(op, &left, &right)
        }

        BinaryOp::Contains => match (&left, &right) {
            (Value::String(haystack), Value::String(needle)) => {
                Ok(Value::Bool(haystack.contains(needle.as_str())))
            }
            (Value::Array(items), needle) => {
                Ok(Value::Bool(items.iter().any(|item| json_eq(item, needle))))
            }
            _ => Err(type_mismatch("contains", "string or array", &left)),
        },

        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

fn arith(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    f: impl Fn(f64, f64) -> Result<f64, ExprError>,
) -> Result<Value, ExprError> {
    let a = left
        .as_f64()
        .ok_or_else(|| type_mismatch(op.symbol(), "number", left))?;
    let b = right
        .as_f64()
        .ok_or_else(|| type_mismatch(op.symbol(), "number", right))?;
    Ok(number(f(a, b)?))
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, ExprError> {
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => {
            let a = left
                .as_f64()
                .ok_or_else(|| type_mismatch(op.symbol(), "number or string", left))?;
            let b = right
                .as_f64()
                .ok_or_else(|| type_mismatch(op.symbol(), "number or string", right))?;
            a.partial_cmp(&b)
                .ok_or_else(|| type_mismatch(op.symbol(), "comparable number", left))?
        }
    };

    let result = match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::LtEq => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::GtEq => ordering.is_ge(),
        _ => unreachable!(),
    };
    Ok(Value::Bool(result))
}

/// JSON equality with numeric widening, so `1 == 1.0` holds.
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn resolve_path(path: &[String], scope: &Value) -> Value {
    let mut current = scope;
    for segment in path {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}

fn number(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn type_mismatch(op: &'static str, expected: &'static str, actual: &Value) -> ExprError {
    let actual = match actual {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    };
    ExprError::TypeMismatch {
        op,
        expected,
        actual,
    }
}
