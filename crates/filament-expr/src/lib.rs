//! A small, closed expression language for workflow transform and filter
//! nodes.
//!
//! Expressions are parsed into an AST and evaluated by a tree-walking
//! interpreter against a JSON scope value. There is no access to ambient
//! scope, no function calls, and no side effects: the language covers
//! literals, dotted field paths, arithmetic, comparison, boolean logic, and
//! a `contains` membership test.
//!
//! ```
//! use filament_expr::Program;
//!
//! let program = Program::compile("item.price * 1.2 > 50").unwrap();
//! let scope = serde_json::json!({ "item": { "price": 49.0 } });
//! assert_eq!(program.eval(&scope).unwrap(), serde_json::json!(true));
//! ```

mod ast;
mod eval;
mod parser;
mod token;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::evaluate;
pub use parser::parse;
pub use token::{tokenize, Token};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ExprError {
    #[error("unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("type mismatch: {op} expects {expected}, got {actual}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        actual: String,
    },

    #[error("division by zero")]
    DivisionByZero,
}

/// A compiled expression, ready for repeated evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    expr: Expr,
}

impl Program {
    /// Parse `source` into an evaluable program.
    pub fn compile(source: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(source)?;
        let expr = parse(&tokens)?;
        Ok(Self { expr })
    }

    /// Evaluate against a JSON scope.
    pub fn eval(&self, scope: &serde_json::Value) -> Result<serde_json::Value, ExprError> {
        evaluate(&self.expr, scope)
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compile_and_eval() {
        let program = Program::compile("value + 1").unwrap();
        assert_eq!(program.eval(&json!({"value": 41})).unwrap(), json!(42.0));
    }

    #[test]
    fn test_compile_error() {
        assert!(Program::compile("1 +").is_err());
        assert!(Program::compile("@").is_err());
    }

    #[test]
    fn test_no_ambient_access() {
        // Identifiers resolve only against the provided scope; anything
        // absent is null, never an escape hatch.
        let program = Program::compile("process == null").unwrap();
        assert_eq!(program.eval(&json!({})).unwrap(), json!(true));
    }
}
