//! Condition evaluator for the rule sub-language.
//!
//! Rule tables embed conditions as free-form text (`"bmi > 50"`,
//! `"weight / (height * height) >= 25"`). This module gives that text an
//! explicit, testable grammar — comparisons, boolean connectives,
//! arithmetic, and variable references — instead of any general
//! code-execution facility.
//!
//! Expressions come from an operator-controlled configuration artifact, but
//! evaluation still fails closed: a parse or runtime error is logged and the
//! condition counts as `false`, so one malformed rule cannot abort a run.

mod eval;
mod lexer;
mod parser;

use sqc_model::{CellValue, Dataset};
use thiserror::Error;

pub use eval::{Scope, Value, eval, truth};
pub use parser::{BinaryOp, Expr, UnaryOp, parse};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("unexpected token {0}")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("type error: {0}")]
    Type(String),
}

/// Binds a single variable name to one cell value. Used by rules whose
/// condition only ranges over the target variable.
pub struct SingleScope<'a> {
    name: &'a str,
    value: &'a CellValue,
}

impl<'a> SingleScope<'a> {
    pub fn new(name: &'a str, value: &'a CellValue) -> Self {
        Self { name, value }
    }
}

impl Scope for SingleScope<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        (name == self.name).then(|| Value::from(self.value))
    }
}

/// Binds every column of one dataset row by column name. Used by
/// cross-variable formula rules.
pub struct RowScope<'a> {
    dataset: &'a Dataset,
    row: usize,
}

impl<'a> RowScope<'a> {
    pub fn new(dataset: &'a Dataset, row: usize) -> Self {
        Self { dataset, row }
    }
}

impl Scope for RowScope<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.dataset
            .column_index(name)
            .map(|column| Value::from(self.dataset.value(self.row, column)))
    }
}

/// Parse and evaluate `source`, reducing the result to Some(true) /
/// Some(false) / None-for-indeterminate. Errors are logged and yield `None`
/// rather than propagating — a malformed rule must not abort the rule set.
pub fn eval_tristate(source: &str, scope: &dyn Scope) -> Option<bool> {
    let outcome = parse(source).and_then(|expr| {
        let value = eval(&expr, scope)?;
        truth(&value)
    });
    match outcome {
        Ok(result) => result,
        Err(error) => {
            tracing::warn!(expression = source, %error, "condition evaluation failed");
            None
        }
    }
}

/// Boolean form of [`eval_tristate`]: indeterminate (missing operands,
/// parse/runtime errors) coerces to `false`, never to a third state.
pub fn eval_condition(source: &str, scope: &dyn Scope) -> bool {
    eval_tristate(source, scope) == Some(true)
}

/// Evaluate a replacement expression to a cell value. Errors are logged and
/// yield `None`; the caller leaves the row untouched.
pub fn eval_value(source: &str, scope: &dyn Scope) -> Option<CellValue> {
    match parse(source).and_then(|expr| eval(&expr, scope)) {
        Ok(value) => Some(value.into_cell()),
        Err(error) => {
            tracing::warn!(expression = source, %error, "replacement evaluation failed");
            None
        }
    }
}

/// Heuristic used by cross-variable change rules: a cross condition that
/// carries comparison or connective tokens is an expression; anything else
/// is a plain value list.
pub fn looks_like_expression(source: &str) -> bool {
    source
        .chars()
        .any(|ch| matches!(ch, '<' | '>' | '=' | '!' | '&' | '|' | '(' | ')' | '+' | '*' | '/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_condition_fails_closed_on_parse_error() {
        let value = CellValue::Number(1.0);
        let scope = SingleScope::new("x", &value);
        assert!(!eval_condition("x >>> 1", &scope));
        assert!(!eval_condition("", &scope));
    }

    #[test]
    fn eval_condition_coerces_missing_to_false() {
        let value = CellValue::Missing;
        let scope = SingleScope::new("x", &value);
        assert!(!eval_condition("x > 5", &scope));
    }

    #[test]
    fn expression_detection() {
        assert!(looks_like_expression("x > 5"));
        assert!(looks_like_expression("1 == 1"));
        assert!(!looks_like_expression("1,2,3"));
        assert!(!looks_like_expression("yes, no"));
    }
}
