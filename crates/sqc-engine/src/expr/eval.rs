//! Tree-walking evaluator with three-valued (Kleene) logic.
//!
//! Missing values propagate through arithmetic and comparisons, and logical
//! connectives follow Kleene truth tables (`Missing && false` is `false`,
//! `Missing || true` is `true`). Callers coerce a `Missing` result to
//! `false` at the boolean boundary; the tri-state never escapes the engine.

use sqc_model::CellValue;

use super::ExprError;
use super::parser::{BinaryOp, Expr, UnaryOp};

/// Runtime value of the sub-language.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Missing,
}

impl Value {
    pub fn into_cell(self) -> CellValue {
        match self {
            Self::Number(value) => CellValue::Number(value),
            Self::Text(text) => CellValue::Text(text),
            // Booleans land in numeric columns as 0/1.
            Self::Bool(flag) => CellValue::Number(if flag { 1.0 } else { 0.0 }),
            Self::Missing => CellValue::Missing,
        }
    }
}

impl From<&CellValue> for Value {
    fn from(cell: &CellValue) -> Self {
        match cell {
            CellValue::Number(value) => Self::Number(*value),
            CellValue::Text(text) => Self::Text(text.clone()),
            CellValue::Missing => Self::Missing,
        }
    }
}

/// Name-to-value binding for one evaluation. `None` means the name is not
/// bound at all, which is distinct from a bound-but-missing cell.
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<Value>;
}

pub fn eval(expr: &Expr, scope: &dyn Scope) -> Result<Value, ExprError> {
    match expr {
        Expr::Number(value) => Ok(Value::Number(*value)),
        Expr::Text(text) => Ok(Value::Text(text.clone())),
        Expr::Variable(name) => scope
            .lookup(name)
            .ok_or_else(|| ExprError::UnknownVariable(name.clone())),
        Expr::Unary { op, operand } => {
            let value = eval(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(match truth(&value)? {
                    Some(flag) => Value::Bool(!flag),
                    None => Value::Missing,
                }),
                UnaryOp::Neg => Ok(match numeric(&value)? {
                    Some(number) => Value::Number(-number),
                    None => Value::Missing,
                }),
            }
        }
        Expr::Binary { op, left, right } => {
            // Logical connectives get Kleene short-circuit treatment.
            match op {
                BinaryOp::And => return kleene_and(left, right, scope),
                BinaryOp::Or => return kleene_or(left, right, scope),
                _ => {}
            }
            let lhs = eval(left, scope)?;
            let rhs = eval(right, scope)?;
            match op {
                BinaryOp::Add => arithmetic(&lhs, &rhs, |a, b| a + b),
                BinaryOp::Sub => arithmetic(&lhs, &rhs, |a, b| a - b),
                BinaryOp::Mul => arithmetic(&lhs, &rhs, |a, b| a * b),
                BinaryOp::Div => arithmetic(&lhs, &rhs, |a, b| a / b),
                BinaryOp::Eq => compare(&lhs, &rhs, |ordering| ordering == std::cmp::Ordering::Equal),
                BinaryOp::Ne => compare(&lhs, &rhs, |ordering| ordering != std::cmp::Ordering::Equal),
                BinaryOp::Lt => compare(&lhs, &rhs, |ordering| ordering == std::cmp::Ordering::Less),
                BinaryOp::Le => compare(&lhs, &rhs, |ordering| ordering != std::cmp::Ordering::Greater),
                BinaryOp::Gt => compare(&lhs, &rhs, |ordering| ordering == std::cmp::Ordering::Greater),
                BinaryOp::Ge => compare(&lhs, &rhs, |ordering| ordering != std::cmp::Ordering::Less),
                BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
            }
        }
    }
}

/// Truthiness: booleans as-is, numbers are true when non-zero, missing is
/// indeterminate, text has no truth value.
pub fn truth(value: &Value) -> Result<Option<bool>, ExprError> {
    match value {
        Value::Bool(flag) => Ok(Some(*flag)),
        Value::Number(number) => Ok(Some(*number != 0.0)),
        Value::Missing => Ok(None),
        Value::Text(text) => Err(ExprError::Type(format!(
            "text value \"{text}\" has no truth value"
        ))),
    }
}

fn kleene_and(left: &Expr, right: &Expr, scope: &dyn Scope) -> Result<Value, ExprError> {
    let lhs = truth(&eval(left, scope)?)?;
    if lhs == Some(false) {
        return Ok(Value::Bool(false));
    }
    let rhs = truth(&eval(right, scope)?)?;
    Ok(match (lhs, rhs) {
        (_, Some(false)) => Value::Bool(false),
        (Some(true), Some(true)) => Value::Bool(true),
        _ => Value::Missing,
    })
}

fn kleene_or(left: &Expr, right: &Expr, scope: &dyn Scope) -> Result<Value, ExprError> {
    let lhs = truth(&eval(left, scope)?)?;
    if lhs == Some(true) {
        return Ok(Value::Bool(true));
    }
    let rhs = truth(&eval(right, scope)?)?;
    Ok(match (lhs, rhs) {
        (_, Some(true)) => Value::Bool(true),
        (Some(false), Some(false)) => Value::Bool(false),
        _ => Value::Missing,
    })
}

/// Numeric view for arithmetic: numbers as-is, numeric-looking text is
/// parsed, missing is indeterminate.
fn numeric(value: &Value) -> Result<Option<f64>, ExprError> {
    match value {
        Value::Number(number) => Ok(Some(*number)),
        Value::Text(text) => text.trim().parse::<f64>().map(Some).map_err(|_| {
            ExprError::Type(format!("text value \"{text}\" is not numeric"))
        }),
        Value::Bool(_) => Err(ExprError::Type("boolean used in arithmetic".to_string())),
        Value::Missing => Ok(None),
    }
}

fn arithmetic(
    lhs: &Value,
    rhs: &Value,
    apply: impl Fn(f64, f64) -> f64,
) -> Result<Value, ExprError> {
    match (numeric(lhs)?, numeric(rhs)?) {
        (Some(a), Some(b)) => Ok(Value::Number(apply(a, b))),
        _ => Ok(Value::Missing),
    }
}

fn compare(
    lhs: &Value,
    rhs: &Value,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Value, ExprError> {
    let ordering = match (lhs, rhs) {
        (Value::Missing, _) | (_, Value::Missing) => return Ok(Value::Missing),
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        // Mixed number/text comparisons coerce the text side numerically.
        (Value::Number(a), Value::Text(text)) | (Value::Text(text), Value::Number(a)) => {
            let Ok(b) = text.trim().parse::<f64>() else {
                return Err(ExprError::Type(format!(
                    "cannot compare number with text \"{text}\""
                )));
            };
            if matches!(lhs, Value::Number(_)) {
                a.partial_cmp(&b)
            } else {
                b.partial_cmp(a)
            }
        }
        (a, b) => {
            return Err(ExprError::Type(format!(
                "cannot compare {} with {}",
                kind_name(a),
                kind_name(b)
            )));
        }
    };
    // NaN comparisons are indeterminate, like a missing value.
    Ok(ordering.map_or(Value::Missing, |ordering| Value::Bool(accept(ordering))))
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Number(_) => "number",
        Value::Text(_) => "text",
        Value::Bool(_) => "boolean",
        Value::Missing => "missing",
    }
}
