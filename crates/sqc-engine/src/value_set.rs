//! Normalization of "valid/trigger values" rule fields into typed sets.
//!
//! One policy, applied everywhere value sets appear: if any element's string
//! form contains an alphabetic character the whole set is coerced to
//! strings; otherwise every element is parsed as a number, keeping the
//! original token verbatim when parsing fails.

use sqc_model::{CellValue, QcError, Result, ValueSpec};

/// Normalize a rule's value-range specification into a typed array of
/// values for membership testing.
pub fn parse_value_set(spec: &ValueSpec) -> Result<Vec<CellValue>> {
    let tokens: Vec<String> = match spec {
        // A bare number is a singleton set.
        ValueSpec::Number(value) => return Ok(vec![CellValue::Number(*value)]),
        ValueSpec::Text(text) => text.split(',').map(|token| token.trim().to_string()).collect(),
        ValueSpec::List(items) => items
            .iter()
            .map(|item| match item {
                ValueSpec::Number(value) => Ok(CellValue::Number(*value).token()),
                ValueSpec::Text(text) => Ok(text.trim().to_string()),
                ValueSpec::List(_) => Err(QcError::InvalidValueSet(
                    "value set elements must be numbers or strings".to_string(),
                )),
            })
            .collect::<Result<_>>()?,
    };

    let any_alphabetic = tokens
        .iter()
        .any(|token| token.chars().any(char::is_alphabetic));
    let values = if any_alphabetic {
        tokens.into_iter().map(CellValue::Text).collect()
    } else {
        tokens
            .into_iter()
            .map(|token| match token.parse::<f64>() {
                Ok(number) => CellValue::Number(number),
                // Keep the original token when numeric parsing fails.
                Err(_) => CellValue::Text(token),
            })
            .collect()
    };
    Ok(values)
}

/// Membership test with the documented coercions: numeric members compare
/// through the cell's lenient numeric view, string members through its
/// token form. A missing cell is never a member.
pub fn value_set_contains(set: &[CellValue], cell: &CellValue) -> bool {
    if cell.is_missing() {
        return false;
    }
    set.iter().any(|member| match member {
        CellValue::Number(number) => cell.as_number() == Some(*number),
        CellValue::Text(text) => cell.token() == *text,
        CellValue::Missing => false,
    })
}
