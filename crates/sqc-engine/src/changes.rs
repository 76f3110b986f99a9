//! Change-rule handlers: substitutions that mutate a variable in place and
//! record why in the variable's change-comment column.

use sqc_model::{
    CHANGE_COMMENT_SUFFIX, CellValue, ChangeRule, ChangeRuleKind, Dataset, QcError, Result,
    ValueSpec, change_comment_column,
};

use crate::comments::{
    PairPolicy, append_comment, comment_column, prune_empty_comment_columns, reorder_paired,
};
use crate::expr::{SingleScope, eval_condition, eval_value, looks_like_expression};
use crate::value_set::{parse_value_set, value_set_contains};

/// Apply an ordered change-rule set to the dataset in place.
///
/// Pre-existing change-comment columns are dropped first so a re-run with
/// the same rules never compounds old comments. Rules run strictly in
/// order; rule i+1 observes every mutation and comment of rules 1..i.
pub fn apply_changes(dataset: &mut Dataset, rules: &[ChangeRule]) -> Result<()> {
    dataset.retain_columns(|name| !name.ends_with(CHANGE_COMMENT_SUFFIX));
    for rule in rules {
        match rule.kind {
            ChangeRuleKind::Direct => apply_direct(dataset, rule)?,
            ChangeRuleKind::Range => apply_range(dataset, rule)?,
            ChangeRuleKind::Cross => apply_cross(dataset, rule)?,
        }
    }
    reorder_paired(dataset, &[CHANGE_COMMENT_SUFFIX], PairPolicy::ByPosition)?;
    prune_empty_comment_columns(dataset, CHANGE_COMMENT_SUFFIX);
    Ok(())
}

/// Replace values drawn from the trigger set with a fixed number.
fn apply_direct(dataset: &mut Dataset, rule: &ChangeRule) -> Result<()> {
    let Some(variable) = dataset.column_index(&rule.variable) else {
        skip(rule, &rule.variable);
        return Ok(());
    };
    let set = parse_value_set(required_trigger(rule)?)?;
    let replacement = numeric_replacement(rule)?;
    let comment_name = change_comment_column(&rule.variable);
    let mut slot = dataset.column_index(&comment_name);

    for row in 0..dataset.height() {
        if !value_set_contains(&set, dataset.value(row, variable)) {
            continue;
        }
        dataset.set_value(row, variable, CellValue::Number(replacement));
        let column = comment_column(dataset, &comment_name, &mut slot)?;
        append_comment(dataset, row, column, &rule.comment);
    }
    Ok(())
}

/// Replace values matching a boolean expression with the result of the
/// replacement expression (a literal number or a formula over the same
/// variable).
fn apply_range(dataset: &mut Dataset, rule: &ChangeRule) -> Result<()> {
    let Some(variable) = dataset.column_index(&rule.variable) else {
        skip(rule, &rule.variable);
        return Ok(());
    };
    let condition = rule
        .condition
        .as_deref()
        .ok_or_else(|| malformed(rule, "range substitution requires a condition expression"))?;
    let replacement = rule
        .replacement
        .as_ref()
        .ok_or_else(|| malformed(rule, "range substitution requires a replacement"))?;
    let comment_name = change_comment_column(&rule.variable);
    let mut slot = dataset.column_index(&comment_name);

    for row in 0..dataset.height() {
        let current = dataset.value(row, variable).clone();
        let scope = SingleScope::new(&rule.variable, &current);
        if !eval_condition(condition, &scope) {
            continue;
        }
        let next = match replacement {
            ValueSpec::Number(number) => CellValue::Number(*number),
            ValueSpec::Text(expression) => match eval_value(expression, &scope) {
                Some(value) => value,
                // eval_value already logged the failure; leave the row as-is.
                None => continue,
            },
            ValueSpec::List(_) => {
                return Err(malformed(rule, "replacement must be a number or expression"));
            }
        };
        dataset.set_value(row, variable, next);
        let column = comment_column(dataset, &comment_name, &mut slot)?;
        append_comment(dataset, row, column, &rule.comment);
    }
    Ok(())
}

/// Replace values drawn from the trigger set when the cross variable's own
/// condition (value list or expression, auto-detected) also holds.
fn apply_cross(dataset: &mut Dataset, rule: &ChangeRule) -> Result<()> {
    let cross_name = rule
        .cross_variable
        .as_deref()
        .ok_or_else(|| malformed(rule, "cross substitution requires a cross variable"))?;
    let Some(variable) = dataset.column_index(&rule.variable) else {
        skip(rule, &rule.variable);
        return Ok(());
    };
    let Some(cross) = dataset.column_index(cross_name) else {
        skip(rule, cross_name);
        return Ok(());
    };
    let condition = rule
        .cross_condition
        .as_deref()
        .ok_or_else(|| malformed(rule, "cross substitution requires a cross condition"))?;
    let set = parse_value_set(required_trigger(rule)?)?;
    let replacement = numeric_replacement(rule)?;
    let cross_set = if looks_like_expression(condition) {
        None
    } else {
        Some(parse_value_set(&ValueSpec::Text(condition.to_string()))?)
    };
    let comment_name = change_comment_column(&rule.variable);
    let mut slot = dataset.column_index(&comment_name);

    for row in 0..dataset.height() {
        if !value_set_contains(&set, dataset.value(row, variable)) {
            continue;
        }
        let cross_value = dataset.value(row, cross).clone();
        let cross_holds = match &cross_set {
            Some(values) => value_set_contains(values, &cross_value),
            None => eval_condition(condition, &SingleScope::new(cross_name, &cross_value)),
        };
        if !cross_holds {
            continue;
        }
        dataset.set_value(row, variable, CellValue::Number(replacement));
        let column = comment_column(dataset, &comment_name, &mut slot)?;
        append_comment(dataset, row, column, &rule.comment);
    }
    Ok(())
}

fn required_trigger(rule: &ChangeRule) -> Result<&ValueSpec> {
    rule.trigger_values
        .as_ref()
        .ok_or_else(|| malformed(rule, "substitution requires trigger values"))
}

fn numeric_replacement(rule: &ChangeRule) -> Result<f64> {
    match rule.replacement.as_ref() {
        Some(ValueSpec::Number(number)) => Ok(*number),
        Some(ValueSpec::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| malformed(rule, "replacement is not numeric")),
        _ => Err(malformed(rule, "substitution requires a numeric replacement")),
    }
}

fn malformed(rule: &ChangeRule, reason: &str) -> QcError {
    QcError::MalformedRule {
        comment: rule.comment.clone(),
        reason: reason.to_string(),
    }
}

fn skip(rule: &ChangeRule, missing: &str) {
    tracing::warn!(
        variable = missing,
        comment = %rule.comment,
        "change rule skipped: variable not in dataset"
    );
}
