//! Warning-rule handlers: checks that annotate rows for manual review.
//! They never mutate the checked variable, only a warning-comment column
//! (which may belong to a different variable than the one checked).

use sqc_model::{
    CHANGE_COMMENT_SUFFIX, CellValue, Dataset, QcError, Result, WARNING_COMMENT_SUFFIX,
    WarningRule, WarningRuleKind, warning_comment_column,
};

use crate::comments::{
    PairPolicy, append_comment, comment_column, prune_empty_comment_columns, reorder_paired,
};
use crate::expr::{RowScope, SingleScope, eval_condition, eval_tristate};
use crate::value_set::{parse_value_set, value_set_contains};

/// Codes meaning not-applicable / refused / unknown. Always exempt from
/// range checks.
const SENTINEL_CODES: [f64; 3] = [666.0, 777.0, 888.0];

/// Apply an ordered warning-rule set.
///
/// The dataset is annotated in place (pre-existing warning columns and
/// stray `Comments*` columns are dropped first, so re-runs are safe). The
/// returned dataset is a copy filtered to rows carrying at least one
/// comment — a reporting-scope reduction; the annotated dataset keeps every
/// row.
pub fn apply_warnings(dataset: &mut Dataset, rules: &[WarningRule]) -> Result<Dataset> {
    dataset.retain_columns(|name| {
        !name.ends_with(WARNING_COMMENT_SUFFIX) && !name.starts_with("Comments")
    });
    for rule in rules {
        match rule.kind {
            WarningRuleKind::Range => check_range(dataset, rule)?,
            WarningRuleKind::ValueSet => check_value_set(dataset, rule)?,
            WarningRuleKind::Formula => check_formula(dataset, rule)?,
        }
    }
    reorder_paired(dataset, &[WARNING_COMMENT_SUFFIX], PairPolicy::ByName)?;
    reorder_paired(
        dataset,
        &[CHANGE_COMMENT_SUFFIX, WARNING_COMMENT_SUFFIX],
        PairPolicy::ByName,
    )?;
    prune_empty_comment_columns(dataset, WARNING_COMMENT_SUFFIX);
    flagged_rows(dataset)
}

/// Flag numeric values outside the configured bounds. Missing values,
/// non-numeric text, and the sentinel codes are exempt.
fn check_range(dataset: &mut Dataset, rule: &WarningRule) -> Result<()> {
    let Some(variable) = dataset.column_index(&rule.variable) else {
        skip(rule, &rule.variable);
        return Ok(());
    };
    if rule.lower.is_none() && rule.upper.is_none() {
        return Err(malformed(rule, "range check requires at least one bound"));
    }
    let comment_name = warning_comment_column(rule.comment_target());
    let mut slot = dataset.column_index(&comment_name);

    for row in 0..dataset.height() {
        let Some(value) = dataset.value(row, variable).as_number() else {
            continue;
        };
        if SENTINEL_CODES.contains(&value) {
            continue;
        }
        let below = rule.lower.is_some_and(|lower| value < lower);
        let above = rule.upper.is_some_and(|upper| value > upper);
        if below || above {
            let column = comment_column(dataset, &comment_name, &mut slot)?;
            append_comment(dataset, row, column, &rule.comment);
        }
    }
    Ok(())
}

/// Flag every row whose value is not a member of the valid set.
fn check_value_set(dataset: &mut Dataset, rule: &WarningRule) -> Result<()> {
    let Some(variable) = dataset.column_index(&rule.variable) else {
        skip(rule, &rule.variable);
        return Ok(());
    };
    let spec = rule
        .valid_values
        .as_ref()
        .ok_or_else(|| malformed(rule, "value-set check requires valid values"))?;
    let set = parse_value_set(spec)?;
    let comment_name = warning_comment_column(rule.comment_target());
    let mut slot = dataset.column_index(&comment_name);

    for row in 0..dataset.height() {
        if value_set_contains(&set, dataset.value(row, variable)) {
            continue;
        }
        let column = comment_column(dataset, &comment_name, &mut slot)?;
        append_comment(dataset, row, column, &rule.comment);
    }
    Ok(())
}

/// Flag rows where the cross variable matches its expected values but the
/// row formula fails. Stricter than the single-variable checks: the target,
/// the cross variable, and every formula variable must be present or the
/// whole rule is disabled.
fn check_formula(dataset: &mut Dataset, rule: &WarningRule) -> Result<()> {
    let cross_name = rule
        .cross_variable
        .as_deref()
        .ok_or_else(|| malformed(rule, "formula check requires a cross variable"))?;
    let formula = rule
        .formula
        .as_deref()
        .ok_or_else(|| malformed(rule, "formula check requires a formula"))?;
    let cross_values = rule
        .cross_values
        .as_deref()
        .ok_or_else(|| malformed(rule, "formula check requires expected cross values"))?;

    let Some(cross) = dataset.column_index(cross_name) else {
        skip(rule, cross_name);
        return Ok(());
    };
    let mut required: Vec<&str> = vec![rule.variable.as_str()];
    required.extend(rule.formula_variables.iter().map(String::as_str));
    if let Some(missing) = required.iter().find(|name| !dataset.has_column(name)) {
        skip(rule, missing);
        return Ok(());
    }

    let matcher = CrossMatcher::classify(cross_values);
    let comment_name = warning_comment_column(rule.comment_target());
    let mut slot = dataset.column_index(&comment_name);

    for row in 0..dataset.height() {
        let cross_value = dataset.value(row, cross).clone();
        if !matcher.matches(cross_name, &cross_value) {
            continue;
        }
        // The formula "holds" unless it evaluates to literal false:
        // evaluation errors and missing operands never flag a row.
        let fails = eval_tristate(formula, &RowScope::new(dataset, row)) == Some(false);
        if fails {
            let column = comment_column(dataset, &comment_name, &mut slot)?;
            append_comment(dataset, row, column, &rule.comment);
        }
    }
    Ok(())
}

/// Interpretation of a formula rule's expected cross-variable values,
/// selected by inspecting the literal form.
enum CrossMatcher {
    /// Pure-numeric comma list: value-set membership on numbers.
    Numbers(Vec<f64>),
    /// Looks like an expression: evaluate with the cross variable bound.
    Expression(String),
    /// Anything else: value-set membership on strings.
    Texts(Vec<String>),
}

impl CrossMatcher {
    fn classify(spec: &str) -> Self {
        let tokens: Vec<&str> = spec.split(',').map(str::trim).collect();
        let numbers: Vec<f64> = tokens
            .iter()
            .filter_map(|token| token.parse::<f64>().ok())
            .collect();
        if !tokens.is_empty() && numbers.len() == tokens.len() {
            return Self::Numbers(numbers);
        }
        let expression_like = spec
            .chars()
            .any(|ch| !ch.is_alphanumeric() && ch != ',' && !ch.is_whitespace());
        if expression_like {
            Self::Expression(spec.to_string())
        } else {
            Self::Texts(tokens.iter().map(|token| (*token).to_string()).collect())
        }
    }

    fn matches(&self, cross_name: &str, value: &CellValue) -> bool {
        match self {
            Self::Numbers(numbers) => value
                .as_number()
                .is_some_and(|number| numbers.contains(&number)),
            Self::Expression(expression) => {
                eval_condition(expression, &SingleScope::new(cross_name, value))
            }
            Self::Texts(texts) => {
                !value.is_missing() && texts.iter().any(|text| value.token() == *text)
            }
        }
    }
}

/// Copy of the dataset keeping only rows with at least one comment across
/// all change- and warning-comment columns.
fn flagged_rows(dataset: &Dataset) -> Result<Dataset> {
    let comment_columns: Vec<usize> = dataset
        .column_names()
        .iter()
        .enumerate()
        .filter(|(_, name)| sqc_model::is_comment_column(name))
        .map(|(index, _)| index)
        .collect();
    let rows: Vec<Vec<CellValue>> = dataset
        .rows()
        .iter()
        .filter(|row| comment_columns.iter().any(|&column| !row[column].is_missing()))
        .cloned()
        .collect();
    Dataset::from_rows(dataset.column_names().iter().cloned(), rows)
}

fn malformed(rule: &WarningRule, reason: &str) -> QcError {
    QcError::MalformedRule {
        comment: rule.comment.clone(),
        reason: reason.to_string(),
    }
}

fn skip(rule: &WarningRule, missing: &str) {
    tracing::warn!(
        variable = missing,
        comment = %rule.comment,
        "warning rule skipped: variable not in dataset"
    );
}
