//! Behavioural tests for the warning pass.

use sqc_engine::{apply_changes, apply_warnings};
use sqc_model::{
    CellValue, ChangeRule, ChangeRuleKind, Dataset, ValueSpec, WarningRule, WarningRuleKind,
};

fn base_rule(kind: WarningRuleKind, variable: &str, comment: &str) -> WarningRule {
    WarningRule {
        kind,
        variable: variable.to_string(),
        lower: None,
        upper: None,
        valid_values: None,
        cross_variable: None,
        cross_values: None,
        formula: None,
        formula_variables: Vec::new(),
        comment_variable: None,
        comment: comment.to_string(),
    }
}

fn range_rule(variable: &str, lower: f64, upper: f64, comment: &str) -> WarningRule {
    WarningRule {
        lower: Some(lower),
        upper: Some(upper),
        ..base_rule(WarningRuleKind::Range, variable, comment)
    }
}

fn bmi_dataset() -> Dataset {
    Dataset::from_rows(
        ["id", "bmi"],
        vec![
            vec![CellValue::Number(1.0), CellValue::Number(5.0)],
            vec![CellValue::Number(2.0), CellValue::Number(777.0)],
            vec![CellValue::Number(3.0), CellValue::Number(25.0)],
        ],
    )
    .unwrap()
}

#[test]
fn range_check_flags_and_filters() {
    let mut dataset = bmi_dataset();
    let rules = [range_rule("bmi", 16.0, 50.0, "BMI out of range")];
    let flagged = apply_warnings(&mut dataset, &rules).unwrap();

    // The annotated dataset keeps every row; the comment column sits right
    // after its source variable.
    assert_eq!(dataset.height(), 3);
    assert_eq!(dataset.column_names(), ["id", "bmi", "bmi.data.warning"]);
    let comment = dataset.column_index("bmi.data.warning").unwrap();
    assert_eq!(
        dataset.value(0, comment),
        &CellValue::Text("BMI out of range".into())
    );
    assert_eq!(dataset.value(1, comment), &CellValue::Missing);
    assert_eq!(dataset.value(2, comment), &CellValue::Missing);

    // The returned dataset is reduced to flagged rows.
    assert_eq!(flagged.height(), 1);
    let id = flagged.column_index("id").unwrap();
    assert_eq!(flagged.value(0, id), &CellValue::Number(1.0));
}

#[test]
fn sentinel_codes_are_exempt_from_range_checks() {
    for sentinel in [666.0, 777.0, 888.0] {
        let mut dataset = Dataset::from_rows(
            ["bmi"],
            vec![vec![CellValue::Number(sentinel)]],
        )
        .unwrap();
        let rules = [range_rule("bmi", 16.0, 50.0, "BMI out of range")];
        let flagged = apply_warnings(&mut dataset, &rules).unwrap();
        assert_eq!(flagged.height(), 0, "sentinel {sentinel} must not flag");
        assert!(!dataset.has_column("bmi.data.warning"));
    }
}

#[test]
fn value_set_check_flags_non_members() {
    let mut dataset = Dataset::from_rows(
        ["sex"],
        vec![
            vec![CellValue::Text("M".into())],
            vec![CellValue::Text("X".into())],
            vec![CellValue::Missing],
        ],
    )
    .unwrap();
    let rules = [WarningRule {
        valid_values: Some(ValueSpec::Text("M,F".to_string())),
        ..base_rule(WarningRuleKind::ValueSet, "sex", "Sex outside codelist")
    }];
    let flagged = apply_warnings(&mut dataset, &rules).unwrap();

    let comment = dataset.column_index("sex.data.warning").unwrap();
    assert!(dataset.value(0, comment).is_missing());
    assert!(!dataset.value(1, comment).is_missing());
    // A missing value is not a member either.
    assert!(!dataset.value(2, comment).is_missing());
    assert_eq!(flagged.height(), 2);
}

fn pregnancy_dataset() -> Dataset {
    Dataset::from_rows(
        ["id", "pregnant", "sex"],
        vec![
            vec![
                CellValue::Number(1.0),
                CellValue::Number(1.0),
                CellValue::Number(1.0),
            ],
            vec![
                CellValue::Number(2.0),
                CellValue::Number(1.0),
                CellValue::Number(2.0),
            ],
            vec![
                CellValue::Number(3.0),
                CellValue::Number(0.0),
                CellValue::Number(1.0),
            ],
            vec![
                CellValue::Number(4.0),
                CellValue::Number(1.0),
                CellValue::Missing,
            ],
        ],
    )
    .unwrap()
}

fn pregnancy_rule() -> WarningRule {
    WarningRule {
        cross_variable: Some("pregnant".to_string()),
        cross_values: Some("1".to_string()),
        formula: Some("sex == 2".to_string()),
        formula_variables: vec!["sex".to_string()],
        ..base_rule(
            WarningRuleKind::Formula,
            "sex",
            "Pregnancy recorded for non-female subject",
        )
    }
}

#[test]
fn formula_check_flags_only_disproven_rows() {
    let mut dataset = pregnancy_dataset();
    let flagged = apply_warnings(&mut dataset, &[pregnancy_rule()]).unwrap();

    let comment = dataset.column_index("sex.data.warning").unwrap();
    // Row 0: pregnant and sex != 2 — the formula is disproven, flag.
    assert!(!dataset.value(0, comment).is_missing());
    // Row 1: formula holds.
    assert!(dataset.value(1, comment).is_missing());
    // Row 2: cross variable does not match.
    assert!(dataset.value(2, comment).is_missing());
    // Row 3: formula is unevaluable (missing sex) — never flagged.
    assert!(dataset.value(3, comment).is_missing());

    assert_eq!(flagged.height(), 1);
}

#[test]
fn formula_check_skips_entirely_on_missing_dependency() {
    let mut dataset = pregnancy_dataset();
    let mut rule = pregnancy_rule();
    rule.formula = Some("sex == 2 & age > 10".to_string());
    rule.formula_variables = vec!["sex".to_string(), "age".to_string()];
    let flagged = apply_warnings(&mut dataset, &[rule]).unwrap();

    assert!(!dataset.has_column("sex.data.warning"));
    assert_eq!(flagged.height(), 0);
}

#[test]
fn cross_values_may_be_an_expression() {
    let mut dataset = pregnancy_dataset();
    let mut rule = pregnancy_rule();
    rule.cross_values = Some("pregnant >= 1".to_string());
    apply_warnings(&mut dataset, &[rule]).unwrap();

    let comment = dataset.column_index("sex.data.warning").unwrap();
    assert!(!dataset.value(0, comment).is_missing());
    assert!(dataset.value(1, comment).is_missing());
}

#[test]
fn comment_target_may_differ_from_checked_variable() {
    let mut dataset = Dataset::from_rows(
        ["height", "bmi"],
        vec![vec![CellValue::Number(999.0), CellValue::Number(22.0)]],
    )
    .unwrap();
    let rules = [WarningRule {
        comment_variable: Some("bmi".to_string()),
        ..range_rule("height", 100.0, 220.0, "Implausible height")
    }];
    apply_warnings(&mut dataset, &rules).unwrap();

    assert!(dataset.has_column("bmi.data.warning"));
    assert!(!dataset.has_column("height.data.warning"));
    // The ByName reorder seats the column next to the comment target.
    assert_eq!(
        dataset.column_names(),
        ["height", "bmi", "bmi.data.warning"]
    );
}

#[test]
fn stray_comment_columns_are_dropped_before_the_run() {
    let mut dataset = Dataset::from_rows(
        ["bmi", "Comments2019", "bmi.data.warning"],
        vec![vec![
            CellValue::Number(25.0),
            CellValue::Text("old note".into()),
            CellValue::Text("stale".into()),
        ]],
    )
    .unwrap();
    apply_warnings(&mut dataset, &[]).unwrap();
    assert_eq!(dataset.column_names(), ["bmi"]);
}

#[test]
fn change_comments_keep_rows_in_the_filtered_output() {
    let mut dataset = Dataset::from_rows(
        ["id", "sex", "bmi"],
        vec![
            vec![
                CellValue::Number(1.0),
                CellValue::Number(9.0),
                CellValue::Number(25.0),
            ],
            vec![
                CellValue::Number(2.0),
                CellValue::Number(1.0),
                CellValue::Number(30.0),
            ],
        ],
    )
    .unwrap();
    let change_rules = [ChangeRule {
        kind: ChangeRuleKind::Direct,
        variable: "sex".to_string(),
        trigger_values: Some(ValueSpec::Text("9".to_string())),
        condition: None,
        replacement: Some(ValueSpec::Number(888.0)),
        cross_variable: None,
        cross_condition: None,
        comment: "Unknown sex recoded".to_string(),
    }];
    apply_changes(&mut dataset, &change_rules).unwrap();

    // No warning rule fires, but the corrected row still reaches the
    // review output through its change comment.
    let flagged = apply_warnings(&mut dataset, &[range_rule("bmi", 16.0, 50.0, "BMI")]).unwrap();
    assert_eq!(flagged.height(), 1);
    let id = flagged.column_index("id").unwrap();
    assert_eq!(flagged.value(0, id), &CellValue::Number(1.0));
}
