//! Per-study summary aggregation.
//!
//! Tallies distinct comment strings across the comment columns into
//! frequency tables and checks dictionary coverage, producing a versioned
//! payload for the export layer. `BTreeMap` keeps the tallies in a
//! deterministic order.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;

use sqc_model::{CHANGE_COMMENT_SUFFIX, CellValue, Dataset, WARNING_COMMENT_SUFFIX};

const SUMMARY_SCHEMA: &str = "study-qc.summary";
const SUMMARY_SCHEMA_VERSION: u32 = 1;

/// One data-dictionary record; only the variable name and its category are
/// needed for the coverage check.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DictionaryEntry {
    pub variable: String,
    pub category: String,
}

/// Frequency of each distinct comment string across every column carrying
/// `suffix`. A cell accumulating several comments counts as one distinct
/// string, matching the downstream report format.
pub fn comment_frequencies(dataset: &Dataset, suffix: &str) -> BTreeMap<String, u64> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for (index, name) in dataset.column_names().iter().enumerate() {
        if !name.ends_with(suffix) {
            continue;
        }
        for row in dataset.rows() {
            match &row[index] {
                CellValue::Missing => {}
                value => {
                    let text = value.token();
                    if !text.is_empty() {
                        *counts.entry(text).or_insert(0) += 1;
                    }
                }
            }
        }
    }
    counts
}

/// Dictionary variables absent from the dataset, in dictionary order. An
/// empty result means none are missing.
pub fn missing_dictionary_variables(
    dataset: &Dataset,
    dictionary: &[DictionaryEntry],
) -> Vec<String> {
    dictionary
        .iter()
        .filter(|entry| !dataset.has_column(&entry.variable))
        .map(|entry| entry.variable.clone())
        .collect()
}

/// Versioned summary payload handed to the export collaborator.
#[derive(Debug, Serialize)]
pub struct StudySummary {
    pub schema: &'static str,
    pub schema_version: u32,
    pub generated_at: String,
    pub study_id: String,
    /// Frequency of change comments across all `.data.change` columns.
    pub change_counts: BTreeMap<String, u64>,
    /// Frequency of warning comments across all `.data.warning` columns.
    pub warning_counts: BTreeMap<String, u64>,
    /// Dictionary variables absent from the dataset.
    pub missing_variables: Vec<String>,
}

pub fn build_study_summary(
    study_id: &str,
    dataset: &Dataset,
    dictionary: &[DictionaryEntry],
) -> StudySummary {
    StudySummary {
        schema: SUMMARY_SCHEMA,
        schema_version: SUMMARY_SCHEMA_VERSION,
        generated_at: Utc::now().to_rfc3339(),
        study_id: study_id.to_string(),
        change_counts: comment_frequencies(dataset, CHANGE_COMMENT_SUFFIX),
        warning_counts: comment_frequencies(dataset, WARNING_COMMENT_SUFFIX),
        missing_variables: missing_dictionary_variables(dataset, dictionary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotated_dataset() -> Dataset {
        Dataset::from_rows(
            ["id", "bmi", "bmi.data.change", "sex.data.warning"],
            vec![
                vec![
                    CellValue::Number(1.0),
                    CellValue::Number(20.0),
                    CellValue::Text("BMI recoded".into()),
                    CellValue::Missing,
                ],
                vec![
                    CellValue::Number(2.0),
                    CellValue::Number(25.0),
                    CellValue::Text("BMI recoded".into()),
                    CellValue::Text("Sex outside codelist".into()),
                ],
            ],
        )
        .unwrap()
    }

    #[test]
    fn frequencies_tally_distinct_comment_strings() {
        let dataset = annotated_dataset();
        let changes = comment_frequencies(&dataset, CHANGE_COMMENT_SUFFIX);
        assert_eq!(changes.get("BMI recoded"), Some(&2));
        let warnings = comment_frequencies(&dataset, WARNING_COMMENT_SUFFIX);
        assert_eq!(warnings.get("Sex outside codelist"), Some(&1));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn missing_variables_preserve_dictionary_order() {
        let dataset = annotated_dataset();
        let dictionary = vec![
            DictionaryEntry {
                variable: "weight".into(),
                category: "anthropometry".into(),
            },
            DictionaryEntry {
                variable: "bmi".into(),
                category: "anthropometry".into(),
            },
            DictionaryEntry {
                variable: "height".into(),
                category: "anthropometry".into(),
            },
        ];
        assert_eq!(
            missing_dictionary_variables(&dataset, &dictionary),
            ["weight", "height"]
        );
    }

    #[test]
    fn summary_serializes() {
        let dataset = annotated_dataset();
        let summary = build_study_summary("STUDY01", &dataset, &[]);
        let json = serde_json::to_string(&summary).expect("serialize summary");
        assert!(json.contains("\"schema\":\"study-qc.summary\""));
        assert!(json.contains("STUDY01"));
    }
}
