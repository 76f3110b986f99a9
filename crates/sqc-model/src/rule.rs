//! Rule records for the change and warning passes.
//!
//! Rule tables are operator-controlled configuration artifacts. Records are
//! immutable once loaded and carry a kind tag that selects the handler; a
//! rule set is an ordered sequence and order is significant (later rules see
//! earlier rules' mutations and comments).

/// A rule field holding "valid/trigger values": a bare number, a
/// comma-delimited string, or an already-split array of either.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    Number(f64),
    Text(String),
    List(Vec<ValueSpec>),
}

/// Change-rule kinds. An unknown tag in a rule table fails deserialization,
/// which is the "unrecognized kind" configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRuleKind {
    /// Replace values drawn from a trigger set with a fixed number.
    Direct,
    /// Replace values matching a boolean expression with the result of a
    /// replacement expression.
    Range,
    /// Replace values drawn from a trigger set when a second variable's own
    /// condition also holds.
    Cross,
}

/// A rule that mutates a variable's value when its condition holds, and
/// records why in the variable's change-comment column.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChangeRule {
    pub kind: ChangeRuleKind,
    /// Target variable (dataset column) the rule mutates.
    pub variable: String,
    /// Values that trigger the substitution (`Direct` and `Cross`).
    #[serde(default)]
    pub trigger_values: Option<ValueSpec>,
    /// Boolean expression over the target variable (`Range`).
    #[serde(default)]
    pub condition: Option<String>,
    /// Replacement: a number, or for `Range` rules optionally an expression
    /// over the target variable.
    #[serde(default)]
    pub replacement: Option<ValueSpec>,
    /// Second variable consulted by `Cross` rules.
    #[serde(default)]
    pub cross_variable: Option<String>,
    /// The cross variable's own condition: a value list or an expression.
    #[serde(default)]
    pub cross_condition: Option<String>,
    /// Provenance comment appended next to every mutated field.
    pub comment: String,
}

/// Warning-rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningRuleKind {
    /// Flag numeric values outside configured bounds.
    Range,
    /// Flag values outside a valid set.
    ValueSet,
    /// Flag rows where a cross variable matches but a row formula fails.
    Formula,
}

/// A rule that annotates (never mutates) rows needing manual review.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WarningRule {
    pub kind: WarningRuleKind,
    /// Variable the check reads.
    pub variable: String,
    /// Inclusive lower bound (`Range`). Absent means unbounded below.
    #[serde(default)]
    pub lower: Option<f64>,
    /// Inclusive upper bound (`Range`). Absent means unbounded above.
    #[serde(default)]
    pub upper: Option<f64>,
    /// Valid values (`ValueSet`).
    #[serde(default)]
    pub valid_values: Option<ValueSpec>,
    /// Cross variable consulted by `Formula` rules.
    #[serde(default)]
    pub cross_variable: Option<String>,
    /// Expected cross-variable values: a numeric list, a string list, or an
    /// expression, told apart by literal inspection.
    #[serde(default)]
    pub cross_values: Option<String>,
    /// Boolean formula evaluated against the whole row (`Formula`).
    #[serde(default)]
    pub formula: Option<String>,
    /// Every variable the formula references; all must be present for the
    /// rule to run at all.
    #[serde(default)]
    pub formula_variables: Vec<String>,
    /// Variable whose warning-comment column receives the annotation.
    /// Defaults to `variable`.
    #[serde(default)]
    pub comment_variable: Option<String>,
    /// Comment appended for every flagged row.
    pub comment: String,
}

impl WarningRule {
    /// The variable whose `.data.warning` column this rule writes to.
    pub fn comment_target(&self) -> &str {
        self.comment_variable.as_deref().unwrap_or(&self.variable)
    }
}
