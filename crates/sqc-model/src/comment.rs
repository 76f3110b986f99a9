//! Comment-column naming shared by the engine and the report layer.

/// Suffix of columns recording why a value was changed.
pub const CHANGE_COMMENT_SUFFIX: &str = ".data.change";

/// Suffix of columns recording why a row was flagged for review.
pub const WARNING_COMMENT_SUFFIX: &str = ".data.warning";

/// Separator between accumulated comments in one cell. The surrounding
/// spaces are part of the contract; downstream parsing splits on it.
pub const COMMENT_SEPARATOR: &str = " | ";

pub fn change_comment_column(variable: &str) -> String {
    format!("{variable}{CHANGE_COMMENT_SUFFIX}")
}

pub fn warning_comment_column(variable: &str) -> String {
    format!("{variable}{WARNING_COMMENT_SUFFIX}")
}

/// The source variable a comment column annotates, if `column` carries the
/// given suffix.
pub fn comment_source<'a>(column: &'a str, suffix: &str) -> Option<&'a str> {
    column.strip_suffix(suffix)
}

/// Whether a column is a change- or warning-comment column.
pub fn is_comment_column(name: &str) -> bool {
    name.ends_with(CHANGE_COMMENT_SUFFIX) || name.ends_with(WARNING_COMMENT_SUFFIX)
}
