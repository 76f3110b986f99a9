pub mod comment;
pub mod error;
pub mod rule;
pub mod table;

pub use comment::{
    CHANGE_COMMENT_SUFFIX, COMMENT_SEPARATOR, WARNING_COMMENT_SUFFIX, change_comment_column,
    comment_source, is_comment_column, warning_comment_column,
};
pub use error::{QcError, Result};
pub use rule::{ChangeRule, ChangeRuleKind, ValueSpec, WarningRule, WarningRuleKind};
pub use table::{CellValue, Dataset};
