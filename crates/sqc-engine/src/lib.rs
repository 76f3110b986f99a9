//! Rule-application engine for study QC.
//!
//! Interprets ordered tables of heterogeneous rule rows, dispatches each to
//! its kind's handler, mutates the dataset in place, and maintains
//! comment-column bookkeeping (creation, accumulation, pruning, pairing
//! reorder). Rule application is strictly sequential: later rules see
//! earlier rules' mutations and comments.

pub mod changes;
pub mod comments;
pub mod expr;
pub mod value_set;
pub mod warnings;

pub use changes::apply_changes;
pub use comments::{
    PairPolicy, append_comment, ensure_comment_column, prune_empty_comment_columns, reorder_paired,
};
pub use expr::{
    ExprError, RowScope, Scope, SingleScope, eval_condition, eval_tristate, eval_value,
};
pub use value_set::{parse_value_set, value_set_contains};
pub use warnings::apply_warnings;
