//! Comment-column bookkeeping: creation, accumulation, pruning, and the
//! pairing reorder that seats each comment column next to its source
//! variable.

use sqc_model::{CellValue, COMMENT_SEPARATOR, Dataset, Result};

/// How comment columns are paired with data columns during reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairPolicy {
    /// Pair the i-th comment column with the i-th data column. Used for the
    /// initial change-comment arrangement, before variable-derived naming
    /// is reliable.
    ByPosition,
    /// Pair a comment column with the data column whose name matches after
    /// stripping the suffix. Used for the final arrangement.
    ByName,
}

/// Return the index of `name`, appending a null-filled column when absent.
pub fn ensure_comment_column(dataset: &mut Dataset, name: &str) -> Result<usize> {
    match dataset.column_index(name) {
        Some(index) => Ok(index),
        None => dataset.add_column(name, CellValue::Missing),
    }
}

/// Column lookup-or-create with a per-rule cache, so a handler creates its
/// comment column lazily on the first matching row only.
pub(crate) fn comment_column(
    dataset: &mut Dataset,
    name: &str,
    slot: &mut Option<usize>,
) -> Result<usize> {
    if let Some(index) = *slot {
        return Ok(index);
    }
    let index = ensure_comment_column(dataset, name)?;
    *slot = Some(index);
    Ok(index)
}

/// Set the cell to `text`, or append with the ` | ` separator when a
/// comment is already present.
pub fn append_comment(dataset: &mut Dataset, row: usize, column: usize, text: &str) {
    let current = dataset.value(row, column);
    let next = if current.is_missing() || current.token().is_empty() {
        text.to_string()
    } else {
        format!("{}{COMMENT_SEPARATOR}{text}", current.token())
    };
    dataset.set_value(row, column, CellValue::Text(next));
}

/// Drop every column carrying `suffix` whose value is missing in all rows
/// (no rule ever matched for that variable). Survivor order is preserved.
pub fn prune_empty_comment_columns(dataset: &mut Dataset, suffix: &str) {
    let mut empty: Vec<String> = Vec::new();
    for (index, name) in dataset.column_names().iter().enumerate() {
        if !name.ends_with(suffix) {
            continue;
        }
        let all_missing = dataset.rows().iter().all(|row| row[index].is_missing());
        if all_missing {
            empty.push(name.clone());
        }
    }
    if !empty.is_empty() {
        dataset.retain_columns(|name| !empty.iter().any(|dropped| dropped == name));
    }
}

/// Produce a column order where each comment column (any of `suffixes`)
/// sits immediately after the data column it annotates. Unmatched comment
/// columns pass through at the position the policy dictates; unmatched data
/// columns are untouched.
pub fn reorder_paired(dataset: &mut Dataset, suffixes: &[&str], policy: PairPolicy) -> Result<()> {
    let names: Vec<String> = dataset.column_names().to_vec();
    let is_comment =
        |name: &str| suffixes.iter().any(|suffix| name.ends_with(suffix));

    let order: Vec<usize> = match policy {
        PairPolicy::ByPosition => {
            let data: Vec<usize> = (0..names.len()).filter(|&i| !is_comment(&names[i])).collect();
            let comments: Vec<usize> =
                (0..names.len()).filter(|&i| is_comment(&names[i])).collect();
            let paired = data.len().min(comments.len());
            let mut order = Vec::with_capacity(names.len());
            for i in 0..paired {
                order.push(data[i]);
                order.push(comments[i]);
            }
            order.extend(&data[paired..]);
            order.extend(&comments[paired..]);
            order
        }
        PairPolicy::ByName => {
            let mut placed = vec![false; names.len()];
            let mut order = Vec::with_capacity(names.len());
            for (index, name) in names.iter().enumerate() {
                if placed[index] {
                    continue;
                }
                placed[index] = true;
                order.push(index);
                if is_comment(name) {
                    continue;
                }
                for suffix in suffixes {
                    let paired = format!("{name}{suffix}");
                    if let Some(comment_index) = names.iter().position(|n| *n == paired)
                        && !placed[comment_index]
                    {
                        placed[comment_index] = true;
                        order.push(comment_index);
                    }
                }
            }
            order
        }
    };

    dataset.reorder_columns(&order)
}
