//! Dense ranking and the lists-of-structs transform built on it.

mod transform;

use std::cmp::Ordering;

use arrow::array::{Array, ArrayRef, UInt32Array};

pub use transform::{transform_lists_of_structs, RankTransform};

use crate::{
    context::ComputeContext,
    error::RowCmpError,
    lexicographic::PreprocessedTable,
    logging::rowcmp_log,
    option::{NullOrder, Order},
};

/// Dense, 0-based, ascending rank of every row of `column`.
///
/// Rows that compare equal under the lexicographic comparator share a rank and
/// ranks have no gaps. Null rows get a null rank. `null_order` only decides how
/// nulls nested inside the ranked values are ordered.
///
/// # Errors
/// Fails when `column` cannot be ordered lexicographically.
pub fn dense_rank(
    column: &ArrayRef,
    null_order: NullOrder,
    ctx: &ComputeContext,
) -> Result<UInt32Array, RowCmpError> {
    let table = PreprocessedTable::create(
        std::slice::from_ref(column),
        &[Order::Ascending],
        &[null_order],
        ctx,
    )?;
    let comparator = table.comparator();

    let mut sorted: Vec<usize> = (0..column.len()).filter(|&row| column.is_valid(row)).collect();
    sorted.sort_by(|&a, &b| comparator.compare(a, b));

    let mut ranks = vec![0u32; column.len()];
    let mut rank = 0u32;
    for (pos, &row) in sorted.iter().enumerate() {
        if pos > 0 && comparator.compare(sorted[pos - 1], row) != Ordering::Equal {
            rank += 1;
        }
        ranks[row] = rank;
    }

    rowcmp_log!(
        log::Level::Debug,
        ctx: ctx.log(),
        "dense_rank",
        "rows={} distinct={}",
        column.len(),
        if sorted.is_empty() { 0 } else { rank as usize + 1 }
    );
    Ok(UInt32Array::new(ranks.into(), column.nulls().cloned()))
}
