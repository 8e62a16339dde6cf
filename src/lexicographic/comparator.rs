use std::cmp::Ordering;

use super::{
    column::{is_null_at, LexColumn},
    PreprocessedTable,
};
use crate::{
    check::check_shape_compatibility,
    dremel::{is_null_level, DremelData},
    error::RowCmpError,
    leaf::LeafColumn,
    option::NullOrder,
};

/// Depth reported by a column whose outcome did not involve a null.
const NO_NULL: usize = usize::MAX;

/// Outcome of comparing one column. Value outcomes follow the column's
/// direction; null outcomes are placed by null precedence alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verdict {
    Value(Ordering),
    Null(Ordering),
}

/// Orders rows of one preprocessed table against each other.
#[derive(Clone, Copy, Debug)]
pub struct SelfComparator<'a> {
    table: &'a PreprocessedTable,
}

impl<'a> SelfComparator<'a> {
    /// Comparator over the rows of `table`.
    pub fn new(table: &'a PreprocessedTable) -> Self {
        Self { table }
    }

    /// Order row `lhs` against row `rhs`.
    #[inline]
    pub fn compare(&self, lhs: usize, rhs: usize) -> Ordering {
        compare_rows(self.table, lhs, self.table, rhs)
    }
}

/// Orders rows of one table against rows of another.
#[derive(Clone, Copy, Debug)]
pub struct TwoTableComparator<'a> {
    lhs: &'a PreprocessedTable,
    rhs: &'a PreprocessedTable,
}

impl<'a> TwoTableComparator<'a> {
    /// Pair two preprocessed tables.
    ///
    /// Tables from one [`PreprocessedTable::create_pair`] call always pair.
    /// Independently built tables pair only when neither carries rank columns.
    ///
    /// # Errors
    /// [`RowCmpError::ShapeMismatch`] when the tables differ in shape;
    /// [`RowCmpError::Configuration`] when their rank columns are not
    /// mutually ordered.
    pub fn new(lhs: &'a PreprocessedTable, rhs: &'a PreprocessedTable) -> Result<Self, RowCmpError> {
        check_shape_compatibility(lhs.columns(), rhs.columns())?;
        if lhs.is_joint() || rhs.is_joint() {
            if lhs.identity_token() != rhs.identity_token() {
                return Err(RowCmpError::configuration(
                    "tables were not preprocessed by the same joint call",
                ));
            }
        } else if !(lhs.is_safe_for_two_table() && rhs.is_safe_for_two_table()) {
            return Err(RowCmpError::configuration(
                "tables with ranked lists of structs must be preprocessed jointly",
            ));
        }
        Ok(Self { lhs, rhs })
    }

    /// Order row `lhs_row` of the left table against row `rhs_row` of the right.
    #[inline]
    pub fn compare(&self, lhs_row: usize, rhs_row: usize) -> Ordering {
        compare_rows(self.lhs, lhs_row, self.rhs, rhs_row)
    }
}

fn compare_rows(lhs: &PreprocessedTable, i: usize, rhs: &PreprocessedTable, j: usize) -> Ordering {
    let mut last_null_depth = NO_NULL;
    for (idx, (l, r)) in lhs.compiled.iter().zip(&rhs.compiled).enumerate() {
        let depth = lhs.depths[idx];
        // Under a struct that was null on both sides.
        if depth > last_null_depth {
            continue;
        }
        let (verdict, null_depth) = compare_column(l, i, r, j, depth, lhs.null_precedence[idx]);
        last_null_depth = null_depth;
        let ordering = match verdict {
            Verdict::Value(ordering) => lhs.column_order[idx].apply(ordering),
            Verdict::Null(ordering) => ordering,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_column(
    lhs: &LexColumn,
    i: usize,
    rhs: &LexColumn,
    j: usize,
    depth: usize,
    nulls: NullOrder,
) -> (Verdict, usize) {
    match (lhs, rhs) {
        (LexColumn::Leaf(l), LexColumn::Leaf(r)) => compare_leaf(l, i, r, j, depth, nulls),
        (
            LexColumn::Struct {
                levels: l_levels,
                leaf: l_leaf,
            },
            LexColumn::Struct {
                levels: r_levels,
                leaf: r_leaf,
            },
        ) => {
            for (k, (l_nulls, r_nulls)) in l_levels.iter().zip(r_levels).enumerate() {
                let (l_null, r_null) = (is_null_at(l_nulls, i), is_null_at(r_nulls, j));
                if l_null || r_null {
                    return (Verdict::Null(nulls.compare_nulls(l_null, r_null)), depth + k);
                }
            }
            match (l_leaf, r_leaf) {
                (Some(l), Some(r)) => compare_leaf(l, i, r, j, depth + l_levels.len(), nulls),
                _ => (Verdict::Value(Ordering::Equal), NO_NULL),
            }
        }
        (
            LexColumn::List {
                nulls: l_nulls,
                dremel: l_dremel,
                leaf: l_leaf,
            },
            LexColumn::List {
                nulls: r_nulls,
                dremel: r_dremel,
                leaf: r_leaf,
            },
        ) => {
            let (l_null, r_null) = (is_null_at(l_nulls, i), is_null_at(r_nulls, j));
            if l_null || r_null {
                return (Verdict::Null(nulls.compare_nulls(l_null, r_null)), depth);
            }
            (
                compare_lists((l_dremel, l_leaf, i), (r_dremel, r_leaf, j), nulls),
                NO_NULL,
            )
        }
        _ => unreachable!("paired tables share one decomposed shape"),
    }
}

#[inline]
fn compare_leaf(
    lhs: &LeafColumn,
    i: usize,
    rhs: &LeafColumn,
    j: usize,
    depth: usize,
    nulls: NullOrder,
) -> (Verdict, usize) {
    let (l_null, r_null) = (lhs.is_null(i), rhs.is_null(j));
    if l_null || r_null {
        return (Verdict::Null(nulls.compare_nulls(l_null, r_null)), depth);
    }
    (Verdict::Value(lhs.compare_values(i, rhs, j)), NO_NULL)
}

/// Walk two rows' level entries in lockstep. The first difference decides:
/// a list that ends earlier (lower repetition or an empty list) is smaller, a
/// null is placed by null precedence, and leaf values compare last.
fn compare_lists(
    (l_dremel, l_leaf, i): (&DremelData, &LeafColumn, usize),
    (r_dremel, r_leaf, j): (&DremelData, &LeafColumn, usize),
    nulls: NullOrder,
) -> Verdict {
    let l_range = l_dremel.row_range(i);
    let r_range = r_dremel.row_range(j);
    let max_def = l_dremel.max_def_level();

    for (a, b) in l_range.clone().zip(r_range.clone()) {
        let (l_rep, r_rep) = (l_dremel.rep_level(a), r_dremel.rep_level(b));
        if l_rep != r_rep {
            return Verdict::Value(l_rep.cmp(&r_rep));
        }
        let (l_def, r_def) = (l_dremel.def_level(a), r_dremel.def_level(b));
        if l_def != r_def {
            if is_null_level(l_def.min(r_def)) {
                return Verdict::Null(nulls.compare_nulls(l_def < r_def, r_def < l_def));
            }
            return Verdict::Value(l_def.cmp(&r_def));
        }
        if l_def == max_def {
            let ordering =
                l_leaf.compare_values(l_dremel.leaf_index(a), r_leaf, r_dremel.leaf_index(b));
            if ordering != Ordering::Equal {
                return Verdict::Value(ordering);
            }
        }
    }
    Verdict::Value(l_range.len().cmp(&r_range.len()))
}
