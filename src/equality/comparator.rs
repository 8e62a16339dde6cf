use std::ops::Range;

use arrow::buffer::{NullBuffer, OffsetBuffer};

use super::{EqColumn, EqLevel, PreprocessedTable};
use crate::{
    check::check_shape_compatibility,
    error::RowCmpError,
    option::{EqualityOptions, NullEquality},
};

/// Tests rows of one preprocessed table for equality.
#[derive(Clone, Copy, Debug)]
pub struct SelfComparator<'a> {
    table: &'a PreprocessedTable,
    options: EqualityOptions,
}

impl<'a> SelfComparator<'a> {
    /// Comparator over the rows of `table`.
    pub fn new(table: &'a PreprocessedTable, options: EqualityOptions) -> Self {
        Self { table, options }
    }

    /// Whether rows `lhs` and `rhs` are equal.
    #[inline]
    pub fn equal(&self, lhs: usize, rhs: usize) -> bool {
        equal_rows(self.table, lhs, self.table, rhs, self.options)
    }
}

/// Tests rows of one table against rows of another.
#[derive(Clone, Copy, Debug)]
pub struct TwoTableComparator<'a> {
    lhs: &'a PreprocessedTable,
    rhs: &'a PreprocessedTable,
    options: EqualityOptions,
}

impl<'a> TwoTableComparator<'a> {
    /// Pair two preprocessed tables.
    ///
    /// # Errors
    /// [`RowCmpError::ShapeMismatch`] when the decomposed tables differ.
    pub fn new(
        lhs: &'a PreprocessedTable,
        rhs: &'a PreprocessedTable,
        options: EqualityOptions,
    ) -> Result<Self, RowCmpError> {
        check_shape_compatibility(lhs.columns(), rhs.columns())?;
        Ok(Self { lhs, rhs, options })
    }

    /// Whether row `lhs_row` of the left table equals row `rhs_row` of the right.
    #[inline]
    pub fn equal(&self, lhs_row: usize, rhs_row: usize) -> bool {
        equal_rows(self.lhs, lhs_row, self.rhs, rhs_row, self.options)
    }
}

fn equal_rows(
    lhs: &PreprocessedTable,
    i: usize,
    rhs: &PreprocessedTable,
    j: usize,
    options: EqualityOptions,
) -> bool {
    lhs.compiled
        .iter()
        .zip(&rhs.compiled)
        .all(|(l, r)| equal_column(l, i, r, j, options))
}

fn equal_column(
    lhs: &EqColumn,
    i: usize,
    rhs: &EqColumn,
    j: usize,
    options: EqualityOptions,
) -> bool {
    let mut l_range = i..i + 1;
    let mut r_range = j..j + 1;

    for (l_level, r_level) in lhs.levels.iter().zip(&rhs.levels) {
        match (l_level, r_level) {
            (EqLevel::Struct { nulls: l_nulls }, EqLevel::Struct { nulls: r_nulls }) => {
                if !validity_equal(l_nulls, &l_range, r_nulls, &r_range, options.nulls) {
                    return false;
                }
            }
            (
                EqLevel::List {
                    nulls: l_nulls,
                    offsets: l_offsets,
                },
                EqLevel::List {
                    nulls: r_nulls,
                    offsets: r_offsets,
                },
            ) => {
                if !validity_equal(l_nulls, &l_range, r_nulls, &r_range, options.nulls) {
                    return false;
                }
                let sizes_match = l_range.clone().zip(r_range.clone()).all(|(a, b)| {
                    list_size(l_nulls, l_offsets, a) == list_size(r_nulls, r_offsets, b)
                });
                if !sizes_match {
                    return false;
                }
                l_range = l_offsets[l_range.start] as usize..l_offsets[l_range.end] as usize;
                r_range = r_offsets[r_range.start] as usize..r_offsets[r_range.end] as usize;
                if l_range.len() != r_range.len() {
                    return false;
                }
            }
            _ => unreachable!("paired tables share one decomposed shape"),
        }
    }

    let (Some(l_leaf), Some(r_leaf)) = (&lhs.leaf, &rhs.leaf) else {
        return true;
    };
    l_range.zip(r_range).all(|(a, b)| {
        match (l_leaf.is_null(a), r_leaf.is_null(b)) {
            (false, false) => l_leaf.equal_values(a, r_leaf, b, options.nans),
            (true, true) => options.nulls == NullEquality::Equal,
            _ => false,
        }
    })
}

/// Null entries count as empty.
#[inline]
fn list_size(nulls: &Option<NullBuffer>, offsets: &OffsetBuffer<i32>, idx: usize) -> i32 {
    if nulls.as_ref().is_some_and(|nulls| nulls.is_null(idx)) {
        0
    } else {
        offsets[idx + 1] - offsets[idx]
    }
}

fn validity_equal(
    lhs: &Option<NullBuffer>,
    l_range: &Range<usize>,
    rhs: &Option<NullBuffer>,
    r_range: &Range<usize>,
    nulls: NullEquality,
) -> bool {
    if lhs.is_none() && rhs.is_none() {
        return true;
    }
    l_range.clone().zip(r_range.clone()).all(|(a, b)| {
        let l_null = lhs.as_ref().is_some_and(|n| n.is_null(a));
        let r_null = rhs.as_ref().is_some_and(|n| n.is_null(b));
        match (l_null, r_null) {
            (false, false) => true,
            (true, true) => nulls == NullEquality::Equal,
            _ => false,
        }
    })
}
