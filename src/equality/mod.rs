//! Row equality over nested tables.
//!
//! Parent nulls are pushed into children first, then both structs and lists
//! are decomposed so every column is a single chain of containers over one
//! leaf. [`SelfComparator::equal`] walks that chain as a shrinking or growing
//! row range per level, without recursion.

mod comparator;

use arrow::{
    array::{cast::AsArray, Array, ArrayRef},
    buffer::{NullBuffer, OffsetBuffer},
    datatypes::DataType,
};

pub use comparator::{SelfComparator, TwoTableComparator};

use crate::{
    check::check_eq_compatibility,
    context::{ComputeContext, Reservation},
    decompose::{decompose, validate_table, DecomposeLists},
    error::RowCmpError,
    leaf::LeafColumn,
    logging::rowcmp_log,
    option::EqualityOptions,
    pushdown::push_down_nulls,
};

#[derive(Debug)]
enum EqLevel {
    Struct {
        nulls: Option<NullBuffer>,
    },
    List {
        nulls: Option<NullBuffer>,
        offsets: OffsetBuffer<i32>,
    },
}

#[derive(Debug)]
struct EqColumn {
    levels: Vec<EqLevel>,
    /// `None` under a zero-field struct.
    leaf: Option<LeafColumn>,
}

impl EqColumn {
    fn compile(column: &ArrayRef) -> Result<Self, RowCmpError> {
        let mut levels = Vec::new();
        let mut current = column;
        loop {
            match current.data_type() {
                DataType::Struct(_) => {
                    let structs = current.as_struct();
                    levels.push(EqLevel::Struct {
                        nulls: structs.nulls().cloned(),
                    });
                    match structs.columns().first() {
                        Some(child) => current = child,
                        None => return Ok(Self { levels, leaf: None }),
                    }
                }
                DataType::List(_) => {
                    let list = current.as_list::<i32>();
                    levels.push(EqLevel::List {
                        nulls: list.nulls().cloned(),
                        offsets: list.offsets().clone(),
                    });
                    current = list.values();
                }
                _ => {
                    return Ok(Self {
                        levels,
                        leaf: Some(LeafColumn::try_new(current.as_ref())?),
                    })
                }
            }
        }
    }
}

/// Equality-ready bundle derived from one table.
#[derive(Debug)]
pub struct PreprocessedTable {
    columns: Vec<ArrayRef>,
    compiled: Vec<EqColumn>,
    num_rows: usize,
    reservation: Reservation,
}

impl PreprocessedTable {
    /// Preprocess `table` for equality comparisons.
    ///
    /// # Errors
    /// [`RowCmpError::Configuration`] for ragged tables and
    /// [`RowCmpError::UnsupportedType`] for leaves without equality.
    pub fn create(table: &[ArrayRef], ctx: &ComputeContext) -> Result<Self, RowCmpError> {
        validate_table(table, &[], &[])?;
        check_eq_compatibility(table)?;

        let normalized = push_down_nulls(table)?;
        let decomposed = decompose(&normalized, &[], &[], DecomposeLists::Yes)?;
        let compiled = decomposed
            .columns
            .iter()
            .map(EqColumn::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let bytes = compiled
            .iter()
            .filter_map(|column| column.leaf.as_ref())
            .map(LeafColumn::allocated_bytes)
            .sum();
        let reservation = ctx.memory().reserve(bytes);
        let num_rows = table.first().map_or(0, |column| column.len());

        rowcmp_log!(
            log::Level::Debug,
            ctx: ctx.log(),
            "preprocess_equality",
            "rows={} columns={} branches={} bytes={}",
            num_rows,
            table.len(),
            compiled.len(),
            bytes
        );

        Ok(Self {
            columns: decomposed.columns,
            compiled,
            num_rows,
            reservation,
        })
    }

    /// Comparator over rows of this table.
    pub fn comparator(&self, options: EqualityOptions) -> SelfComparator<'_> {
        SelfComparator::new(self, options)
    }

    /// Null-normalized, fully decomposed columns.
    pub fn columns(&self) -> &[ArrayRef] {
        &self.columns
    }

    /// Rows in the source table.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Bytes accounted against the construction context.
    pub fn reserved_bytes(&self) -> usize {
        self.reservation.bytes()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{Float64Array, Int32Array, ListArray, StringArray, StructArray},
        datatypes::{Field, Fields, Int32Type},
    };

    use super::*;
    use crate::option::{NanEquality, NullEquality};

    #[test]
    fn list_of_struct_splits_into_two_chains() {
        let a: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 1, 2, 1]));
        let b: ArrayRef = Arc::new(StringArray::from(vec!["x", "y", "x", "y", "z"]));
        let values: ArrayRef = Arc::new(StructArray::from(vec![
            (Arc::new(Field::new("a", DataType::Int32, false)), a),
            (Arc::new(Field::new("b", DataType::Utf8, false)), b),
        ]));
        let list: ArrayRef = Arc::new(
            ListArray::try_new(
                Arc::new(Field::new("item", values.data_type().clone(), true)),
                OffsetBuffer::new(vec![0, 2, 4, 5].into()),
                values,
                None,
            )
            .expect("list"),
        );

        let prepared = PreprocessedTable::create(&[list], &ComputeContext::new()).expect("create");
        assert_eq!(prepared.columns().len(), 2);
        let cmp = prepared.comparator(EqualityOptions::default());
        assert!(cmp.equal(0, 1));
        assert!(!cmp.equal(0, 2));
        assert!(cmp.equal(2, 2));
    }

    #[test]
    fn null_policies() {
        let values: ArrayRef = Arc::new(Float64Array::from(vec![
            Some(f64::NAN),
            Some(f64::NAN),
            None,
            None,
            Some(-0.0),
            Some(0.0),
        ]));
        let prepared = PreprocessedTable::create(&[values], &ComputeContext::new()).expect("create");

        let defaults = prepared.comparator(EqualityOptions::default());
        assert!(defaults.equal(0, 1));
        assert!(defaults.equal(2, 3));
        assert!(defaults.equal(4, 5));

        let strict = prepared.comparator(
            EqualityOptions::default()
                .nulls(NullEquality::Unequal)
                .nans(NanEquality::Unequal),
        );
        assert!(!strict.equal(0, 1));
        assert!(!strict.equal(2, 3));
        assert!(!strict.equal(2, 2));
        assert!(strict.equal(4, 5));
    }

    #[test]
    fn struct_nulls_hide_children() {
        let ints: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 1]));
        let column: ArrayRef = Arc::new(
            StructArray::try_new(
                Fields::from(vec![Field::new("i", DataType::Int32, true)]),
                vec![ints],
                Some(NullBuffer::from(vec![false, false, true])),
            )
            .expect("struct"),
        );
        let prepared = PreprocessedTable::create(&[column], &ComputeContext::new()).expect("create");
        let cmp = prepared.comparator(EqualityOptions::default());
        assert!(cmp.equal(0, 1));
        assert!(!cmp.equal(0, 2));
    }

    #[test]
    fn nested_lists_compare_sizes_then_values() {
        let list: ArrayRef = Arc::new(ListArray::from_iter_primitive::<Int32Type, _, _>(vec![
            Some(vec![Some(1), Some(2)]),
            Some(vec![Some(1)]),
            Some(vec![Some(1), Some(2)]),
            None,
            Some(vec![]),
        ]));
        let prepared = PreprocessedTable::create(&[list], &ComputeContext::new()).expect("create");
        let cmp = prepared.comparator(EqualityOptions::default());
        assert!(cmp.equal(0, 2));
        assert!(!cmp.equal(0, 1));
        assert!(!cmp.equal(3, 4));
    }
}
