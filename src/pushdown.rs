//! Null pushdown and list purging for the equality path.
//!
//! Decomposition separates a struct's children into independent branches, so
//! a child must carry its parents' nulls on its own before that happens. List
//! entries that are null but still span child values are compacted away so a
//! null entry always covers an empty child range.
//!
//! Arrow slices struct children together with their parent, so there are no
//! child offsets left to normalize after this pass.

use std::sync::Arc;

use arrow::{
    array::{cast::AsArray, make_array, Array, ArrayRef, ListArray, StructArray, UInt32Array},
    buffer::{NullBuffer, OffsetBuffer},
    compute::take,
    datatypes::{DataType, Field, Fields},
};

use crate::error::RowCmpError;

/// Push every struct's nulls into its descendants and purge non-empty null
/// list entries, for each column of a table.
///
/// # Errors
/// Propagates Arrow failures from rebuilding arrays.
pub fn push_down_nulls(columns: &[ArrayRef]) -> Result<Vec<ArrayRef>, RowCmpError> {
    columns.iter().map(|column| normalize(column, None)).collect()
}

fn normalize(column: &ArrayRef, parent: Option<&NullBuffer>) -> Result<ArrayRef, RowCmpError> {
    let nulls = NullBuffer::union(parent, column.nulls());
    match column.data_type() {
        DataType::Struct(_) => {
            let structs = column.as_struct();
            let children = structs
                .columns()
                .iter()
                .map(|child| normalize(child, nulls.as_ref()))
                .collect::<Result<Vec<_>, _>>()?;
            let fields = structs
                .fields()
                .iter()
                .zip(&children)
                .map(|(field, child)| Field::new(field.name(), child.data_type().clone(), true))
                .collect::<Fields>();
            if children.is_empty() {
                return Ok(Arc::new(StructArray::new_empty_fields(column.len(), nulls)));
            }
            Ok(Arc::new(StructArray::try_new(fields, children, nulls)?))
        }
        DataType::List(field) => {
            let list = column.as_list::<i32>();
            let (offsets, values) = purge_null_entries(list, nulls.as_ref())?;
            // List nulls stay on the list; elements are independent values.
            let values = normalize(&values, None)?;
            let field = Arc::new(Field::new(field.name(), values.data_type().clone(), true));
            Ok(Arc::new(ListArray::try_new(field, offsets, values, nulls)?))
        }
        _ if parent.is_none() => Ok(column.clone()),
        _ => {
            let data = column.to_data().into_builder().nulls(nulls).build()?;
            Ok(make_array(data))
        }
    }
}

fn purge_null_entries(
    list: &ListArray,
    nulls: Option<&NullBuffer>,
) -> Result<(OffsetBuffer<i32>, ArrayRef), RowCmpError> {
    let offsets = list.value_offsets();
    let dirty = nulls.is_some_and(|nulls| {
        (0..list.len()).any(|idx| nulls.is_null(idx) && offsets[idx + 1] > offsets[idx])
    });
    let Some(nulls) = nulls.filter(|_| dirty) else {
        return Ok((list.offsets().clone(), list.values().clone()));
    };

    let mut indices = Vec::new();
    let mut lengths = Vec::with_capacity(list.len());
    for idx in 0..list.len() {
        if nulls.is_valid(idx) {
            let (start, end) = (offsets[idx] as u32, offsets[idx + 1] as u32);
            indices.extend(start..end);
            lengths.push((end - start) as usize);
        } else {
            lengths.push(0);
        }
    }
    let values = take(list.values().as_ref(), &UInt32Array::from(indices), None)?;
    Ok((OffsetBuffer::from_lengths(lengths), values))
}
