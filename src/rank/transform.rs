use std::sync::Arc;

use arrow::{
    array::{cast::AsArray, Array, ArrayRef, ListArray},
    compute::{cast, concat},
    datatypes::{DataType, Field, Fields},
};

use super::dense_rank;
use crate::{
    context::ComputeContext, error::RowCmpError, leaf::contains_floating_point,
    logging::rowcmp_log, option::NullOrder,
};

/// Result of [`transform_lists_of_structs`].
#[derive(Debug, Clone)]
pub struct RankTransform {
    /// Left column, with its list-of-struct payload replaced by ranks.
    pub lhs: ArrayRef,
    /// Right column when ranking jointly.
    pub rhs: Option<ArrayRef>,
    /// Rank columns allocated by the transform.
    pub ranked: Vec<ArrayRef>,
    /// Whether a ranked struct contained a floating-point leaf.
    pub ranked_floating_point: bool,
}

/// Replace the struct values under a (possibly multi-level) list with their
/// dense ranks, so the list bottoms out at an integer leaf.
///
/// With `rhs`, both sides' struct values are concatenated before ranking and
/// the ranks are sliced back, so a rank on the left is comparable with a rank
/// on the right. Columns that are not lists of structs come back unchanged
/// with no rank columns.
///
/// # Errors
/// Fails when the struct values cannot be ordered, or when the two sides
/// cannot be concatenated.
pub fn transform_lists_of_structs(
    lhs: &ArrayRef,
    rhs: Option<&ArrayRef>,
    null_order: NullOrder,
    ctx: &ComputeContext,
) -> Result<RankTransform, RowCmpError> {
    let (lhs_layers, lhs_values) = peel(lhs);
    if lhs_layers.is_empty() || !matches!(lhs_values.data_type(), DataType::Struct(_)) {
        return Ok(RankTransform {
            lhs: lhs.clone(),
            rhs: rhs.cloned(),
            ranked: Vec::new(),
            ranked_floating_point: false,
        });
    }
    let ranked_floating_point = contains_floating_point(lhs_values.data_type());

    let transformed = match rhs {
        None => {
            let ranks: ArrayRef = Arc::new(dense_rank(lhs_values, null_order, ctx)?);
            RankTransform {
                lhs: rewrap(&lhs_layers, ranks.clone())?,
                rhs: None,
                ranked: vec![ranks],
                ranked_floating_point,
            }
        }
        Some(rhs) => {
            let (rhs_layers, rhs_values) = peel(rhs);
            let target = relaxed_type(lhs_values.data_type());
            let lhs_values = cast(lhs_values, &target)?;
            let rhs_values = cast(rhs_values, &target)?;
            let combined = concat(&[lhs_values.as_ref(), rhs_values.as_ref()])?;
            let ranks = dense_rank(&combined, null_order, ctx)?;
            let lhs_ranks: ArrayRef = Arc::new(ranks.slice(0, lhs_values.len()));
            let rhs_ranks: ArrayRef = Arc::new(ranks.slice(lhs_values.len(), rhs_values.len()));
            RankTransform {
                lhs: rewrap(&lhs_layers, lhs_ranks.clone())?,
                rhs: Some(rewrap(&rhs_layers, rhs_ranks.clone())?),
                ranked: vec![lhs_ranks, rhs_ranks],
                ranked_floating_point,
            }
        }
    };

    rowcmp_log!(
        log::Level::Debug,
        ctx: ctx.log(),
        "rank_transform",
        "list_levels={} joint={} floating_point={}",
        lhs_layers.len(),
        rhs.is_some(),
        ranked_floating_point
    );
    Ok(transformed)
}

/// List layers from the outside in, and the values under the innermost one.
fn peel(column: &ArrayRef) -> (Vec<&ListArray>, &ArrayRef) {
    let mut layers = Vec::new();
    let mut current = column;
    while let DataType::List(_) = current.data_type() {
        let list = current.as_list::<i32>();
        layers.push(list);
        current = list.values();
    }
    (layers, current)
}

fn rewrap(layers: &[&ListArray], leaf: ArrayRef) -> Result<ArrayRef, RowCmpError> {
    let mut column = leaf;
    for list in layers.iter().rev() {
        let name = match list.data_type() {
            DataType::List(field) => field.name().clone(),
            _ => unreachable!("peel only collects lists"),
        };
        let field = Arc::new(Field::new(name, column.data_type().clone(), true));
        column = Arc::new(ListArray::try_new(
            field,
            list.offsets().clone(),
            column,
            list.nulls().cloned(),
        )?);
    }
    Ok(column)
}

/// `data_type` with every nested field nullable and dictionaries unpacked to
/// their values, so both sides of a joint rank share one concatenable type.
fn relaxed_type(data_type: &DataType) -> DataType {
    match data_type {
        DataType::Struct(fields) => DataType::Struct(
            fields
                .iter()
                .map(|field| relaxed_field(field))
                .collect::<Fields>(),
        ),
        DataType::List(field) => DataType::List(Arc::new(relaxed_field(field))),
        // Key widths may differ between sides; ranks only depend on values.
        DataType::Dictionary(_, values) => relaxed_type(values),
        other => other.clone(),
    }
}

fn relaxed_field(field: &Field) -> Field {
    Field::new(field.name(), relaxed_type(field.data_type()), true)
}
