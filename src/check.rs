//! Type checks run before a comparator is built.

use arrow::{array::ArrayRef, datatypes::DataType};

use crate::{
    error::{RowCmpError, ShapeMismatch},
    leaf::{leaf_support, LeafSupport},
};

/// Reject tables a lexicographic comparator cannot order.
///
/// Lists of structs and structs of lists must have been rank-transformed or
/// decomposed away already, and every leaf must be totally ordered.
///
/// # Errors
/// [`RowCmpError::UnsupportedType`] naming the first offending type.
pub fn check_lex_compatibility(columns: &[ArrayRef]) -> Result<(), RowCmpError> {
    for column in columns {
        let mut pending = vec![column.data_type()];
        while let Some(data_type) = pending.pop() {
            match data_type {
                DataType::Struct(fields) => {
                    for field in fields {
                        if matches!(field.data_type(), DataType::List(_)) {
                            return Err(RowCmpError::unsupported(
                                data_type,
                                "struct of list cannot be ordered",
                            ));
                        }
                        pending.push(field.data_type());
                    }
                }
                DataType::List(field) => {
                    if matches!(field.data_type(), DataType::Struct(_)) {
                        return Err(RowCmpError::unsupported(
                            data_type,
                            "list of struct cannot be ordered",
                        ));
                    }
                    pending.push(field.data_type());
                }
                leaf => match leaf_support(leaf) {
                    Some(LeafSupport::Ordered) => {}
                    Some(LeafSupport::EqualityOnly) => {
                        return Err(RowCmpError::unsupported(
                            leaf,
                            "leaf type has no total order",
                        ))
                    }
                    None => {
                        return Err(RowCmpError::unsupported(
                            leaf,
                            "leaf type is not comparable",
                        ))
                    }
                },
            }
        }
    }
    Ok(())
}

/// Reject tables an equality comparator cannot walk. Structs and lists are
/// always structurally comparable; leaves must support equality.
///
/// # Errors
/// [`RowCmpError::UnsupportedType`] naming the first offending leaf.
pub fn check_eq_compatibility(columns: &[ArrayRef]) -> Result<(), RowCmpError> {
    for column in columns {
        let mut pending = vec![column.data_type()];
        while let Some(data_type) = pending.pop() {
            match data_type {
                DataType::Struct(fields) => pending.extend(fields.iter().map(|f| f.data_type())),
                DataType::List(field) => pending.push(field.data_type()),
                leaf if leaf_support(leaf).is_some() => {}
                leaf => {
                    return Err(RowCmpError::unsupported(
                        leaf,
                        "leaf type is not equality comparable",
                    ))
                }
            }
        }
    }
    Ok(())
}

/// Require two tables to have the same column count and structurally equal
/// column types. Field names, nullability and dictionary key widths are
/// ignored.
///
/// # Errors
/// [`RowCmpError::ShapeMismatch`] describing the first difference.
pub fn check_shape_compatibility(lhs: &[ArrayRef], rhs: &[ArrayRef]) -> Result<(), RowCmpError> {
    if lhs.len() != rhs.len() {
        return Err(ShapeMismatch::ColumnCount {
            lhs: lhs.len(),
            rhs: rhs.len(),
        }
        .into());
    }
    for (column, (l, r)) in lhs.iter().zip(rhs).enumerate() {
        if !types_compatible(l.data_type(), r.data_type()) {
            return Err(ShapeMismatch::ColumnType {
                column,
                lhs: l.data_type().clone(),
                rhs: r.data_type().clone(),
            }
            .into());
        }
    }
    Ok(())
}

pub(crate) fn types_compatible(lhs: &DataType, rhs: &DataType) -> bool {
    let mut pending = vec![(lhs, rhs)];
    while let Some(pair) = pending.pop() {
        match pair {
            (DataType::Struct(l), DataType::Struct(r)) => {
                if l.len() != r.len() {
                    return false;
                }
                pending.extend(l.iter().zip(r.iter()).map(|(l, r)| (l.data_type(), r.data_type())));
            }
            (DataType::List(l), DataType::List(r)) => pending.push((l.data_type(), r.data_type())),
            (DataType::Dictionary(_, l), DataType::Dictionary(_, r)) => {
                pending.push((l.as_ref(), r.as_ref()))
            }
            (l, r) => {
                if l != r {
                    return false;
                }
            }
        }
    }
    true
}
