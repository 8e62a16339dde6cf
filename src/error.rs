use arrow::{datatypes::DataType, error::ArrowError};
use thiserror::Error;

/// Errors raised while building preprocessed tables or comparators.
///
/// Every variant is detected during construction. Once a comparator exists its
/// `compare`/`equal` entry points are total and never fail.
#[derive(Debug, Error)]
pub enum RowCmpError {
    /// Order or null-precedence arrays do not line up with the table, or the
    /// inputs cannot be combined the way the caller asked.
    #[error("configuration error: {reason}")]
    Configuration {
        /// Human readable description of the mismatch.
        reason: String,
    },
    /// A leaf type cannot be compared, or a nesting shape survived
    /// preprocessing that the comparator cannot walk.
    #[error("unsupported data type {data_type}: {reason}")]
    UnsupportedType {
        /// Offending Arrow data type.
        data_type: DataType,
        /// Why the type was rejected.
        reason: &'static str,
    },
    /// The two tables of a two-table comparator are not compatible.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(#[from] ShapeMismatch),
    /// An Arrow kernel failed while materializing intermediate columns.
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

/// Detail of a [`RowCmpError::ShapeMismatch`].
#[derive(Debug, Error, PartialEq)]
pub enum ShapeMismatch {
    /// Tables carry a different number of columns.
    #[error("column count differs (lhs={lhs}, rhs={rhs})")]
    ColumnCount {
        /// Columns on the left-hand side.
        lhs: usize,
        /// Columns on the right-hand side.
        rhs: usize,
    },
    /// A column pair has structurally different types.
    #[error("column {column} types differ: lhs={lhs}, rhs={rhs}")]
    ColumnType {
        /// Index of the first incompatible column.
        column: usize,
        /// Left-hand data type.
        lhs: DataType,
        /// Right-hand data type.
        rhs: DataType,
    },
}

impl RowCmpError {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(data_type: &DataType, reason: &'static str) -> Self {
        Self::UnsupportedType {
            data_type: data_type.clone(),
            reason,
        }
    }
}
