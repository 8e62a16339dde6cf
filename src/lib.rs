#![deny(missing_docs)]
//! Row comparators for nested Arrow tables.
//!
//! Given one or two tables of possibly deeply nested columns (structs, lists,
//! dictionaries), `rowcmp` builds reusable comparators that answer, for any
//! pair of row indices, how the rows order ([`lexicographic`]) or whether they
//! are equal ([`equality`]). All nesting is flattened while the comparator is
//! built; invoking it touches flat buffers only, never allocates, never
//! recurses, and may happen from any number of threads at once.
//!
//! ```
//! use std::{cmp::Ordering, sync::Arc};
//!
//! use arrow::array::{ArrayRef, Int32Array};
//! use rowcmp::{lexicographic::PreprocessedTable, ComputeContext};
//!
//! let column: ArrayRef = Arc::new(Int32Array::from(vec![2, 1]));
//! let ctx = ComputeContext::new();
//! let table = PreprocessedTable::create(&[column], &[], &[], &ctx).unwrap();
//! assert_eq!(table.comparator().compare(0, 1), Ordering::Greater);
//! ```

mod leaf;
mod logging;

/// Type checks run before comparators are built.
pub mod check;

/// Construction context: memory accounting and log fields.
pub mod context;

/// Flattening of nested columns into single-chain branches.
pub mod decompose;

/// Definition/repetition level encoding of list columns.
pub mod dremel;

/// Row equality.
pub mod equality;

/// Error types.
pub mod error;

/// Lexicographic row ordering.
pub mod lexicographic;

/// Ordering and equality policies.
pub mod option;

/// Parent-null pushdown for the equality path.
pub mod pushdown;

/// Dense ranking and the lists-of-structs rank transform.
pub mod rank;

pub use crate::{
    context::{ComputeContext, MemoryTracker},
    error::{RowCmpError, ShapeMismatch},
    logging::LogContext,
    option::{EqualityOptions, NanEquality, NullEquality, NullOrder, Order},
};
