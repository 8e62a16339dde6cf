//! Per-column ordering and equality policies.

use std::cmp::Ordering;

/// Sort direction of a column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Order {
    /// Smaller values first.
    #[default]
    Ascending,
    /// Larger values first.
    Descending,
}

impl Order {
    /// Apply this direction to an ascending comparison result.
    #[inline]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Order::Ascending => ordering,
            Order::Descending => ordering.reverse(),
        }
    }
}

/// Where nulls land relative to non-null values of the same column.
///
/// The placement is absolute: [`NullOrder::Before`] puts nulls first for both
/// ascending and descending columns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NullOrder {
    /// Nulls sort before every non-null value.
    #[default]
    Before,
    /// Nulls sort after every non-null value.
    After,
}

impl NullOrder {
    /// Order two validity flags. Only meaningful when at least one side is null.
    #[inline]
    pub fn compare_nulls(self, lhs_null: bool, rhs_null: bool) -> Ordering {
        let ordering = match (lhs_null, rhs_null) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => return Ordering::Equal,
        };
        match self {
            NullOrder::Before => ordering,
            NullOrder::After => ordering.reverse(),
        }
    }

    /// The opposite placement.
    #[inline]
    pub fn reverse(self) -> Self {
        match self {
            NullOrder::Before => NullOrder::After,
            NullOrder::After => NullOrder::Before,
        }
    }
}

/// Whether two nulls compare equal in equality comparisons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NullEquality {
    /// Two nulls are equal.
    #[default]
    Equal,
    /// A null is never equal to anything, including another null.
    Unequal,
}

/// Whether two NaNs compare equal in equality comparisons.
///
/// Lexicographic comparison always treats NaNs as equal to each other and
/// greater than every number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NanEquality {
    /// All NaNs are equal to each other.
    #[default]
    AllEqual,
    /// IEEE semantics: a NaN is never equal to anything.
    Unequal,
}

/// Policies used by equality comparators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EqualityOptions {
    pub(crate) nulls: NullEquality,
    pub(crate) nans: NanEquality,
}

impl EqualityOptions {
    /// Set the null-equality policy.
    pub fn nulls(self, nulls: NullEquality) -> Self {
        Self { nulls, ..self }
    }

    /// Set the NaN-equality policy.
    pub fn nans(self, nans: NanEquality) -> Self {
        Self { nans, ..self }
    }

    /// Configured null-equality policy.
    pub fn null_equality(&self) -> NullEquality {
        self.nulls
    }

    /// Configured NaN-equality policy.
    pub fn nan_equality(&self) -> NanEquality {
        self.nans
    }
}
