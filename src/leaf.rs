//! Closed set of comparable leaf columns.
//!
//! Every non-nested column reaching a comparator is lowered into a
//! [`LeafColumn`] once, at construction time. Invocation then dispatches over a
//! fixed enum instead of trait objects, so each comparison is a single match on
//! two variants followed by a buffer read.

use std::cmp::Ordering;

use arrow::{
    array::{
        cast::AsArray, Array, BinaryArray, FixedSizeBinaryArray, LargeBinaryArray,
    },
    buffer::{BooleanBuffer, NullBuffer, ScalarBuffer},
    datatypes::{
        i256, ArrowNativeType, DataType, IntervalDayTime, IntervalMonthDayNano, IntervalUnit,
        TimeUnit,
    },
};

use crate::{error::RowCmpError, option::NanEquality};

/// What a leaf type can take part in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LeafSupport {
    /// Totally ordered: usable by both comparators.
    Ordered,
    /// Equality only.
    EqualityOnly,
}

/// Classify a non-nested data type. `None` means the type is not a supported leaf.
pub(crate) fn leaf_support(data_type: &DataType) -> Option<LeafSupport> {
    use DataType::*;
    match data_type {
        Boolean | Int8 | Int16 | Int32 | Int64 | UInt8 | UInt16 | UInt32 | UInt64 | Float32
        | Float64 | Decimal128(_, _) | Decimal256(_, _) | Date32 | Date64 | Timestamp(_, _)
        | Duration(_) | Utf8 | LargeUtf8 | Binary | LargeBinary | FixedSizeBinary(_) => {
            Some(LeafSupport::Ordered)
        }
        Time32(TimeUnit::Second | TimeUnit::Millisecond)
        | Time64(TimeUnit::Microsecond | TimeUnit::Nanosecond)
        | Interval(IntervalUnit::YearMonth) => Some(LeafSupport::Ordered),
        Interval(IntervalUnit::DayTime | IntervalUnit::MonthDayNano) => {
            Some(LeafSupport::EqualityOnly)
        }
        Dictionary(_, values) => match values.as_ref() {
            Dictionary(_, _) => None,
            values => leaf_support(values),
        },
        _ => None,
    }
}

/// Whether a type is, or nests, a floating-point leaf.
pub(crate) fn contains_floating_point(data_type: &DataType) -> bool {
    let mut pending = vec![data_type];
    while let Some(data_type) = pending.pop() {
        match data_type {
            DataType::Float16 | DataType::Float32 | DataType::Float64 => return true,
            DataType::Struct(fields) => pending.extend(fields.iter().map(|f| f.data_type())),
            DataType::List(field) => pending.push(field.data_type()),
            DataType::Dictionary(_, values) => pending.push(values.as_ref()),
            _ => {}
        }
    }
    false
}

/// Raw values of a leaf column.
#[derive(Debug)]
pub(crate) enum LeafValues {
    Boolean(BooleanBuffer),
    Int8(ScalarBuffer<i8>),
    Int16(ScalarBuffer<i16>),
    Int32(ScalarBuffer<i32>),
    Int64(ScalarBuffer<i64>),
    UInt8(ScalarBuffer<u8>),
    UInt16(ScalarBuffer<u16>),
    UInt32(ScalarBuffer<u32>),
    UInt64(ScalarBuffer<u64>),
    Float32(ScalarBuffer<f32>),
    Float64(ScalarBuffer<f64>),
    Decimal128(ScalarBuffer<i128>),
    Decimal256(ScalarBuffer<i256>),
    Binary(BinaryArray),
    LargeBinary(LargeBinaryArray),
    FixedSizeBinary(FixedSizeBinaryArray),
    IntervalDayTime(ScalarBuffer<IntervalDayTime>),
    IntervalMonthDayNano(ScalarBuffer<IntervalMonthDayNano>),
    /// Keys resolved to value positions; values are never a dictionary.
    Dictionary {
        keys: Vec<usize>,
        values: Box<LeafColumn>,
    },
}

/// A leaf column: logical validity plus typed values.
#[derive(Debug)]
pub(crate) struct LeafColumn {
    nulls: Option<NullBuffer>,
    values: LeafValues,
}

fn native<T: ArrowNativeType>(array: &dyn Array) -> ScalarBuffer<T> {
    let data = array.to_data();
    ScalarBuffer::new(data.buffers()[0].clone(), data.offset(), data.len())
}

impl LeafColumn {
    /// Lower an Arrow array into a leaf column.
    ///
    /// # Errors
    /// Returns [`RowCmpError::UnsupportedType`] for nested or unsupported types.
    pub(crate) fn try_new(array: &dyn Array) -> Result<Self, RowCmpError> {
        use DataType::*;

        let data_type = array.data_type();
        if leaf_support(data_type).is_none() {
            return Err(RowCmpError::unsupported(
                data_type,
                "not a comparable leaf type",
            ));
        }
        let values = match data_type {
            Boolean => LeafValues::Boolean(array.as_boolean().values().clone()),
            Int8 => LeafValues::Int8(native(array)),
            Int16 => LeafValues::Int16(native(array)),
            Int32 | Date32 | Time32(_) | Interval(IntervalUnit::YearMonth) => {
                LeafValues::Int32(native(array))
            }
            Int64 | Date64 | Time64(_) | Timestamp(_, _) | Duration(_) => {
                LeafValues::Int64(native(array))
            }
            UInt8 => LeafValues::UInt8(native(array)),
            UInt16 => LeafValues::UInt16(native(array)),
            UInt32 => LeafValues::UInt32(native(array)),
            UInt64 => LeafValues::UInt64(native(array)),
            Float32 => LeafValues::Float32(native(array)),
            Float64 => LeafValues::Float64(native(array)),
            Decimal128(_, _) => LeafValues::Decimal128(native(array)),
            Decimal256(_, _) => LeafValues::Decimal256(native(array)),
            Interval(IntervalUnit::DayTime) => LeafValues::IntervalDayTime(native(array)),
            Interval(IntervalUnit::MonthDayNano) => {
                LeafValues::IntervalMonthDayNano(native(array))
            }
            Utf8 => LeafValues::Binary(BinaryArray::from(array.as_string::<i32>().clone())),
            LargeUtf8 => {
                LeafValues::LargeBinary(LargeBinaryArray::from(array.as_string::<i64>().clone()))
            }
            Binary => LeafValues::Binary(array.as_binary::<i32>().clone()),
            LargeBinary => LeafValues::LargeBinary(array.as_binary::<i64>().clone()),
            FixedSizeBinary(_) => LeafValues::FixedSizeBinary(array.as_fixed_size_binary().clone()),
            Dictionary(_, _) => {
                let dictionary = array.as_any_dictionary();
                LeafValues::Dictionary {
                    keys: dictionary.normalized_keys(),
                    values: Box::new(LeafColumn::try_new(dictionary.values().as_ref())?),
                }
            }
            other => return Err(RowCmpError::unsupported(other, "not a comparable leaf type")),
        };

        Ok(Self {
            // Dictionary logical nulls fold in nulls of the referenced values.
            nulls: array.logical_nulls().filter(|nulls| nulls.null_count() > 0),
            values,
        })
    }

    #[inline]
    pub(crate) fn is_null(&self, index: usize) -> bool {
        self.nulls.as_ref().is_some_and(|nulls| nulls.is_null(index))
    }

    /// Bytes allocated while lowering (normalized dictionary keys).
    pub(crate) fn allocated_bytes(&self) -> usize {
        match &self.values {
            LeafValues::Dictionary { keys, values } => {
                keys.len() * std::mem::size_of::<usize>() + values.allocated_bytes()
            }
            _ => 0,
        }
    }

    #[inline]
    fn resolve(&self, index: usize) -> (&LeafValues, usize) {
        match &self.values {
            LeafValues::Dictionary { keys, values } => (&values.values, keys[index]),
            values => (values, index),
        }
    }

    /// Order two valid values. Floats order NaN above every number, NaNs equal
    /// to each other, and `-0.0` equal to `0.0`.
    #[inline]
    pub(crate) fn compare_values(&self, i: usize, other: &LeafColumn, j: usize) -> Ordering {
        use LeafValues::*;

        let (lhs, i) = self.resolve(i);
        let (rhs, j) = other.resolve(j);
        match (lhs, rhs) {
            (Boolean(a), Boolean(b)) => a.value(i).cmp(&b.value(j)),
            (Int8(a), Int8(b)) => a[i].cmp(&b[j]),
            (Int16(a), Int16(b)) => a[i].cmp(&b[j]),
            (Int32(a), Int32(b)) => a[i].cmp(&b[j]),
            (Int64(a), Int64(b)) => a[i].cmp(&b[j]),
            (UInt8(a), UInt8(b)) => a[i].cmp(&b[j]),
            (UInt16(a), UInt16(b)) => a[i].cmp(&b[j]),
            (UInt32(a), UInt32(b)) => a[i].cmp(&b[j]),
            (UInt64(a), UInt64(b)) => a[i].cmp(&b[j]),
            (Float32(a), Float32(b)) => canonical_cmp_f32(a[i], b[j]),
            (Float64(a), Float64(b)) => canonical_cmp_f64(a[i], b[j]),
            (Decimal128(a), Decimal128(b)) => a[i].cmp(&b[j]),
            (Decimal256(a), Decimal256(b)) => a[i].cmp(&b[j]),
            (Binary(a), Binary(b)) => a.value(i).cmp(b.value(j)),
            (LargeBinary(a), LargeBinary(b)) => a.value(i).cmp(b.value(j)),
            (FixedSizeBinary(a), FixedSizeBinary(b)) => a.value(i).cmp(b.value(j)),
            _ => unreachable!("leaf kinds are matched and ordered at construction"),
        }
    }

    /// Equality of two valid values under the NaN policy.
    #[inline]
    pub(crate) fn equal_values(
        &self,
        i: usize,
        other: &LeafColumn,
        j: usize,
        nans: NanEquality,
    ) -> bool {
        use LeafValues::*;

        let (lhs, i) = self.resolve(i);
        let (rhs, j) = other.resolve(j);
        match (lhs, rhs) {
            (Boolean(a), Boolean(b)) => a.value(i) == b.value(j),
            (Int8(a), Int8(b)) => a[i] == b[j],
            (Int16(a), Int16(b)) => a[i] == b[j],
            (Int32(a), Int32(b)) => a[i] == b[j],
            (Int64(a), Int64(b)) => a[i] == b[j],
            (UInt8(a), UInt8(b)) => a[i] == b[j],
            (UInt16(a), UInt16(b)) => a[i] == b[j],
            (UInt32(a), UInt32(b)) => a[i] == b[j],
            (UInt64(a), UInt64(b)) => a[i] == b[j],
            (Float32(a), Float32(b)) => floats_equal(a[i], b[j], a[i].is_nan(), b[j].is_nan(), nans),
            (Float64(a), Float64(b)) => floats_equal(a[i], b[j], a[i].is_nan(), b[j].is_nan(), nans),
            (Decimal128(a), Decimal128(b)) => a[i] == b[j],
            (Decimal256(a), Decimal256(b)) => a[i] == b[j],
            (Binary(a), Binary(b)) => a.value(i) == b.value(j),
            (LargeBinary(a), LargeBinary(b)) => a.value(i) == b.value(j),
            (FixedSizeBinary(a), FixedSizeBinary(b)) => a.value(i) == b.value(j),
            (IntervalDayTime(a), IntervalDayTime(b)) => a[i] == b[j],
            (IntervalMonthDayNano(a), IntervalMonthDayNano(b)) => a[i] == b[j],
            _ => false,
        }
    }
}

#[inline]
fn floats_equal<T: PartialEq>(lhs: T, rhs: T, lhs_nan: bool, rhs_nan: bool, nans: NanEquality) -> bool {
    match nans {
        NanEquality::AllEqual if lhs_nan || rhs_nan => lhs_nan && rhs_nan,
        _ => lhs == rhs,
    }
}

macro_rules! canonical_cmp {
    ($name:ident, $ty:ty) => {
        #[inline]
        fn $name(lhs: $ty, rhs: $ty) -> Ordering {
            match (lhs.is_nan(), rhs.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                // `-0.0 == 0.0` under IEEE comparison.
                (false, false) => lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal),
            }
        }
    };
}

canonical_cmp!(canonical_cmp_f32, f32);
canonical_cmp!(canonical_cmp_f64, f64);

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{
            DictionaryArray, Float64Array, Int32Array, IntervalDayTimeArray, StringArray,
            TimestampMillisecondArray,
        },
        datatypes::{Field, Int8Type},
    };

    use super::*;

    #[test]
    fn floats_canonicalize_nan_and_signed_zero() {
        let values = Float64Array::from(vec![f64::NAN, -0.0, 0.0, 1.0, -f64::NAN]);
        let leaf = LeafColumn::try_new(&values).expect("float leaf");
        assert_eq!(leaf.compare_values(0, &leaf, 4), Ordering::Equal);
        assert_eq!(leaf.compare_values(1, &leaf, 2), Ordering::Equal);
        assert_eq!(leaf.compare_values(0, &leaf, 3), Ordering::Greater);
        assert_eq!(leaf.compare_values(3, &leaf, 0), Ordering::Less);
        assert!(leaf.equal_values(0, &leaf, 4, NanEquality::AllEqual));
        assert!(!leaf.equal_values(0, &leaf, 4, NanEquality::Unequal));
        assert!(leaf.equal_values(1, &leaf, 2, NanEquality::Unequal));
    }

    #[test]
    fn strings_order_bytewise_and_respect_slices() {
        let values = StringArray::from(vec!["b", "a", "c"]).slice(1, 2);
        let leaf = LeafColumn::try_new(&values).expect("utf8 leaf");
        assert_eq!(leaf.compare_values(0, &leaf, 1), Ordering::Less);
    }

    #[test]
    fn dictionaries_compare_through_values() {
        let lhs: DictionaryArray<Int8Type> = vec!["x", "a"].into_iter().collect();
        let rhs: DictionaryArray<Int8Type> = vec!["a", "x"].into_iter().collect();
        let lhs = LeafColumn::try_new(&lhs).expect("dictionary leaf");
        let rhs = LeafColumn::try_new(&rhs).expect("dictionary leaf");
        assert_eq!(lhs.compare_values(0, &rhs, 1), Ordering::Equal);
        assert_eq!(lhs.compare_values(1, &rhs, 1), Ordering::Less);
        assert!(lhs.equal_values(1, &rhs, 0, NanEquality::AllEqual));
    }

    #[test]
    fn temporal_leaves_lower_to_integers() {
        let values = TimestampMillisecondArray::from(vec![5, 3]);
        let leaf = LeafColumn::try_new(&values).expect("timestamp leaf");
        assert_eq!(leaf.compare_values(0, &leaf, 1), Ordering::Greater);
    }

    #[test]
    fn null_tracking_and_support() {
        let values = Int32Array::from(vec![Some(1), None]);
        let leaf = LeafColumn::try_new(&values).expect("int leaf");
        assert!(!leaf.is_null(0));
        assert!(leaf.is_null(1));

        let intervals = IntervalDayTimeArray::from(vec![IntervalDayTime::new(1, 2)]);
        assert!(LeafColumn::try_new(&intervals).is_ok());
        assert_eq!(
            leaf_support(intervals.data_type()),
            Some(LeafSupport::EqualityOnly)
        );

        let nested = DataType::List(Arc::new(Field::new("item", DataType::Int32, true)));
        assert_eq!(leaf_support(&nested), None);
        assert!(contains_floating_point(&DataType::List(Arc::new(Field::new(
            "item",
            DataType::Float32,
            true
        )))));
    }
}
