mod common;

use std::{cmp::Ordering, sync::Arc};

use arrow::{
    array::{ArrayRef, DictionaryArray, Float32Array, Int32Array, IntervalMonthDayNanoArray},
    buffer::NullBuffer,
    datatypes::{Int16Type, Int8Type, IntervalMonthDayNano},
};
use common::{list_of, random_table, struct_of};
use rowcmp::{
    equality::{PreprocessedTable, TwoTableComparator},
    lexicographic, ComputeContext, EqualityOptions, NanEquality, NullEquality, RowCmpError,
};

#[test]
fn equal_is_reflexive_and_symmetric() {
    let mut rng = fastrand::Rng::with_seed(42);
    let table = random_table(&mut rng, 48);
    let ctx = ComputeContext::new();
    let prepared = PreprocessedTable::create(&table, &ctx).expect("create");
    let cmp = prepared.comparator(EqualityOptions::default());

    for a in 0..prepared.num_rows() {
        assert!(cmp.equal(a, a), "row {a}");
        for b in 0..prepared.num_rows() {
            assert_eq!(cmp.equal(a, b), cmp.equal(b, a), "rows {a} and {b}");
        }
    }
}

#[test]
fn null_equality_policy_reaches_nested_values() {
    // [{v: 1}, {v: null}], [{v: 1}, {v: null}], [{v: 1}, null]
    let values = struct_of(
        vec![(
            "v",
            Arc::new(Int32Array::from(vec![Some(1), None, Some(1), None, Some(1), Some(9)]))
                as ArrayRef,
        )],
        Some(NullBuffer::from(vec![true, true, true, true, true, false])),
    );
    let column = list_of(vec![0, 2, 4, 6], values, None);
    let ctx = ComputeContext::new();
    let prepared = PreprocessedTable::create(&[column], &ctx).expect("create");

    let lenient = prepared.comparator(EqualityOptions::default());
    assert!(lenient.equal(0, 1));
    assert!(!lenient.equal(0, 2));

    let strict = prepared.comparator(EqualityOptions::default().nulls(NullEquality::Unequal));
    assert!(!strict.equal(0, 1));
    assert!(!strict.equal(2, 2));
}

#[test]
fn nan_policy() {
    let column: ArrayRef = Arc::new(Float32Array::from(vec![f32::NAN, f32::NAN, 1.0]));
    let ctx = ComputeContext::new();
    let prepared = PreprocessedTable::create(&[column], &ctx).expect("create");

    assert!(prepared.comparator(EqualityOptions::default()).equal(0, 1));
    let ieee = prepared.comparator(EqualityOptions::default().nans(NanEquality::Unequal));
    assert!(!ieee.equal(0, 1));
    assert!(!ieee.equal(0, 0));
    assert!(ieee.equal(2, 2));
}

#[test]
fn dictionaries_compare_by_value_across_tables() {
    let lhs: DictionaryArray<Int8Type> = vec!["red", "blue", "red"].into_iter().collect();
    let rhs: DictionaryArray<Int16Type> = vec!["blue", "green", "red"].into_iter().collect();
    let lhs: ArrayRef = Arc::new(lhs);
    let rhs: ArrayRef = Arc::new(rhs);
    let ctx = ComputeContext::new();

    let left = PreprocessedTable::create(&[lhs.clone()], &ctx).expect("create");
    let right = PreprocessedTable::create(&[rhs.clone()], &ctx).expect("create");
    let eq = TwoTableComparator::new(&left, &right, EqualityOptions::default()).expect("pair");
    assert!(eq.equal(0, 2));
    assert!(eq.equal(1, 0));
    assert!(!eq.equal(0, 1));

    let left = lexicographic::PreprocessedTable::create(&[lhs], &[], &[], &ctx).expect("create");
    let right = lexicographic::PreprocessedTable::create(&[rhs], &[], &[], &ctx).expect("create");
    let cmp = lexicographic::TwoTableComparator::new(&left, &right).expect("pair");
    assert_eq!(cmp.compare(1, 0), Ordering::Equal);
    assert_eq!(cmp.compare(0, 0), Ordering::Greater);
    assert_eq!(cmp.compare(1, 1), Ordering::Less);
}

#[test]
fn equality_only_leaves() {
    let column: ArrayRef = Arc::new(IntervalMonthDayNanoArray::from(vec![
        IntervalMonthDayNano::new(1, 2, 3),
        IntervalMonthDayNano::new(1, 2, 3),
        IntervalMonthDayNano::new(0, 2, 3),
    ]));
    let ctx = ComputeContext::new();
    let prepared = PreprocessedTable::create(&[column.clone()], &ctx).expect("create");
    let cmp = prepared.comparator(EqualityOptions::default());
    assert!(cmp.equal(0, 1));
    assert!(!cmp.equal(0, 2));

    let err = lexicographic::PreprocessedTable::create(&[column], &[], &[], &ctx)
        .expect_err("no total order");
    assert!(matches!(err, RowCmpError::UnsupportedType { .. }));
}

#[test]
fn memory_is_released_with_the_table() {
    let lhs: DictionaryArray<Int8Type> = vec!["a", "b"].into_iter().collect();
    let ctx = ComputeContext::new();
    let prepared = PreprocessedTable::create(&[Arc::new(lhs) as ArrayRef], &ctx).expect("create");
    assert!(prepared.reserved_bytes() > 0);
    assert_eq!(ctx.memory().allocated_bytes(), prepared.reserved_bytes());
    drop(prepared);
    assert_eq!(ctx.memory().allocated_bytes(), 0);
}

#[test]
fn equality_comparators_run_on_many_threads() {
    let mut rng = fastrand::Rng::with_seed(3);
    let table = random_table(&mut rng, 24);
    let ctx = ComputeContext::new();
    let prepared = PreprocessedTable::create(&table, &ctx).expect("create");
    let cmp = prepared.comparator(EqualityOptions::default());
    let expected = (0..24).filter(|&row| cmp.equal(row, 0)).count();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(move || {
                assert_eq!((0..24).filter(|&row| cmp.equal(row, 0)).count(), expected);
            });
        }
    });
}
