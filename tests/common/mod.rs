//! Common fixtures for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use arrow::{
    array::{Array, ArrayRef, Float64Array, Int32Array, ListArray, StringArray, StructArray},
    buffer::{NullBuffer, OffsetBuffer},
    datatypes::{Field, Fields},
};

/// Struct column from named children; every field is nullable.
pub fn struct_of(children: Vec<(&str, ArrayRef)>, nulls: Option<NullBuffer>) -> ArrayRef {
    let fields = children
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect::<Vec<_>>();
    let arrays = children.into_iter().map(|(_, array)| array).collect();
    Arc::new(
        StructArray::try_new(Fields::from(fields), arrays, nulls)
            .expect("fixture struct should be valid"),
    )
}

/// List column over `values` with the given offsets.
pub fn list_of(offsets: Vec<i32>, values: ArrayRef, nulls: Option<NullBuffer>) -> ArrayRef {
    let field = Arc::new(Field::new("item", values.data_type().clone(), true));
    Arc::new(
        ListArray::try_new(field, OffsetBuffer::new(offsets.into()), values, nulls)
            .expect("fixture list should be valid"),
    )
}

fn offsets_from(lengths: &[usize]) -> Vec<i32> {
    let mut offsets = Vec::with_capacity(lengths.len() + 1);
    offsets.push(0);
    for len in lengths {
        offsets.push(offsets[offsets.len() - 1] + *len as i32);
    }
    offsets
}

fn maybe<T>(rng: &mut fastrand::Rng, null_one_in: u8, value: T) -> Option<T> {
    (rng.u8(0..null_one_in) > 0).then_some(value)
}

/// Random table mixing nulls, structs, lists and floats:
///
/// 0. `{l: List<Int32>, a: Int32}` (leading list, so the struct is elided)
/// 1. `List<{x: Int32, y: Utf8}>` (ranked on the lexicographic path)
/// 2. `Float64` drawn from NaN, signed zeros, one and null
///
/// Values come from tiny domains so equal rows are common.
pub fn random_table(rng: &mut fastrand::Rng, rows: usize) -> Vec<ArrayRef> {
    let mut lengths = Vec::with_capacity(rows);
    let mut valid = Vec::with_capacity(rows);
    let mut items = Vec::new();
    for _ in 0..rows {
        let is_valid = rng.u8(0..10) > 0;
        let len = if is_valid { rng.usize(0..3) } else { 0 };
        for _ in 0..len {
            let item = rng.i32(0..3);
            items.push(maybe(rng, 5, item));
        }
        lengths.push(len);
        valid.push(is_valid);
    }
    let list = list_of(
        offsets_from(&lengths),
        Arc::new(Int32Array::from(items)),
        Some(NullBuffer::from(valid)),
    );
    let ints = (0..rows)
        .map(|_| {
            let value = rng.i32(0..3);
            maybe(rng, 5, value)
        })
        .collect::<Vec<_>>();
    let struct_valid = (0..rows).map(|_| rng.u8(0..8) > 0).collect::<Vec<_>>();
    let first = struct_of(
        vec![("l", list), ("a", Arc::new(Int32Array::from(ints)) as ArrayRef)],
        Some(NullBuffer::from(struct_valid)),
    );

    let mut lengths = Vec::with_capacity(rows);
    let mut valid = Vec::with_capacity(rows);
    let (mut xs, mut ys, mut element_valid) = (Vec::new(), Vec::new(), Vec::new());
    for _ in 0..rows {
        let is_valid = rng.u8(0..10) > 0;
        let len = if is_valid { rng.usize(0..3) } else { 0 };
        for _ in 0..len {
            let x = rng.i32(0..2);
            xs.push(maybe(rng, 6, x));
            ys.push(if rng.bool() { "a" } else { "b" });
            element_valid.push(rng.u8(0..10) > 0);
        }
        lengths.push(len);
        valid.push(is_valid);
    }
    let elements = struct_of(
        vec![
            ("x", Arc::new(Int32Array::from(xs)) as ArrayRef),
            ("y", Arc::new(StringArray::from(ys)) as ArrayRef),
        ],
        Some(NullBuffer::from(element_valid)),
    );
    let second = list_of(offsets_from(&lengths), elements, Some(NullBuffer::from(valid)));

    let choices = [Some(f64::NAN), Some(-0.0), Some(0.0), Some(1.0), None];
    let floats = (0..rows)
        .map(|_| choices[rng.usize(0..choices.len())])
        .collect::<Vec<_>>();
    let third: ArrayRef = Arc::new(Float64Array::from(floats));

    debug_assert!(first.len() == rows && second.len() == rows);
    vec![first, second, third]
}
