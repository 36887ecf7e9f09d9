//! Stable ordering of flattened records by one field.
//!
//! Ordering rules for sort values:
//! - numbers compare numerically and exactly, also between integers and floats;
//! - booleans count as the integers 0 and 1 and order against numbers;
//! - strings compare by Unicode scalar value;
//! - arrays compare element by element, the first unequal pair deciding and a
//!   shorter prefix ordering first;
//! - `null` and objects are not orderable (inside arrays they may still be
//!   equal to each other).
//!
//! A failed sort leaves the records untouched.

use std::cell::Cell;
use std::cmp::Ordering;

use serde_json::Value;
use tracing::{debug, error};

use crate::contract::ResultItem;
use crate::error::AggregateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortClass {
    Numeric,
    Text,
    Sequence,
}

fn sort_class(value: &Value) -> Option<SortClass> {
    match value {
        Value::Bool(_) | Value::Number(_) => Some(SortClass::Numeric),
        Value::String(_) => Some(SortClass::Text),
        Value::Array(_) => Some(SortClass::Sequence),
        Value::Null | Value::Object(_) => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum Numeric {
    // wide enough for every i64 and u64
    Int(i128),
    Float(f64),
}

impl Numeric {
    fn of(value: &Value) -> Self {
        match value {
            Value::Bool(flag) => Numeric::Int(i128::from(*flag)),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Numeric::Int(i128::from(int))
                } else if let Some(uint) = number.as_u64() {
                    Numeric::Int(i128::from(uint))
                } else {
                    Numeric::Float(number.as_f64().unwrap_or_default())
                }
            }
            _ => Numeric::Int(0),
        }
    }
}

// 2^127 as f64; every float below it in magnitude truncates into an i128.
const I128_BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

/// Exact ordering of an integer against a float.
fn compare_int_float(int: i128, float: f64) -> Ordering {
    if float >= I128_BOUND {
        return Ordering::Less;
    }
    if float < -I128_BOUND {
        return Ordering::Greater;
    }
    let whole = float.trunc();
    match int.cmp(&(whole as i128)) {
        Ordering::Equal => {
            let fraction = float - whole;
            if fraction > 0.0 {
                Ordering::Less
            } else if fraction < 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        unequal => unequal,
    }
}

fn compare_numeric(left: &Value, right: &Value) -> Ordering {
    match (Numeric::of(left), Numeric::of(right)) {
        (Numeric::Int(l), Numeric::Int(r)) => l.cmp(&r),
        (Numeric::Int(l), Numeric::Float(r)) => compare_int_float(l, r),
        (Numeric::Float(l), Numeric::Int(r)) => compare_int_float(r, l).reverse(),
        (Numeric::Float(l), Numeric::Float(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
    }
}

/// Equality as used while scanning two arrays: orderable values by ordering,
/// everything else structurally.
fn elements_equal(left: &Value, right: &Value) -> bool {
    match compare_values(left, right) {
        Some(ordering) => ordering == Ordering::Equal,
        None => left == right,
    }
}

fn compare_sequences(left: &[Value], right: &[Value]) -> Option<Ordering> {
    for (l, r) in left.iter().zip(right) {
        if !elements_equal(l, r) {
            return compare_values(l, r);
        }
    }
    Some(left.len().cmp(&right.len()))
}

/// Compare two sort values, or `None` when they cannot be ordered against each other.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Array(l), Value::Array(r)) => compare_sequences(l, r),
        _ => match (sort_class(left)?, sort_class(right)?) {
            (SortClass::Numeric, SortClass::Numeric) => Some(compare_numeric(left, right)),
            _ => None,
        },
    }
}

fn comparison_error(field: &str, left: &Value, right: &Value) -> AggregateError {
    error!(
        field,
        left = %left,
        right = %right,
        "[SORT][ERROR] Sort values are not mutually orderable"
    );
    AggregateError::Comparison {
        field: field.to_owned(),
        left: left.clone(),
        right: right.clone(),
    }
}

/// Stably sort `records` in non-decreasing order of `records[i][field]`.
///
/// Fails with [`AggregateError::FieldAccess`] for the first record without the
/// field, and with [`AggregateError::Comparison`] when two values cannot be
/// ordered. A single record is never compared, so only its presence is checked.
pub fn sort_by_field(records: &mut [ResultItem], field: &str) -> Result<(), AggregateError> {
    for (index, record) in records.iter().enumerate() {
        if !record.contains_key(field) {
            error!(field, index, "[SORT][ERROR] Record is missing the sort field");
            return Err(AggregateError::FieldAccess {
                field: field.to_owned(),
                index,
            });
        }
    }

    if let Some((first, rest)) = records.split_first() {
        let anchor = &first[field];
        let anchor_class = sort_class(anchor);
        for record in rest {
            let value = &record[field];
            if anchor_class.is_none() || sort_class(value) != anchor_class {
                return Err(comparison_error(field, anchor, value));
            }
        }
    }

    // Arrays may still hold unorderable element pairs, so order a permutation
    // first and only apply it once every comparison succeeded.
    let failed: Cell<Option<(usize, usize)>> = Cell::new(None);
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&l, &r| {
        match compare_values(&records[l][field], &records[r][field]) {
            Some(ordering) => ordering,
            None => {
                if failed.get().is_none() {
                    failed.set(Some((l, r)));
                }
                Ordering::Equal
            }
        }
    });
    if let Some((l, r)) = failed.get() {
        return Err(comparison_error(field, &records[l][field], &records[r][field]));
    }

    let sorted: Vec<ResultItem> = order
        .into_iter()
        .map(|index| std::mem::take(&mut records[index]))
        .collect();
    for (slot, record) in records.iter_mut().zip(sorted) {
        *slot = record;
    }
    debug!(field, count = records.len(), "[SORT] Records sorted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> ResultItem {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn ranks(records: &[ResultItem]) -> Vec<Value> {
        records.iter().map(|r| r["rank"].clone()).collect()
    }

    fn ranked(values: Vec<Value>) -> Vec<ResultItem> {
        values
            .into_iter()
            .map(|rank| record(json!({ "rank": rank })))
            .collect()
    }

    #[test]
    fn sorts_numbers_ascending() {
        let mut records = ranked(vec![json!(3), json!(1), json!(2)]);
        sort_by_field(&mut records, "rank").unwrap();
        assert_eq!(ranks(&records), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut records = vec![
            record(json!({"rank": 2, "id": "a"})),
            record(json!({"rank": 1, "id": "b"})),
            record(json!({"rank": 2, "id": "c"})),
            record(json!({"rank": 1, "id": "d"})),
        ];
        sort_by_field(&mut records, "rank").unwrap();
        let ids: Vec<_> = records.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!("b"), json!("d"), json!("a"), json!("c")]);
    }

    #[test]
    fn mixes_integers_floats_and_booleans() {
        let mut records = ranked(vec![json!(2.5), json!(true), json!(-4), json!(u64::MAX)]);
        sort_by_field(&mut records, "rank").unwrap();
        assert_eq!(
            ranks(&records),
            vec![json!(-4), json!(true), json!(2.5), json!(u64::MAX)]
        );
    }

    #[test]
    fn integers_and_floats_compare_exactly_past_f64_precision() {
        let mut records = ranked(vec![json!(9007199254740993_i64), json!(9007199254740992.0)]);
        sort_by_field(&mut records, "rank").unwrap();
        assert_eq!(
            ranks(&records),
            vec![json!(9007199254740992.0), json!(9007199254740993_i64)]
        );
    }

    #[test]
    fn int_float_comparison_handles_fractions_and_extremes() {
        assert_eq!(compare_int_float(2, 2.5), Ordering::Less);
        assert_eq!(compare_int_float(-2, -2.5), Ordering::Greater);
        assert_eq!(compare_int_float(3, 3.0), Ordering::Equal);
        assert_eq!(compare_int_float(i128::from(u64::MAX), 1e300), Ordering::Less);
        assert_eq!(compare_int_float(i128::from(i64::MIN), -1e300), Ordering::Greater);
    }

    #[test]
    fn sorts_strings_lexicographically() {
        let mut records = ranked(vec![json!("pear"), json!("Apple"), json!("apple")]);
        sort_by_field(&mut records, "rank").unwrap();
        assert_eq!(
            ranks(&records),
            vec![json!("Apple"), json!("apple"), json!("pear")]
        );
    }

    #[test]
    fn sorts_arrays_element_by_element() {
        let mut records = ranked(vec![json!([2, 0]), json!([1, 5]), json!([1]), json!([1, 5, 0])]);
        sort_by_field(&mut records, "rank").unwrap();
        assert_eq!(
            ranks(&records),
            vec![json!([1]), json!([1, 5]), json!([1, 5, 0]), json!([2, 0])]
        );
    }

    #[test]
    fn equal_unorderable_elements_do_not_stop_array_comparison() {
        let mut records = ranked(vec![json!([null, 2]), json!([null, 1])]);
        sort_by_field(&mut records, "rank").unwrap();
        assert_eq!(ranks(&records), vec![json!([null, 1]), json!([null, 2])]);
    }

    #[test]
    fn unorderable_array_elements_fail_without_reordering() {
        let mut records = ranked(vec![json!([2, "b"]), json!([2, 1])]);
        let err = sort_by_field(&mut records, "rank").unwrap_err();
        assert!(matches!(err, AggregateError::Comparison { .. }), "{err:?}");
        assert_eq!(ranks(&records), vec![json!([2, "b"]), json!([2, 1])]);
    }

    #[test]
    fn missing_field_reports_first_offending_index() {
        let mut records = vec![
            record(json!({"rank": 1})),
            record(json!({"title": "no rank"})),
            record(json!({})),
        ];
        let err = sort_by_field(&mut records, "rank").unwrap_err();
        assert!(
            matches!(err, AggregateError::FieldAccess { ref field, index: 1 } if field == "rank"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn mixed_strings_and_numbers_fail_without_reordering() {
        let mut records = ranked(vec![json!(2), json!(1), json!("three")]);
        let err = sort_by_field(&mut records, "rank").unwrap_err();
        assert!(matches!(err, AggregateError::Comparison { .. }), "{err:?}");
        assert_eq!(ranks(&records), vec![json!(2), json!(1), json!("three")]);
    }

    #[test]
    fn nulls_are_not_orderable() {
        let mut records = ranked(vec![Value::Null, Value::Null]);
        assert!(matches!(
            sort_by_field(&mut records, "rank"),
            Err(AggregateError::Comparison { .. })
        ));
    }

    #[test]
    fn single_record_needs_no_comparison() {
        let mut records = ranked(vec![json!({"nested": true})]);
        sort_by_field(&mut records, "rank").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn empty_input_is_fine() {
        let mut records: Vec<ResultItem> = Vec::new();
        sort_by_field(&mut records, "rank").unwrap();
    }

    #[test]
    fn compare_values_orders_arrays_but_rejects_objects_and_nulls() {
        assert_eq!(compare_values(&json!([1]), &json!([2])), Some(Ordering::Less));
        assert_eq!(compare_values(&json!([1, 2]), &json!([1])), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!([1]), &json!(["a"])), None);
        assert_eq!(compare_values(&json!({}), &json!({})), None);
        assert_eq!(compare_values(&Value::Null, &Value::Null), None);
        assert_eq!(compare_values(&json!(1), &json!(false)), Some(Ordering::Greater));
    }
}
