//! Natural ordering over JSON values.
//!
//! JSON has no total order of its own, so values are ranked by type first
//! (null, booleans, numbers, strings, arrays, objects) and then compared within their type.
//! Integers compare exactly, whatever their magnitude; a float against an integer compares by
//! value without rounding the integer. A missing field ranks as null.

use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Borrowed, totally ordered view of a JSON value.
#[derive(Debug, Clone, Copy)]
pub enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(&'a Number),
    String(&'a str),
    Array(&'a [Value]),
    Object(&'a serde_json::Map<String, Value>),
}

impl Comparable<'_> {
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Bool(_) => 1,
            Comparable::Number(_) => 2,
            Comparable::String(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::Object(_) => 5,
        }
    }
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(value) => Comparable::Number(value),
            Value::String(value) => Comparable::String(value),
            Value::Array(values) => Comparable::Array(values),
            Value::Object(map) => Comparable::Object(map),
        }
    }
}

impl<'a> From<Option<&'a Value>> for Comparable<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        value.map(Comparable::from).unwrap_or(Comparable::Null)
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Comparable<'_> {}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Comparable<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Ordering::Equal,
            (Comparable::Bool(a), Comparable::Bool(b)) => a.cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => compare_numbers(a, b),
            (Comparable::String(a), Comparable::String(b)) => a.cmp(b),
            (Comparable::Array(a), Comparable::Array(b)) => a
                .iter()
                .map(Comparable::from)
                .cmp(b.iter().map(Comparable::from)),
            (Comparable::Object(a), Comparable::Object(b)) => a
                .iter()
                .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                .cmp(b.iter().map(|(k, v)| (k.as_str(), Comparable::from(v)))),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Every `i64` and `u64` fits in an `i128`.
enum Numeric {
    Integer(i128),
    Float(f64),
}

impl From<&Number> for Numeric {
    fn from(number: &Number) -> Self {
        if let Some(n) = number.as_i64() {
            Numeric::Integer(n.into())
        } else if let Some(n) = number.as_u64() {
            Numeric::Integer(n.into())
        } else {
            Numeric::Float(number.as_f64().unwrap_or(f64::NAN))
        }
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    match (Numeric::from(a), Numeric::from(b)) {
        (Numeric::Integer(a), Numeric::Integer(b)) => a.cmp(&b),
        (Numeric::Float(a), Numeric::Float(b)) => a.total_cmp(&b),
        (Numeric::Integer(a), Numeric::Float(b)) => compare_integer_to_float(a, b),
        (Numeric::Float(a), Numeric::Integer(b)) => compare_integer_to_float(b, a).reverse(),
    }
}

fn compare_integer_to_float(integer: i128, float: f64) -> Ordering {
    if float.is_nan() {
        return Ordering::Less;
    }
    // i128::MAX as f64 rounds up to 2^127, which is out of range
    if float >= i128::MAX as f64 {
        return Ordering::Less;
    }
    if float < i128::MIN as f64 {
        return Ordering::Greater;
    }

    let whole = float.trunc();
    match integer.cmp(&(whole as i128)) {
        Ordering::Equal => 0.0_f64
            .partial_cmp(&(float - whole))
            .unwrap_or(Ordering::Equal),
        unequal => unequal,
    }
}

/// Compares two optional JSON values under the natural ordering.
pub fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    Comparable::from(left).cmp(&Comparable::from(right))
}
