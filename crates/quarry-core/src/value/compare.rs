use crate::{
    db::document::Document,
    error::{ErrorOrigin, QueryError},
    value::{Value, ValueEnum, number::compare_numbers},
};
use std::cmp::Ordering;

/// Comparison used by range filters.
///
/// Rules:
/// 1. `Null` sorts before everything; two nulls are equal
/// 2. numeric values compare by exact value across variants
/// 3. other values compare only against the same orderable variant
///
/// Anything else is a filter error naming the offending value.
pub fn compare(left: &Value, right: &Value) -> Result<Ordering, QueryError> {
    match (left, right) {
        (Value::Null, Value::Null) => return Ok(Ordering::Equal),
        (Value::Null, _) => return Ok(Ordering::Less),
        (_, Value::Null) => return Ok(Ordering::Greater),
        _ => {}
    }

    if let Some(ordering) = strict_order_cmp(left, right) {
        return Ok(ordering);
    }

    let err = if !left.is_comparable() {
        QueryError::not_comparable(ErrorOrigin::Compare, left)
    } else if !right.is_comparable() {
        QueryError::not_comparable(ErrorOrigin::Compare, right)
    } else {
        QueryError::filter(
            ErrorOrigin::Compare,
            format!(
                "{} value {left} is not comparable with {} value {right}",
                left.kind_label(),
                right.kind_label()
            ),
        )
    };

    Err(err)
}

/// Strict comparator for orderable values of a compatible kind.
///
/// Returns `None` for mismatched or non-orderable variants.
#[must_use]
pub fn strict_order_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Enum(a), Value::Enum(b)) if a.path == b.path => Some(a.ordinal.cmp(&b.ordinal)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        _ => compare_numbers(left, right),
    }
}

/// Structural equality used by equality and membership filters.
///
/// Numbers are equal when their values are equal, regardless of variant.
/// Lists and maps compare position by position; documents compare field by
/// field. Everything else falls back to variant equality.
#[must_use]
pub fn deep_equals(left: &Value, right: &Value) -> bool {
    if left.is_numeric() && right.is_numeric() {
        return compare_numbers(left, right) == Some(Ordering::Equal);
    }

    match (left, right) {
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equals(x, y))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|((ka, va), (kb, vb))| deep_equals(ka, kb) && deep_equals(va, vb))
        }
        (Value::Document(a), Value::Document(b)) => documents_equal(a, b),
        _ => left == right,
    }
}

fn documents_equal(left: &Document, right: &Document) -> bool {
    left.len() == right.len()
        && left
            .fields()
            .zip(right.fields())
            .all(|((ka, va), (kb, vb))| ka == kb && deep_equals(va, vb))
}

/// Total canonical comparator used for index keys.
///
/// Ordering rules:
/// 1. Canonical variant rank (all numeric variants share one rank)
/// 2. Variant-specific comparison for same-ranked values
///
/// Two values are canonically equal exactly when `deep_equals` holds.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    let rank = canonical_rank(left).cmp(&canonical_rank(right));
    if rank != Ordering::Equal {
        return rank;
    }

    canonical_cmp_same_rank(left, right)
}

/// Stable rank of each value family. Changing these values reorders every
/// persisted index.
pub(crate) const fn canonical_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Decimal(_)
        | Value::Float32(_)
        | Value::Float64(_)
        | Value::Int(_)
        | Value::IntBig(_)
        | Value::Uint(_) => 2,
        Value::Text(_) => 3,
        Value::Timestamp(_) => 4,
        Value::Enum(_) => 5,
        Value::List(_) => 6,
        Value::Map(_) => 7,
        Value::Document(_) => 8,
    }
}

fn canonical_cmp_same_rank(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
        (Value::Enum(a), Value::Enum(b)) => canonical_cmp_value_enum(a, b),
        (Value::List(a), Value::List(b)) => canonical_cmp_value_list(a, b),
        (Value::Map(a), Value::Map(b)) => canonical_cmp_value_map(a, b),
        (Value::Document(a), Value::Document(b)) => canonical_cmp_document(a, b),
        _ => compare_numbers(left, right).unwrap_or(Ordering::Equal),
    }
}

fn canonical_cmp_value_enum(left: &ValueEnum, right: &ValueEnum) -> Ordering {
    left.path
        .cmp(&right.path)
        .then(left.ordinal.cmp(&right.ordinal))
        .then_with(|| left.variant.cmp(&right.variant))
}

fn canonical_cmp_value_list(left: &[Value], right: &[Value]) -> Ordering {
    for (a, b) in left.iter().zip(right) {
        let ordering = canonical_cmp(a, b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    left.len().cmp(&right.len())
}

fn canonical_cmp_value_map(left: &[(Value, Value)], right: &[(Value, Value)]) -> Ordering {
    for ((left_key, left_value), (right_key, right_value)) in left.iter().zip(right) {
        let ordering =
            canonical_cmp(left_key, right_key).then_with(|| canonical_cmp(left_value, right_value));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    left.len().cmp(&right.len())
}

fn canonical_cmp_document(left: &Document, right: &Document) -> Ordering {
    for ((left_key, left_value), (right_key, right_value)) in left.fields().zip(right.fields()) {
        let ordering = left_key
            .cmp(right_key)
            .then_with(|| canonical_cmp(left_value, right_value));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    left.len().cmp(&right.len())
}
