//! Exact cross-type numeric ordering.
//!
//! Every finite number is lifted into an exact rational before comparison, so
//! `Int(1)`, `Float64(1.0)` and `Decimal(1.00)` are equal and large integers do
//! not lose precision against floats. NaN and the infinities have no rational
//! form; any comparison that involves one falls back to IEEE-754 total order
//! with NaN as the greatest value and all NaNs equal.

use crate::value::Value;
use num_bigint::BigInt;
use num_traits::{One, ToPrimitive, Zero};
use std::cmp::Ordering;

///
/// NumericRepr
///

enum NumericRepr {
    Exact(Rational),
    /// Non-finite float.
    Float(f64),
}

///
/// Rational
///
/// `numer / denom` with `denom > 0`. Not reduced.
///

struct Rational {
    numer: BigInt,
    denom: BigInt,
}

impl Rational {
    fn integer(numer: impl Into<BigInt>) -> Self {
        Self {
            numer: numer.into(),
            denom: BigInt::one(),
        }
    }

    fn cmp_exact(&self, other: &Self) -> Ordering {
        (&self.numer * &other.denom).cmp(&(&other.numer * &self.denom))
    }
}

/// Compare two numeric values by exact value.
///
/// Returns `None` unless both sides are numeric variants.
#[must_use]
pub fn compare_numbers(left: &Value, right: &Value) -> Option<Ordering> {
    // fast path for the common integer shapes
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => return Some(a.cmp(b)),
        (Value::Uint(a), Value::Uint(b)) => return Some(a.cmp(b)),
        (Value::Int(a), Value::Uint(b)) => return Some(i128::from(*a).cmp(&i128::from(*b))),
        (Value::Uint(a), Value::Int(b)) => return Some(i128::from(*a).cmp(&i128::from(*b))),
        _ => {}
    }

    let ordering = match (numeric_repr(left)?, numeric_repr(right)?) {
        (NumericRepr::Exact(a), NumericRepr::Exact(b)) => a.cmp_exact(&b),
        (NumericRepr::Float(a), NumericRepr::Float(b)) => float_total_cmp(a, b),
        (NumericRepr::Float(a), NumericRepr::Exact(_)) => float_total_cmp(a, to_f64(right)?),
        (NumericRepr::Exact(_), NumericRepr::Float(b)) => float_total_cmp(to_f64(left)?, b),
    };

    Some(ordering)
}

fn numeric_repr(value: &Value) -> Option<NumericRepr> {
    let repr = match value {
        Value::Int(v) => NumericRepr::Exact(Rational::integer(*v)),
        Value::Uint(v) => NumericRepr::Exact(Rational::integer(*v)),
        Value::IntBig(v) => NumericRepr::Exact(Rational::integer(v.clone())),
        Value::Decimal(d) => NumericRepr::Exact(Rational {
            numer: BigInt::from(d.mantissa()),
            denom: BigInt::from(10u32).pow(d.scale()),
        }),
        Value::Float32(v) => float_repr(f64::from(*v)),
        Value::Float64(v) => float_repr(*v),
        _ => return None,
    };

    Some(repr)
}

fn float_repr(value: f64) -> NumericRepr {
    if value.is_finite() {
        NumericRepr::Exact(rational_from_f64(value))
    } else {
        NumericRepr::Float(value)
    }
}

// Decompose a finite double into sign * mantissa * 2^exponent without rounding.
fn rational_from_f64(value: f64) -> Rational {
    let bits = value.to_bits();
    let negative = bits >> 63 == 1;
    let biased = i32::try_from((bits >> 52) & 0x7ff).unwrap_or(0);
    let fraction = bits & ((1u64 << 52) - 1);

    let (mantissa, exponent) = if biased == 0 {
        // subnormal
        (fraction, 1 - 1075)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };

    let mut numer = BigInt::from(mantissa);
    if negative {
        numer = -numer;
    }
    if numer.is_zero() {
        return Rational::integer(0);
    }

    if exponent >= 0 {
        Rational {
            numer: numer << exponent.unsigned_abs(),
            denom: BigInt::one(),
        }
    } else {
        Rational {
            numer,
            denom: BigInt::one() << exponent.unsigned_abs(),
        }
    }
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Decimal(d) => d.to_f64(),
        Value::Float32(v) => Some(f64::from(*v)),
        Value::Float64(v) => Some(*v),
        Value::Int(v) => v.to_f64(),
        Value::IntBig(v) => v.to_f64(),
        Value::Uint(v) => v.to_f64(),
        _ => None,
    }
}

// NaN sorts above everything and equals itself.
fn float_total_cmp(left: f64, right: f64) -> Ordering {
    match (left.is_nan(), right.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => left.total_cmp(&right),
    }
}
