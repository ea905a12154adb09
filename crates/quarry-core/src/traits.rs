use crate::{
    db::document::{Document, RecordId},
    value::Value,
};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use time::OffsetDateTime;

///
/// FieldValue
///
/// Conversion boundary for values stored in documents and used as filter
/// operands.
///

pub trait FieldValue {
    fn to_value(&self) -> Value;

    #[must_use]
    fn from_value(value: &Value) -> Option<Self>
    where
        Self: Sized;
}

impl FieldValue for &str {
    fn to_value(&self) -> Value {
        Value::Text((*self).to_string())
    }

    fn from_value(_value: &Value) -> Option<Self> {
        None
    }
}

impl FieldValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_text().map(ToString::to_string)
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            return Some(None);
        }

        T::from_value(value).map(Some)
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        let items = value.as_list()?;

        let mut out = Self::with_capacity(items.len());
        for item in items {
            out.push(T::from_value(item)?);
        }

        Some(out)
    }
}

impl FieldValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FieldValue for Document {
    fn to_value(&self) -> Value {
        Value::Document(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_document().cloned()
    }
}

impl FieldValue for RecordId {
    fn to_value(&self) -> Value {
        Value::Uint(self.get())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Uint(v) => Some(Self::new(*v)),
            Value::Int(v) => u64::try_from(*v).ok().map(Self::new),
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FieldValue for OffsetDateTime {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }
}

// impl_field_value
macro_rules! impl_field_value {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl FieldValue for $type {
                fn to_value(&self) -> Value {
                    Value::$variant((*self).into())
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => (*v).try_into().ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_field_value!(
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Uint,
    u16 => Uint,
    u32 => Uint,
    u64 => Uint,
    bool => Bool,
    f32 => Float32,
    f64 => Float64,
    Decimal => Decimal,
);

impl FieldValue for BigInt {
    fn to_value(&self) -> Value {
        Value::IntBig(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::IntBig(v) => Some(v.clone()),
            Value::Int(v) => Some(Self::from(*v)),
            Value::Uint(v) => Some(Self::from(*v)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_map_to_their_variants() {
        assert_eq!(7i32.to_value(), Value::Int(7));
        assert_eq!(7u8.to_value(), Value::Uint(7));
        assert_eq!("x".to_value(), Value::Text("x".into()));
        assert_eq!(Option::<i64>::None.to_value(), Value::Null);
        assert_eq!(vec![1u32, 2].to_value(), Value::from_list([1u32, 2]));
    }

    #[test]
    fn narrowing_round_trip_rejects_overflow() {
        assert_eq!(i8::from_value(&Value::Int(300)), None);
        assert_eq!(u16::from_value(&Value::Uint(300)), Some(300));
    }

    #[test]
    fn record_ids_read_back_from_text() {
        assert_eq!(
            RecordId::from_value(&Value::Text("42".into())),
            Some(RecordId::new(42))
        );
    }
}
