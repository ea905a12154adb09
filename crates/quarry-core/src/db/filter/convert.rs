//! Operand conversion for filters evaluated against object-mapped records.
//!
//! Records written through an object mapper store enums as their variant name
//! and timestamps as epoch milliseconds. Filters built against such records
//! carry an object-context flag; when set, operands are converted into the
//! stored representation once and cached on the filter.

use crate::{
    error::{ErrorOrigin, QueryError},
    value::Value,
};
use std::sync::OnceLock;

/// Validate a filter operand and convert it into its comparable stored form.
///
/// Outside an object context the operand is returned unchanged. Inside one, a
/// non-null operand must be natively comparable.
pub fn validate_and_convert(
    field: &str,
    raw: &Value,
    object_context: bool,
) -> Result<Value, QueryError> {
    if field.is_empty() {
        return Err(QueryError::empty_field(ErrorOrigin::Convert));
    }
    if !object_context || raw.is_null() {
        return Ok(raw.clone());
    }
    if !raw.is_comparable() {
        return Err(QueryError::validation(
            ErrorOrigin::Convert,
            format!("search term {raw} for field '{field}' is not comparable"),
        ));
    }

    Ok(convert_value(raw))
}

fn convert_value(value: &Value) -> Value {
    match value {
        Value::Enum(e) => Value::Text(e.variant.clone()),
        Value::Timestamp(ts) => {
            let millis = ts.unix_timestamp_nanos() / 1_000_000;
            i64::try_from(millis).map_or_else(|_| Value::IntBig(millis.into()), Value::Int)
        }
        other => other.clone(),
    }
}

///
/// ObjectContext
///
/// Set-once flag. Reading it before any bind freezes it to `false`.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct ObjectContext(OnceLock<bool>);

impl ObjectContext {
    pub(crate) fn bind(&self, enabled: bool, field: &str) -> Result<(), QueryError> {
        let current = *self.0.get_or_init(|| enabled);
        if current == enabled {
            Ok(())
        } else {
            Err(QueryError::validation(
                ErrorOrigin::Convert,
                format!("object context of the filter on '{field}' is already set to {current}"),
            ))
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        *self.0.get_or_init(|| false)
    }
}

///
/// Operand
///
/// Right-hand side of a comparison leaf plus its cached converted form.
///

#[derive(Clone, Debug)]
pub(crate) struct Operand {
    raw: Value,
    context: ObjectContext,
    converted: OnceLock<Value>,
}

impl Operand {
    pub(crate) fn new(raw: Value) -> Self {
        Self {
            raw,
            context: ObjectContext::default(),
            converted: OnceLock::new(),
        }
    }

    pub(crate) const fn raw(&self) -> &Value {
        &self.raw
    }

    pub(crate) fn bind(&self, enabled: bool, field: &str) -> Result<(), QueryError> {
        self.context.bind(enabled, field)
    }

    /// Operand in the representation the stored field uses.
    pub(crate) fn resolve(&self, field: &str) -> Result<&Value, QueryError> {
        if !self.context.is_enabled() {
            return Ok(&self.raw);
        }
        if let Some(converted) = self.converted.get() {
            return Ok(converted);
        }

        let converted = validate_and_convert(field, &self.raw, true)?;

        Ok(self.converted.get_or_init(|| converted))
    }
}

impl PartialEq for Operand {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

///
/// ValueSet
///
/// Operand set of a membership leaf. The canonical form is computed on first
/// use and reused by every later evaluation.
///

#[derive(Clone, Debug)]
pub(crate) struct ValueSet {
    raw: Vec<Value>,
    context: ObjectContext,
    canonical: OnceLock<Vec<Value>>,
}

impl ValueSet {
    pub(crate) fn new(raw: Vec<Value>) -> Self {
        Self {
            raw,
            context: ObjectContext::default(),
            canonical: OnceLock::new(),
        }
    }

    pub(crate) fn raw(&self) -> &[Value] {
        &self.raw
    }

    pub(crate) fn bind(&self, enabled: bool, field: &str) -> Result<(), QueryError> {
        self.context.bind(enabled, field)
    }

    /// Structural checks that do not touch the object-context flag.
    pub(crate) fn check(&self, field: &str) -> Result<(), QueryError> {
        if field.is_empty() {
            return Err(QueryError::empty_field(ErrorOrigin::Convert));
        }
        if self.raw.is_empty() {
            return Err(QueryError::validation(
                ErrorOrigin::Convert,
                format!("values cannot be empty for membership filter on '{field}'"),
            ));
        }
        if let Some(bad) = self.raw.iter().find(|v| !v.is_null() && !v.is_comparable()) {
            return Err(QueryError::validation(
                ErrorOrigin::Convert,
                format!("{bad} is not comparable and cannot be used in a membership filter"),
            ));
        }

        Ok(())
    }

    pub(crate) fn resolve(&self, field: &str) -> Result<&[Value], QueryError> {
        if let Some(canonical) = self.canonical.get() {
            return Ok(canonical);
        }

        self.check(field)?;
        let object = self.context.is_enabled();
        let canonical = self
            .raw
            .iter()
            .map(|v| validate_and_convert(field, v, object))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.canonical.get_or_init(|| canonical))
    }
}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueEnum;
    use time::OffsetDateTime;

    #[test]
    fn plain_context_passes_operands_through() {
        let raw = Value::Enum(ValueEnum::new("Status", "Active", 0));

        assert_eq!(validate_and_convert("status", &raw, false), Ok(raw));
    }

    #[test]
    fn object_context_stores_enums_by_variant_name() {
        let raw = Value::Enum(ValueEnum::new("Status", "Active", 0));

        assert_eq!(
            validate_and_convert("status", &raw, true),
            Ok(Value::Text("Active".into()))
        );
    }

    #[test]
    fn object_context_stores_timestamps_as_millis() {
        let ts = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();

        assert_eq!(
            validate_and_convert("at", &Value::Timestamp(ts), true),
            Ok(Value::Int(1_700_000_000_000))
        );
    }

    #[test]
    fn object_context_rejects_composite_operands() {
        let err = validate_and_convert("tags", &Value::from_list(["a"]), true)
            .expect_err("lists are not search terms");

        assert!(err.is_validation());
    }

    #[test]
    fn empty_field_is_rejected_in_any_context() {
        assert!(validate_and_convert("", &Value::Int(1), false).is_err());
    }

    #[test]
    fn context_flag_is_set_once() {
        let operand = Operand::new(Value::Int(1));

        operand.bind(true, "a").unwrap();
        operand.bind(true, "a").unwrap();
        assert!(operand.bind(false, "a").unwrap_err().is_validation());
    }

    #[test]
    fn first_evaluation_freezes_the_plain_context() {
        let operand = Operand::new(Value::Int(1));

        assert_eq!(operand.resolve("a"), Ok(&Value::Int(1)));
        assert!(operand.bind(true, "a").is_err());
    }

    #[test]
    fn value_set_is_converted_once_and_cached() {
        let set = ValueSet::new(vec![Value::Enum(ValueEnum::new("Status", "Active", 0))]);
        set.bind(true, "status").unwrap();

        let first = set.resolve("status").unwrap().as_ptr();
        let second = set.resolve("status").unwrap().as_ptr();

        assert_eq!(first, second);
        assert_eq!(set.resolve("status").unwrap(), &[Value::Text("Active".into())]);
    }

    #[test]
    fn value_set_rejects_empty_and_composite_members() {
        assert!(ValueSet::new(vec![]).check("a").unwrap_err().is_validation());
        assert!(ValueSet::new(vec![Value::from_list([1])]).check("a").is_err());
        assert!(ValueSet::new(vec![Value::Null, Value::Int(1)]).check("a").is_ok());
    }
}
