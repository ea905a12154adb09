use crate::{
    db::{
        document::{DOC_ID, ELEMENT_FIELD, RecordId},
        filter::{
            CompareOp, ComparisonFilter, ElementMatchFilter, Filter, MembershipFilter,
            RegexFilter, TextFilter,
        },
    },
    traits::FieldValue,
    value::Value,
};

/// Start a filter on `name`. Embedded fields use the configured separator,
/// e.g. `where_field("address.city")`.
#[must_use]
pub const fn where_field(name: &str) -> FieldRef<'_> {
    FieldRef::new(name)
}

/// Field reference standing for the list element itself inside an element
/// match over scalar elements.
#[must_use]
pub const fn element() -> FieldRef<'static> {
    FieldRef::new(ELEMENT_FIELD)
}

/// Match the record with the given identifier.
#[must_use]
pub fn by_id(id: RecordId) -> Filter {
    where_field(DOC_ID).eq(id)
}

///
/// FieldRef
///
/// Borrowed field name with method-based filter builders.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FieldRef<'a>(&'a str);

impl<'a> FieldRef<'a> {
    #[must_use]
    pub const fn new(name: &'a str) -> Self {
        Self(name)
    }

    #[must_use]
    pub const fn as_str(self) -> &'a str {
        self.0
    }

    // ------------------------------------------------------------------
    // Comparison filters
    // ------------------------------------------------------------------

    /// Deep equality; a `None`/null operand also matches a missing field.
    #[must_use]
    pub fn eq(self, value: impl FieldValue) -> Filter {
        self.compare(CompareOp::Eq, value.to_value())
    }

    #[must_use]
    pub fn gt(self, value: impl FieldValue) -> Filter {
        self.compare(CompareOp::Gt, value.to_value())
    }

    #[must_use]
    pub fn gte(self, value: impl FieldValue) -> Filter {
        self.compare(CompareOp::Gte, value.to_value())
    }

    #[must_use]
    pub fn lt(self, value: impl FieldValue) -> Filter {
        self.compare(CompareOp::Lt, value.to_value())
    }

    #[must_use]
    pub fn lte(self, value: impl FieldValue) -> Filter {
        self.compare(CompareOp::Lte, value.to_value())
    }

    // ------------------------------------------------------------------
    // Range sugar
    // ------------------------------------------------------------------

    /// Inclusive range `lower <= field <= upper`.
    #[must_use]
    pub fn between(self, lower: impl FieldValue, upper: impl FieldValue) -> Filter {
        self.between_with(lower, upper, true, true)
    }

    /// Range with the same inclusivity on both bounds.
    #[must_use]
    pub fn between_inclusive(
        self,
        lower: impl FieldValue,
        upper: impl FieldValue,
        inclusive: bool,
    ) -> Filter {
        self.between_with(lower, upper, inclusive, inclusive)
    }

    /// Range with independent bound inclusivity. Expands to a two-leaf `And`.
    #[must_use]
    pub fn between_with(
        self,
        lower: impl FieldValue,
        upper: impl FieldValue,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> Filter {
        let lower_op = if lower_inclusive {
            CompareOp::Gte
        } else {
            CompareOp::Gt
        };
        let upper_op = if upper_inclusive {
            CompareOp::Lte
        } else {
            CompareOp::Lt
        };

        Filter::And(vec![
            self.compare(lower_op, lower.to_value()),
            self.compare(upper_op, upper.to_value()),
        ])
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    #[must_use]
    pub fn in_<V: FieldValue>(self, values: impl IntoIterator<Item = V>) -> Filter {
        Filter::In(MembershipFilter::new(self.0, collect(values)))
    }

    #[must_use]
    pub fn not_in<V: FieldValue>(self, values: impl IntoIterator<Item = V>) -> Filter {
        Filter::NotIn(MembershipFilter::new(self.0, collect(values)))
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Unanchored regular-expression search over a text field.
    #[must_use]
    pub fn regex(self, pattern: impl Into<String>) -> Filter {
        Filter::Regex(RegexFilter {
            field: self.0.to_string(),
            pattern: pattern.into(),
        })
    }

    /// Full-text search; requires a full-text index on the field.
    #[must_use]
    pub fn text(self, query: impl Into<String>) -> Filter {
        Filter::Text(TextFilter {
            field: self.0.to_string(),
            query: query.into(),
        })
    }

    // ------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------

    /// Match records whose list field has at least one element matching
    /// `filter`. Use `element()` inside `filter` for scalar elements.
    #[must_use]
    pub fn elem_match(self, filter: Filter) -> Filter {
        Filter::ElementMatch(ElementMatchFilter {
            field: self.0.to_string(),
            filter: Box::new(filter),
        })
    }

    fn compare(self, op: CompareOp, value: Value) -> Filter {
        Filter::Compare(ComparisonFilter::new(self.0, op, value))
    }
}

fn collect<V: FieldValue>(values: impl IntoIterator<Item = V>) -> Vec<Value> {
    values.into_iter().map(|v| v.to_value()).collect()
}
