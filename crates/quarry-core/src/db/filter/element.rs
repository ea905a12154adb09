//! Element match over list fields.
//!
//! The inner filter is evaluated against each list element in turn, using a
//! reduced dialect: combinators, comparisons, membership and regex. An element
//! that is a sub-document is matched through the inner leaf's field; a scalar
//! element stands in for the field value itself.

use crate::{
    db::{
        document::Document,
        filter::{
            CompareOp, ComparisonFilter, ElementMatchFilter, EvalContext, Filter,
            MembershipFilter, RegexFilter, eval::compile_regex,
        },
    },
    error::{ErrorOrigin, QueryError},
    value::{Value, compare_numbers, deep_equals, strict_order_cmp},
};
use std::{borrow::Cow, cmp::Ordering};

pub(crate) fn apply(
    filter: &ElementMatchFilter,
    ctx: &EvalContext<'_>,
    doc: &Document,
) -> Result<bool, QueryError> {
    check_dialect(&filter.filter)?;

    let value = doc.resolve(&filter.field, ctx.config().field_separator)?;
    match value.as_deref() {
        None | Some(Value::Null) => Ok(false),
        Some(Value::List(items)) => {
            for item in items {
                if matches(item, &filter.filter, ctx)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Some(_) => Err(QueryError::filter(
            ErrorOrigin::ElementMatch,
            "elemMatch filter only applies to array or iterable",
        )),
    }
}

/// Reject inner filters outside the element-match dialect.
pub(crate) fn check_dialect(filter: &Filter) -> Result<(), QueryError> {
    match filter {
        Filter::And(children) | Filter::Or(children) => {
            children.iter().try_for_each(check_dialect)
        }
        Filter::Not(inner) => check_dialect(inner),
        Filter::Compare(_) | Filter::In(_) | Filter::NotIn(_) | Filter::Regex(_) => Ok(()),
        other => Err(dialect_error(other)),
    }
}

fn dialect_error(filter: &Filter) -> QueryError {
    match filter {
        Filter::ElementMatch(_) => QueryError::filter(
            ErrorOrigin::ElementMatch,
            "nested elemMatch filter is not supported",
        ),
        Filter::Text(_) => QueryError::filter(
            ErrorOrigin::ElementMatch,
            "text filter is not supported in elemMatch filter",
        ),
        other => QueryError::unsupported(
            ErrorOrigin::ElementMatch,
            format!("filter {other} is not supported in elemMatch"),
        ),
    }
}

fn matches(item: &Value, filter: &Filter, ctx: &EvalContext<'_>) -> Result<bool, QueryError> {
    match filter {
        Filter::And(children) => {
            for child in children {
                if !matches(item, child, ctx)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Filter::Or(children) => {
            for child in children {
                if matches(item, child, ctx)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Filter::Not(inner) => Ok(!matches(item, inner, ctx)?),
        Filter::Compare(c) if c.op == CompareOp::Eq => match_equal(item, c, ctx),
        Filter::Compare(c) => match_order(item, c, ctx),
        Filter::In(m) => match_in(item, m, ctx, false),
        Filter::NotIn(m) => match_in(item, m, ctx, true),
        Filter::Regex(r) => match_regex(item, r, ctx),
        other => Err(dialect_error(other)),
    }
}

// Field of a sub-document element, or None when the element is a scalar.
fn sub_field<'a>(
    item: &'a Value,
    field: &str,
    ctx: &EvalContext<'_>,
) -> Result<Option<Option<Cow<'a, Value>>>, QueryError> {
    match item {
        Value::Document(doc) => doc
            .resolve(field, ctx.config().field_separator)
            .map(Some),
        _ => Ok(None),
    }
}

fn match_equal(
    item: &Value,
    filter: &ComparisonFilter,
    ctx: &EvalContext<'_>,
) -> Result<bool, QueryError> {
    let operand = filter.operand.resolve(&filter.field)?;

    match sub_field(item, &filter.field, ctx)? {
        Some(value) => Ok(deep_equals(value.as_deref().unwrap_or(&Value::Null), operand)),
        None => Ok(deep_equals(item, operand)),
    }
}

fn match_order(
    item: &Value,
    filter: &ComparisonFilter,
    ctx: &EvalContext<'_>,
) -> Result<bool, QueryError> {
    let operand = filter.operand.resolve(&filter.field)?;
    if operand.is_null() {
        return Err(QueryError::validation(
            ErrorOrigin::ElementMatch,
            format!("null operand is not allowed for '{}' comparison", filter.op.symbol()),
        ));
    }

    let ordering = if let Some(ordering) = compare_numbers(item, operand) {
        ordering
    } else if item.is_comparable() {
        order(item, operand)?
    } else if let Some(value) = sub_field(item, &filter.field, ctx)? {
        match value.as_deref() {
            Some(value) if value.is_comparable() => order(value, operand)?,
            _ => {
                return Err(QueryError::not_comparable(
                    ErrorOrigin::ElementMatch,
                    &filter.field,
                ));
            }
        }
    } else {
        return Err(QueryError::not_comparable(ErrorOrigin::ElementMatch, item));
    };

    Ok(filter.op.accepts(ordering))
}

fn order(value: &Value, operand: &Value) -> Result<Ordering, QueryError> {
    strict_order_cmp(value, operand)
        .ok_or_else(|| QueryError::not_comparable(ErrorOrigin::ElementMatch, value))
}

// Elements without a native ordering never match, in either polarity.
fn match_in(
    item: &Value,
    filter: &MembershipFilter,
    ctx: &EvalContext<'_>,
    negated: bool,
) -> Result<bool, QueryError> {
    let values = filter.values.resolve(&filter.field)?;

    let candidate = match sub_field(item, &filter.field, ctx)? {
        Some(value) => value.map(Cow::into_owned),
        None => Some(item.clone()),
    };

    Ok(match candidate {
        Some(value) if value.is_comparable() => {
            values.iter().any(|v| deep_equals(v, &value)) != negated
        }
        _ => false,
    })
}

fn match_regex(item: &Value, filter: &RegexFilter, ctx: &EvalContext<'_>) -> Result<bool, QueryError> {
    let regex = compile_regex(&filter.pattern, ctx.config())?;

    match item {
        Value::Text(text) => Ok(regex.is_match(text)),
        Value::Document(doc) => {
            match doc.resolve(&filter.field, ctx.config().field_separator)?.as_deref() {
                Some(Value::Text(text)) => Ok(regex.is_match(text)),
                _ => Err(QueryError::filter(
                    ErrorOrigin::ElementMatch,
                    format!("{} is not a string", filter.field),
                )),
            }
        }
        other => Err(QueryError::filter(
            ErrorOrigin::ElementMatch,
            format!("{other} is not a string"),
        )),
    }
}
