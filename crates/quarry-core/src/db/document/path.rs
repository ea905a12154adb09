use crate::{
    db::document::{DOC_ID, Document},
    error::{ErrorOrigin, QueryError},
    value::{Value, deep_equals},
};
use std::borrow::Cow;

///
/// Step
///
/// What a value offers to the next path segment.
///

enum Step<'a> {
    Document(&'a Document),
    Map(&'a [(Value, Value)]),
    List(&'a [Value]),
    Null,
    Scalar(&'a Value),
}

impl<'a> Step<'a> {
    const fn of(value: &'a Value) -> Self {
        match value {
            Value::Document(doc) => Self::Document(doc),
            Value::Map(entries) => Self::Map(entries.as_slice()),
            Value::List(items) => Self::List(items.as_slice()),
            Value::Null => Self::Null,
            _ => Self::Scalar(value),
        }
    }
}

pub(super) fn resolve<'a>(
    doc: &'a Document,
    path: &str,
    separator: char,
) -> Result<Option<Cow<'a, Value>>, QueryError> {
    if path.is_empty() {
        return Err(QueryError::empty_field(ErrorOrigin::Document));
    }

    if path == DOC_ID {
        if let Some(id) = doc.id() {
            return Ok(Some(Cow::Owned(Value::Uint(id.get()))));
        }
    }

    // a key stored verbatim wins over embedded interpretation
    if let Some(value) = doc.field(path) {
        return Ok(Some(Cow::Borrowed(value)));
    }

    let segments: Vec<&str> = path.split(separator).collect();
    let Some((head, rest)) = segments.split_first() else {
        return Ok(None);
    };
    if head.is_empty() {
        return Err(invalid_path(path));
    }
    if rest.is_empty() {
        return Ok(None);
    }

    match doc.field(head) {
        Some(value) => resolve_segments(value, rest, path),
        None => Ok(None),
    }
}

fn resolve_segments<'a>(
    value: &'a Value,
    segments: &[&str],
    path: &str,
) -> Result<Option<Cow<'a, Value>>, QueryError> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(Some(Cow::Borrowed(value)));
    };
    if segment.is_empty() {
        return Err(invalid_path(path));
    }

    match Step::of(value) {
        Step::Document(doc) => match doc.field(segment) {
            Some(next) => resolve_segments(next, rest, path),
            None => Ok(None),
        },
        Step::Map(entries) => match entries.iter().find(|(k, _)| k.as_text() == Some(*segment)) {
            Some((_, next)) => resolve_segments(next, rest, path),
            None => Ok(None),
        },
        Step::List(items) => match parse_index(segment, path)? {
            Some(index) => {
                let item = items.get(index).ok_or_else(|| {
                    QueryError::filter(
                        ErrorOrigin::Document,
                        format!(
                            "index {index} is not less than the size of the list {}",
                            items.len()
                        ),
                    )
                })?;
                resolve_segments(item, rest, path)
            }
            None => project(items, segments, path).map(|found| Some(Cow::Owned(found))),
        },
        Step::Null => Ok(None),
        Step::Scalar(scalar) => Err(QueryError::filter(
            ErrorOrigin::Document,
            format!(
                "segment '{segment}' of field '{path}' cannot be resolved inside {} value {scalar}",
                scalar.kind_label()
            ),
        )),
    }
}

// Apply the remaining path to every embedded document of a list and collect
// the distinct values found; nested lists are flattened one level.
fn project(items: &[Value], segments: &[&str], path: &str) -> Result<Value, QueryError> {
    let mut found: Vec<Value> = Vec::new();

    for item in items {
        if !item.is_composite() {
            continue;
        }
        let Some(value) = resolve_segments(item, segments, path)? else {
            continue;
        };

        match value.into_owned() {
            Value::List(nested) => {
                for v in nested {
                    push_distinct(&mut found, v);
                }
            }
            other => push_distinct(&mut found, other),
        }
    }

    Ok(Value::List(found))
}

fn push_distinct(found: &mut Vec<Value>, value: Value) {
    if !found.iter().any(|v| deep_equals(v, &value)) {
        found.push(value);
    }
}

// Numeric segments address list positions; a leading '-' is never a key.
fn parse_index(segment: &str, path: &str) -> Result<Option<usize>, QueryError> {
    let digits = segment.strip_prefix('-').unwrap_or(segment);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }

    if segment.starts_with('-') {
        return Err(QueryError::filter(
            ErrorOrigin::Document,
            format!("invalid list index {segment} in field '{path}'"),
        ));
    }

    segment.parse::<usize>().map(Some).map_err(|_| {
        QueryError::filter(
            ErrorOrigin::Document,
            format!("list index {segment} in field '{path}' is out of range"),
        )
    })
}

fn invalid_path(path: &str) -> QueryError {
    QueryError::validation(
        ErrorOrigin::Document,
        format!("invalid embedded field '{path}'"),
    )
}
