//! Filter evaluation against a single record.
//!
//! Each leaf first asks the collection how its field is indexed. An ordered
//! index answers equality, range and membership leaves; a full-text index
//! answers text leaves. Everything else is evaluated directly against the
//! record's fields.

use crate::{
    config::QueryConfig,
    db::{
        document::{DOC_ID, Document, RecordId},
        filter::{
            CompareOp, ComparisonFilter, Filter, MembershipFilter, RegexFilter, TextFilter,
            element,
        },
        index::{
            FieldIndexState, IndexCatalog, IndexKind, OrderedIndex, RecordIdSet, TextIndex,
        },
        trace::{QueryTraceEvent, QueryTraceSink, emit},
    },
    error::{ErrorOrigin, QueryError},
    value::{Value, compare, deep_equals},
};
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;

///
/// EvalContext
///
/// Per-query evaluation environment: configuration plus the optional live
/// index catalog and trace sink of the collection being queried.
///

#[derive(Clone, Copy, Default)]
pub struct EvalContext<'a> {
    config: QueryConfig,
    indexes: Option<&'a dyn IndexCatalog>,
    trace: Option<&'a dyn QueryTraceSink>,
}

impl<'a> EvalContext<'a> {
    #[must_use]
    pub const fn new(config: QueryConfig) -> Self {
        Self {
            config,
            indexes: None,
            trace: None,
        }
    }

    #[must_use]
    pub const fn with_indexes(mut self, indexes: &'a dyn IndexCatalog) -> Self {
        self.indexes = Some(indexes);
        self
    }

    #[must_use]
    pub const fn with_trace(mut self, trace: &'a dyn QueryTraceSink) -> Self {
        self.trace = Some(trace);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Same context with index consultation switched off.
    #[must_use]
    pub const fn without_indexes(mut self) -> Self {
        self.indexes = None;
        self
    }

    pub(crate) fn field_index(&self, field: &str) -> FieldIndexState<'a> {
        self.indexes
            .map_or(FieldIndexState::Unindexed, |catalog| catalog.field_index(field))
    }

    pub(crate) const fn trace(&self) -> Option<&'a dyn QueryTraceSink> {
        self.trace
    }

    // `_id` falls back to the identifier the record is stored under.
    fn resolve<'d>(
        &self,
        doc: &'d Document,
        id: RecordId,
        field: &str,
    ) -> Result<Option<Cow<'d, Value>>, QueryError> {
        if field == DOC_ID && doc.id().is_none() {
            return Ok(Some(Cow::Owned(Value::Uint(id.get()))));
        }

        doc.resolve(field, self.config.field_separator)
    }
}

impl Filter {
    /// Evaluate against one record without any index.
    pub fn apply(&self, id: RecordId, doc: &Document) -> Result<bool, QueryError> {
        self.apply_in(&EvalContext::default(), id, doc)
    }

    /// Evaluate against one record, letting each leaf use the index on its
    /// field when the context carries a catalog.
    pub fn apply_in(
        &self,
        ctx: &EvalContext<'_>,
        id: RecordId,
        doc: &Document,
    ) -> Result<bool, QueryError> {
        match self {
            Self::All => Ok(true),
            Self::And(children) => {
                for child in children {
                    if !child.apply_in(ctx, id, doc)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Or(children) => {
                for child in children {
                    if child.apply_in(ctx, id, doc)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Not(inner) => Ok(!inner.apply_in(ctx, id, doc)?),
            Self::Compare(c) => c.apply(ctx, id, doc),
            Self::In(m) => m.apply(ctx, id, doc),
            Self::NotIn(m) => m.apply(ctx, id, doc).map(|found| !found),
            Self::Regex(r) => r.apply_non_indexed(ctx, id, doc),
            Self::Text(t) => t.apply(ctx, id, doc),
            Self::ElementMatch(e) => element::apply(e, ctx, doc),
        }
    }

    /// Evaluate directly against the record's fields, ignoring any index.
    pub fn apply_non_indexed(
        &self,
        ctx: &EvalContext<'_>,
        id: RecordId,
        doc: &Document,
    ) -> Result<bool, QueryError> {
        self.apply_in(&ctx.without_indexes(), id, doc)
    }

    /// Eagerly check the structure of the whole tree.
    pub fn validate(&self) -> Result<(), QueryError> {
        self.validate_with(&QueryConfig::default())
    }

    pub fn validate_with(&self, config: &QueryConfig) -> Result<(), QueryError> {
        match self {
            Self::All => Ok(()),
            Self::And(children) | Self::Or(children) => children
                .iter()
                .try_for_each(|child| child.validate_with(config)),
            Self::Not(inner) => inner.validate_with(config),
            Self::Compare(c) => {
                require_field(&c.field)?;
                if c.op.is_range() && c.value().is_null() {
                    return Err(null_range_operand(c));
                }
                Ok(())
            }
            Self::In(m) | Self::NotIn(m) => m.values.check(&m.field),
            Self::Regex(r) => {
                require_field(&r.field)?;
                compile_regex(&r.pattern, config).map(|_| ())
            }
            Self::Text(t) => require_field(&t.field),
            Self::ElementMatch(e) => {
                require_field(&e.field)?;
                element::check_dialect(&e.filter)?;
                e.filter.validate_with(config)
            }
        }
    }
}

///
/// COMPARISON
///

impl ComparisonFilter {
    pub fn apply(
        &self,
        ctx: &EvalContext<'_>,
        id: RecordId,
        doc: &Document,
    ) -> Result<bool, QueryError> {
        self.checked_operand()?;

        match ctx.field_index(&self.field) {
            FieldIndexState::Unindexed => self.apply_non_indexed(ctx, id, doc),
            FieldIndexState::Ordered(index) => {
                if self.op.is_range() {
                    reject_unorderable(ctx, doc, id, &self.field, ErrorOrigin::Compare)?;
                }
                let ids = self.lookup(index)?;
                emit(
                    ctx.trace(),
                    QueryTraceEvent::IndexLookup {
                        field: &self.field,
                        kind: IndexKind::Ordered,
                        matched: ids.len(),
                    },
                );
                Ok(ids.contains(&id))
            }
            // equality on tokenized text cannot use the index
            FieldIndexState::FullText(_) if self.op == CompareOp::Eq => {
                emit(
                    ctx.trace(),
                    QueryTraceEvent::IndexDegraded {
                        field: &self.field,
                        kind: IndexKind::FullText,
                    },
                );
                self.apply_non_indexed(ctx, id, doc)
            }
            state => Err(unusable_index(&self.field, self.op.symbol(), &state)),
        }
    }

    pub fn apply_non_indexed(
        &self,
        ctx: &EvalContext<'_>,
        id: RecordId,
        doc: &Document,
    ) -> Result<bool, QueryError> {
        let operand = self.checked_operand()?;

        if self.op == CompareOp::Eq && self.field == DOC_ID {
            return Ok(id_matches(doc.id().unwrap_or(id), operand));
        }

        let value = ctx.resolve(doc, id, &self.field)?;
        match (self.op, value.as_deref()) {
            (CompareOp::Eq, None) => Ok(operand.is_null()),
            (CompareOp::Eq, Some(value)) => Ok(deep_equals(value, operand)),
            (_, None | Some(Value::Null)) => Ok(false),
            (op, Some(value)) => Ok(op.accepts(compare(value, operand)?)),
        }
    }

    /// Answer this leaf from an ordered index.
    pub(crate) fn lookup(&self, index: &dyn OrderedIndex) -> Result<RecordIdSet, QueryError> {
        let operand = self.checked_operand()?;

        match self.op {
            CompareOp::Eq => index.find_equal(operand),
            CompareOp::Gt => index.find_greater_than(operand),
            CompareOp::Gte => index.find_greater_equal(operand),
            CompareOp::Lt => index.find_lesser_than(operand),
            CompareOp::Lte => index.find_lesser_equal(operand),
        }
    }

    fn checked_operand(&self) -> Result<&Value, QueryError> {
        require_field(&self.field)?;
        let operand = self.operand.resolve(&self.field)?;
        if self.op.is_range() && operand.is_null() {
            return Err(null_range_operand(self));
        }

        Ok(operand)
    }
}

// Identifiers compare by their string form.
fn id_matches(id: RecordId, operand: &Value) -> bool {
    match operand {
        Value::Text(s) => *s == id.to_string(),
        Value::Int(_) | Value::Uint(_) | Value::IntBig(_) => operand.to_string() == id.to_string(),
        _ => false,
    }
}

///
/// MEMBERSHIP
///

impl MembershipFilter {
    /// Whether the field value is one of the operands.
    pub fn apply(
        &self,
        ctx: &EvalContext<'_>,
        id: RecordId,
        doc: &Document,
    ) -> Result<bool, QueryError> {
        self.values.resolve(&self.field)?;

        match ctx.field_index(&self.field) {
            FieldIndexState::Unindexed => self.apply_non_indexed(ctx, id, doc),
            FieldIndexState::Ordered(index) => {
                reject_unorderable(ctx, doc, id, &self.field, ErrorOrigin::Filter)?;
                let ids = self.lookup(index)?;
                emit(
                    ctx.trace(),
                    QueryTraceEvent::IndexLookup {
                        field: &self.field,
                        kind: IndexKind::Ordered,
                        matched: ids.len(),
                    },
                );
                Ok(ids.contains(&id))
            }
            state => Err(unusable_index(&self.field, "in", &state)),
        }
    }

    /// Records whose indexed value is one of the operands.
    pub(crate) fn lookup(&self, index: &dyn OrderedIndex) -> Result<RecordIdSet, QueryError> {
        index.find_in(self.values.resolve(&self.field)?)
    }

    pub fn apply_non_indexed(
        &self,
        ctx: &EvalContext<'_>,
        id: RecordId,
        doc: &Document,
    ) -> Result<bool, QueryError> {
        let values = self.values.resolve(&self.field)?;

        match ctx.resolve(doc, id, &self.field)?.as_deref() {
            None | Some(Value::Null) => Ok(values.iter().any(Value::is_null)),
            Some(value) if value.is_comparable() => {
                Ok(values.iter().any(|candidate| deep_equals(candidate, value)))
            }
            Some(value) => Err(QueryError::not_comparable(ErrorOrigin::Filter, value)),
        }
    }
}

///
/// TEXT
///

impl RegexFilter {
    pub fn apply_non_indexed(
        &self,
        ctx: &EvalContext<'_>,
        id: RecordId,
        doc: &Document,
    ) -> Result<bool, QueryError> {
        require_field(&self.field)?;
        let regex = compile_regex(&self.pattern, ctx.config())?;

        match ctx.resolve(doc, id, &self.field)?.as_deref() {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Text(text)) => Ok(regex.is_match(text)),
            Some(_) => Err(QueryError::filter(
                ErrorOrigin::Filter,
                format!("{} is not a string", self.field),
            )),
        }
    }
}

impl TextFilter {
    pub fn apply(
        &self,
        ctx: &EvalContext<'_>,
        id: RecordId,
        _doc: &Document,
    ) -> Result<bool, QueryError> {
        require_field(&self.field)?;

        match ctx.field_index(&self.field) {
            FieldIndexState::FullText(index) => {
                let ids = self.lookup(index)?;
                emit(
                    ctx.trace(),
                    QueryTraceEvent::IndexLookup {
                        field: &self.field,
                        kind: IndexKind::FullText,
                        matched: ids.len(),
                    },
                );
                Ok(ids.contains(&id))
            }
            FieldIndexState::Unindexed => self.apply_non_indexed(),
            state => Err(unusable_index(&self.field, "text", &state)),
        }
    }

    pub(crate) fn lookup(&self, index: &dyn TextIndex) -> Result<RecordIdSet, QueryError> {
        index.find_text(&self.query)
    }

    /// Full-text search has no direct evaluation.
    pub fn apply_non_indexed(&self) -> Result<bool, QueryError> {
        Err(QueryError::unsupported(
            ErrorOrigin::Filter,
            format!("{} is not full-text indexed", self.field),
        ))
    }
}

///
/// HELPERS
///

/// Compile a regex filter pattern. Patterns are unanchored.
pub(crate) fn compile_regex(pattern: &str, config: &QueryConfig) -> Result<Regex, QueryError> {
    RegexBuilder::new(pattern)
        .size_limit(config.regex_size_limit)
        .build()
        .map_err(|err| {
            QueryError::filter(
                ErrorOrigin::Filter,
                format!("invalid regex pattern '{pattern}': {err}"),
            )
        })
}

pub(crate) fn require_field(field: &str) -> Result<(), QueryError> {
    if field.is_empty() {
        Err(QueryError::empty_field(ErrorOrigin::Filter))
    } else {
        Ok(())
    }
}

// An index never holds a usable key for a list, map or document value, so
// the record's own value is checked before the lookup answers for it.
fn reject_unorderable(
    ctx: &EvalContext<'_>,
    doc: &Document,
    id: RecordId,
    field: &str,
    origin: ErrorOrigin,
) -> Result<(), QueryError> {
    match ctx.resolve(doc, id, field)?.as_deref() {
        Some(value) if value.is_composite() => Err(QueryError::not_comparable(origin, value)),
        _ => Ok(()),
    }
}

fn null_range_operand(filter: &ComparisonFilter) -> QueryError {
    QueryError::validation(
        ErrorOrigin::Filter,
        format!(
            "null operand is not allowed for '{} {}' comparison",
            filter.field,
            filter.op.symbol()
        ),
    )
}

fn unusable_index(field: &str, filter: &str, state: &FieldIndexState<'_>) -> QueryError {
    let kind = state
        .kind()
        .map_or_else(|| "missing".to_string(), |kind| kind.to_string());

    QueryError::filter(
        ErrorOrigin::Index,
        format!("'{filter}' filter on '{field}' cannot use its {kind} index"),
    )
}
