//! Documents and field-path resolution.

mod id;
mod path;


use crate::{
    config::DEFAULT_FIELD_SEPARATOR, error::QueryError, traits::FieldValue, value::Value,
};
use std::{borrow::Cow, collections::BTreeMap, fmt};

pub use id::RecordId;

///
/// CONSTANTS
///

/// Reserved field name addressing a document's own identifier.
pub const DOC_ID: &str = "_id";

/// Field name addressing the element itself inside an element match.
pub const ELEMENT_FIELD: &str = "$";

///
/// Document
///
/// Field map of a stored record. Top-level documents carry the identifier
/// assigned by their collection; embedded documents have none.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    id: Option<RecordId>,
    fields: BTreeMap<String, Value>,
}

impl Document {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            id: None,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn with_id(id: RecordId) -> Self {
        Self {
            id: Some(id),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl FieldValue) -> Self {
        self.insert(key, value.to_value());
        self
    }

    #[must_use]
    pub const fn id(&self) -> Option<RecordId> {
        self.id
    }

    pub const fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    /// Insert a top-level field, returning the previous value.
    /// The key is stored verbatim; separators are not interpreted.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Top-level field lookup.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Fields in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolve a field path using the default separator.
    pub fn get(&self, path: &str) -> Result<Option<Cow<'_, Value>>, QueryError> {
        self.resolve(path, DEFAULT_FIELD_SEPARATOR)
    }

    /// Resolve a (possibly embedded) field path.
    ///
    /// `Ok(None)` means the path is absent. A present field may still hold
    /// `Value::Null`. Lists are addressed by numeric segment; a non-numeric
    /// segment applied to a list projects over its embedded documents.
    pub fn resolve(&self, path: &str, separator: char) -> Result<Option<Cow<'_, Value>>, QueryError> {
        path::resolve(self, path, separator)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        write!(f, "}}")
    }
}
