//! Index contracts consumed by filter evaluation and the planner.
//!
//! The engine never owns index storage. A collection exposes its indexes
//! through [`IndexCatalog`]; each field is either unindexed or served by
//! exactly one index of a given kind.

use crate::{db::document::RecordId, error::QueryError, value::Value};
use derive_more::{Deref, From, IntoIterator};
use std::{collections::BTreeSet, fmt};

///
/// IndexKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum IndexKind {
    /// Ordered (tree) index answering equality, range and membership lookups.
    Ordered,
    /// Tokenized text index answering full-text search.
    FullText,
    /// Geometry index; no filter in this engine can use it.
    Spatial,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ordered => "ordered",
            Self::FullText => "full-text",
            Self::Spatial => "spatial",
        };
        write!(f, "{label}")
    }
}

///
/// IndexDescriptor
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct IndexDescriptor {
    pub field: String,
    pub kind: IndexKind,
    pub unique: bool,
}

impl IndexDescriptor {
    pub fn new(field: impl Into<String>, kind: IndexKind, unique: bool) -> Self {
        Self {
            field: field.into(),
            kind,
            unique,
        }
    }
}

///
/// RecordIdSet
///
/// Ordered, duplicate-free set of record identifiers returned by index
/// lookups.
///

#[derive(Clone, Debug, Default, Deref, Eq, From, IntoIterator, PartialEq)]
#[into_iterator(owned, ref)]
pub struct RecordIdSet(BTreeSet<RecordId>);

impl RecordIdSet {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn insert(&mut self, id: RecordId) -> bool {
        self.0.insert(id)
    }

    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).copied().collect())
    }

    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }
}

impl FromIterator<RecordId> for RecordIdSet {
    fn from_iter<I: IntoIterator<Item = RecordId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

///
/// OrderedIndex
///
/// Lookup contract of an ordered index. Lookups return every record whose
/// indexed value satisfies the relation with the operand, using the same
/// ordering as direct evaluation.
///

pub trait OrderedIndex {
    fn find_equal(&self, value: &Value) -> Result<RecordIdSet, QueryError>;

    fn find_greater_than(&self, value: &Value) -> Result<RecordIdSet, QueryError>;

    fn find_greater_equal(&self, value: &Value) -> Result<RecordIdSet, QueryError>;

    fn find_lesser_than(&self, value: &Value) -> Result<RecordIdSet, QueryError>;

    fn find_lesser_equal(&self, value: &Value) -> Result<RecordIdSet, QueryError>;

    fn find_in(&self, values: &[Value]) -> Result<RecordIdSet, QueryError>;

    /// Every record the index knows about.
    fn all_ids(&self) -> Result<RecordIdSet, QueryError>;

    /// A stored key that has no ordering (a list, map or document), if any.
    /// Range and membership lookups cannot answer for such records.
    fn unorderable_key(&self) -> Option<Value> {
        None
    }
}

///
/// TextIndex
///

pub trait TextIndex {
    fn find_text(&self, query: &str) -> Result<RecordIdSet, QueryError>;
}

///
/// FieldIndexState
///
/// How a field is indexed at the moment of evaluation.
///

#[derive(Clone, Copy)]
pub enum FieldIndexState<'a> {
    Unindexed,
    Ordered(&'a dyn OrderedIndex),
    FullText(&'a dyn TextIndex),
    Spatial,
}

impl FieldIndexState<'_> {
    #[must_use]
    pub const fn kind(&self) -> Option<IndexKind> {
        match self {
            Self::Unindexed => None,
            Self::Ordered(_) => Some(IndexKind::Ordered),
            Self::FullText(_) => Some(IndexKind::FullText),
            Self::Spatial => Some(IndexKind::Spatial),
        }
    }
}

impl fmt::Debug for FieldIndexState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "FieldIndexState({kind})"),
            None => write!(f, "FieldIndexState(unindexed)"),
        }
    }
}

///
/// IndexCatalog
///
/// Live view of the indexes of one collection. Answers may change between
/// calls when indexes are created or dropped.
///

pub trait IndexCatalog {
    fn descriptors(&self) -> Vec<IndexDescriptor>;

    fn field_index(&self, field: &str) -> FieldIndexState<'_>;

    fn has_index(&self, field: &str) -> bool {
        self.index_kind(field).is_some()
    }

    fn index_kind(&self, field: &str) -> Option<IndexKind> {
        self.field_index(field).kind()
    }
}

/// Catalog of a collection with no indexes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoIndexes;

impl IndexCatalog for NoIndexes {
    fn descriptors(&self) -> Vec<IndexDescriptor> {
        Vec::new()
    }

    fn field_index(&self, _field: &str) -> FieldIndexState<'_> {
        FieldIndexState::Unindexed
    }
}
