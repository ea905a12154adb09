use crate::{
    config::QueryConfig,
    db::{
        document::{Document, RecordId},
        index::{FieldIndexState, IndexCatalog, IndexDescriptor, IndexKind},
        memory::{MemoryOrderedIndex, MemoryTextIndex},
        source::RecordSource,
    },
    error::{ErrorOrigin, QueryError},
    value::Value,
};
use std::collections::BTreeMap;

///
/// MemoryIndex
///

#[derive(Clone, Debug)]
enum MemoryIndex {
    Ordered(MemoryOrderedIndex),
    FullText(MemoryTextIndex),
    /// Declared only; holds no entries.
    Spatial,
}

///
/// MemoryCollection
///
/// Record map plus its per-field indexes, kept in sync on every write.
///

#[derive(Clone, Debug)]
pub struct MemoryCollection {
    config: QueryConfig,
    records: BTreeMap<RecordId, Document>,
    indexes: BTreeMap<String, MemoryIndex>,
    /// `None` once `u64::MAX` has been assigned.
    next_id: Option<u64>,
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::with_config(QueryConfig::default())
    }
}

impl MemoryCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_config(config: QueryConfig) -> Self {
        Self {
            config,
            records: BTreeMap::new(),
            indexes: BTreeMap::new(),
            next_id: Some(0),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Store a record, assigning an identifier when it has none. A record with
    /// an existing identifier replaces the stored one.
    pub fn insert(&mut self, mut doc: Document) -> Result<RecordId, QueryError> {
        let id = if let Some(id) = doc.id() {
            id
        } else {
            let Some(next) = self.next_id else {
                return Err(QueryError::validation(
                    ErrorOrigin::Index,
                    "record identifiers are exhausted",
                ));
            };
            let id = RecordId::new(next);
            doc.set_id(id);
            id
        };

        let previous = self.records.remove(&id);
        if let Some(previous) = &previous {
            self.unindex(id, previous)?;
        }
        if let Err(err) = self.index(id, &doc) {
            // leave the collection as it was
            self.unindex(id, &doc)?;
            if let Some(previous) = previous {
                self.index(id, &previous)?;
                self.records.insert(id, previous);
            }
            return Err(err);
        }
        self.records.insert(id, doc);
        if self.next_id.is_some_and(|next| id.get() >= next) {
            self.next_id = id.get().checked_add(1);
        }

        Ok(id)
    }

    pub fn remove(&mut self, id: RecordId) -> Result<Option<Document>, QueryError> {
        let Some(doc) = self.records.remove(&id) else {
            return Ok(None);
        };
        self.unindex(id, &doc)?;

        Ok(Some(doc))
    }

    /// Build an index over every stored record.
    pub fn create_index(
        &mut self,
        field: &str,
        kind: IndexKind,
        unique: bool,
    ) -> Result<(), QueryError> {
        if field.is_empty() {
            return Err(QueryError::empty_field(ErrorOrigin::Index));
        }
        if self.indexes.contains_key(field) {
            return Err(QueryError::validation(
                ErrorOrigin::Index,
                format!("index already exists on field '{field}'"),
            ));
        }

        let mut index = match kind {
            IndexKind::Ordered => MemoryIndex::Ordered(MemoryOrderedIndex::new(unique)),
            IndexKind::FullText => MemoryIndex::FullText(MemoryTextIndex::new()),
            IndexKind::Spatial => MemoryIndex::Spatial,
        };
        for (id, doc) in &self.records {
            write_entry(&mut index, field, *id, doc, &self.config)?;
        }
        self.indexes.insert(field.to_string(), index);

        tracing::debug!(field, %kind, unique, "index created");

        Ok(())
    }

    pub fn drop_index(&mut self, field: &str) -> bool {
        let dropped = self.indexes.remove(field).is_some();
        if dropped {
            tracing::debug!(field, "index dropped");
        }

        dropped
    }

    fn index(&mut self, id: RecordId, doc: &Document) -> Result<(), QueryError> {
        for (field, index) in &mut self.indexes {
            write_entry(index, field, id, doc, &self.config)?;
        }

        Ok(())
    }

    fn unindex(&mut self, id: RecordId, doc: &Document) -> Result<(), QueryError> {
        for (field, index) in &mut self.indexes {
            match index {
                MemoryIndex::Ordered(ordered) => {
                    let key = index_key(doc, field, &self.config)?;
                    ordered.remove(&key, id);
                }
                MemoryIndex::FullText(text) => {
                    if let Some(value) = text_value(doc, field, &self.config)? {
                        text.remove(&value, id);
                    }
                }
                MemoryIndex::Spatial => {}
            }
        }

        Ok(())
    }
}

fn write_entry(
    index: &mut MemoryIndex,
    field: &str,
    id: RecordId,
    doc: &Document,
    config: &QueryConfig,
) -> Result<(), QueryError> {
    match index {
        MemoryIndex::Ordered(ordered) => ordered.insert(index_key(doc, field, config)?, id),
        MemoryIndex::FullText(text) => {
            if let Some(value) = text_value(doc, field, config)? {
                text.insert(&value, id);
            }
            Ok(())
        }
        MemoryIndex::Spatial => Ok(()),
    }
}

// Missing fields are indexed as null so that null lookups see them.
fn index_key(doc: &Document, field: &str, config: &QueryConfig) -> Result<Value, QueryError> {
    Ok(doc
        .resolve(field, config.field_separator)?
        .map_or(Value::Null, std::borrow::Cow::into_owned))
}

fn text_value(
    doc: &Document,
    field: &str,
    config: &QueryConfig,
) -> Result<Option<String>, QueryError> {
    match doc.resolve(field, config.field_separator)?.as_deref() {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Text(text)) => Ok(Some(text.clone())),
        Some(other) => Err(QueryError::validation(
            ErrorOrigin::Index,
            format!("full-text index on '{field}' cannot hold {} value {other}", other.kind_label()),
        )),
    }
}

impl RecordSource for MemoryCollection {
    fn get(&self, id: RecordId) -> Option<&Document> {
        self.records.get(&id)
    }

    fn scan(&self) -> Box<dyn Iterator<Item = (RecordId, &Document)> + '_> {
        Box::new(self.records.iter().map(|(id, doc)| (*id, doc)))
    }
}

impl IndexCatalog for MemoryCollection {
    fn descriptors(&self) -> Vec<IndexDescriptor> {
        self.indexes
            .iter()
            .map(|(field, index)| match index {
                MemoryIndex::Ordered(ordered) => {
                    IndexDescriptor::new(field, IndexKind::Ordered, ordered.is_unique())
                }
                MemoryIndex::FullText(_) => IndexDescriptor::new(field, IndexKind::FullText, false),
                MemoryIndex::Spatial => IndexDescriptor::new(field, IndexKind::Spatial, false),
            })
            .collect()
    }

    fn field_index(&self, field: &str) -> FieldIndexState<'_> {
        match self.indexes.get(field) {
            None => FieldIndexState::Unindexed,
            Some(MemoryIndex::Ordered(index)) => FieldIndexState::Ordered(index),
            Some(MemoryIndex::FullText(index)) => FieldIndexState::FullText(index),
            Some(MemoryIndex::Spatial) => FieldIndexState::Spatial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::index::OrderedIndex;

    fn ordered(collection: &MemoryCollection, field: &str) -> Vec<u64> {
        let FieldIndexState::Ordered(index) = collection.field_index(field) else {
            panic!("no ordered index on {field}");
        };
        index.all_ids().unwrap().iter().map(|id| id.get()).collect::<Vec<_>>()
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let mut users = MemoryCollection::new();

        let first = users.insert(Document::new().with("name", "a")).unwrap();
        let explicit = users
            .insert(Document::with_id(RecordId::new(10)).with("name", "b"))
            .unwrap();
        let next = users.insert(Document::new().with("name", "c")).unwrap();

        assert_eq!((first.get(), explicit.get(), next.get()), (0, 10, 11));
        assert_eq!(users.get(next).and_then(Document::id), Some(next));
        assert_eq!(users.len(), 3);
    }

    #[test]
    fn exhausted_identifiers_are_an_error() {
        let mut users = MemoryCollection::new();
        let last = users.insert(Document::with_id(RecordId::new(u64::MAX))).unwrap();

        let err = users.insert(Document::new().with("name", "a")).unwrap_err();

        assert!(err.is_validation());
        assert_eq!(err.message, "record identifiers are exhausted");
        assert_eq!(users.len(), 1);
        assert!(users.get(last).is_some());
    }

    #[test]
    fn unique_violation_leaves_the_collection_unchanged() {
        let mut users = MemoryCollection::new();
        users.create_index("email", IndexKind::Ordered, true).unwrap();
        users.create_index("name", IndexKind::Ordered, false).unwrap();
        let id = users
            .insert(Document::new().with("email", "a@x").with("name", "ann"))
            .unwrap();

        let err = users
            .insert(Document::new().with("email", "a@x").with("name", "bob"))
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(users.len(), 1);
        assert_eq!(ordered(&users, "name"), vec![id.get()]);
    }

    #[test]
    fn replacing_a_record_reindexes_it() {
        let mut users = MemoryCollection::new();
        users.create_index("age", IndexKind::Ordered, false).unwrap();
        let id = users.insert(Document::new().with("age", 30)).unwrap();

        users
            .insert(Document::with_id(id).with("age", 31))
            .unwrap();

        let FieldIndexState::Ordered(index) = users.field_index("age") else {
            panic!("age is indexed");
        };
        assert!(index.find_equal(&Value::Int(30)).unwrap().is_empty());
        assert_eq!(index.find_equal(&Value::Int(31)).unwrap().len(), 1);
    }

    #[test]
    fn indexes_cover_existing_records_and_can_be_dropped() {
        let mut users = MemoryCollection::new();
        let a = users.insert(Document::new().with("age", 30)).unwrap();
        let b = users.insert(Document::new()).unwrap();

        users.create_index("age", IndexKind::Ordered, false).unwrap();
        assert_eq!(ordered(&users, "age"), vec![a.get(), b.get()]);
        assert!(users.create_index("age", IndexKind::FullText, false).is_err());
        assert!(users.create_index("", IndexKind::Ordered, false).is_err());

        assert_eq!(
            users.descriptors(),
            vec![IndexDescriptor::new("age", IndexKind::Ordered, false)]
        );
        assert!(users.drop_index("age"));
        assert!(!users.drop_index("age"));
        assert!(!users.has_index("age"));
    }

    #[test]
    fn full_text_index_rejects_non_text_values() {
        let mut notes = MemoryCollection::new();
        notes.insert(Document::new().with("body", 42)).unwrap();

        assert!(notes.create_index("body", IndexKind::FullText, false).is_err());
    }

    #[test]
    fn remove_unindexes_the_record() {
        let mut users = MemoryCollection::new();
        users.create_index("age", IndexKind::Ordered, false).unwrap();
        let id = users.insert(Document::new().with("age", 30)).unwrap();

        let removed = users.remove(id).unwrap();

        assert!(removed.is_some());
        assert!(users.is_empty());
        assert!(ordered(&users, "age").is_empty());
        assert_eq!(users.remove(id).unwrap(), None);
    }
}
