use crate::{
    db::{
        document::RecordId,
        index::{OrderedIndex, RecordIdSet},
    },
    error::{ErrorOrigin, QueryError},
    value::{Value, canonical_cmp, canonical_rank},
};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    ops::Bound,
};

///
/// IndexKey
///
/// Value ordered by the canonical comparator, so keys that are equal under
/// deep equality share one entry.
///

#[derive(Clone, Debug)]
struct IndexKey(Value);

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        canonical_cmp(&self.0, &other.0)
    }
}

///
/// MemoryOrderedIndex
///
/// Tree index from field value to record ids. Missing fields are indexed
/// under `Null`. Range lookups only return values of the operand's own
/// family; values of other types never satisfy an ordering.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryOrderedIndex {
    entries: BTreeMap<IndexKey, BTreeSet<RecordId>>,
    unique: bool,
}

impl MemoryOrderedIndex {
    #[must_use]
    pub const fn new(unique: bool) -> Self {
        Self {
            entries: BTreeMap::new(),
            unique,
        }
    }

    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn insert(&mut self, key: Value, id: RecordId) -> Result<(), QueryError> {
        let exempt = key.is_null();
        let ids = self.entries.entry(IndexKey(key)).or_default();
        if self.unique && !exempt && !ids.is_empty() && !ids.contains(&id) {
            return Err(QueryError::validation(
                ErrorOrigin::Index,
                "unique index constraint violated",
            ));
        }
        ids.insert(id);

        Ok(())
    }

    pub fn remove(&mut self, key: &Value, id: RecordId) {
        let key = IndexKey(key.clone());
        if let Some(ids) = self.entries.get_mut(&key) {
            ids.remove(&id);
            if ids.is_empty() {
                self.entries.remove(&key);
            }
        }
    }

    fn ids_in_range(
        &self,
        operand: &Value,
        lower: Bound<IndexKey>,
        upper: Bound<IndexKey>,
    ) -> RecordIdSet {
        self.entries
            .range((lower, upper))
            .filter(|(key, _)| same_family(&key.0, operand))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }
}

// Values that can be ordered against each other.
fn same_family(key: &Value, operand: &Value) -> bool {
    match (key, operand) {
        (Value::Enum(a), Value::Enum(b)) => a.path == b.path,
        _ => canonical_rank(key) == canonical_rank(operand),
    }
}

impl OrderedIndex for MemoryOrderedIndex {
    fn find_equal(&self, value: &Value) -> Result<RecordIdSet, QueryError> {
        Ok(self
            .entries
            .get(&IndexKey(value.clone()))
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default())
    }

    fn find_greater_than(&self, value: &Value) -> Result<RecordIdSet, QueryError> {
        Ok(self.ids_in_range(value, Bound::Excluded(IndexKey(value.clone())), Bound::Unbounded))
    }

    fn find_greater_equal(&self, value: &Value) -> Result<RecordIdSet, QueryError> {
        Ok(self.ids_in_range(value, Bound::Included(IndexKey(value.clone())), Bound::Unbounded))
    }

    fn find_lesser_than(&self, value: &Value) -> Result<RecordIdSet, QueryError> {
        Ok(self.ids_in_range(value, Bound::Unbounded, Bound::Excluded(IndexKey(value.clone()))))
    }

    fn find_lesser_equal(&self, value: &Value) -> Result<RecordIdSet, QueryError> {
        Ok(self.ids_in_range(value, Bound::Unbounded, Bound::Included(IndexKey(value.clone()))))
    }

    fn find_in(&self, values: &[Value]) -> Result<RecordIdSet, QueryError> {
        let mut out = RecordIdSet::new();
        for value in values {
            out.extend(self.find_equal(value)?);
        }

        Ok(out)
    }

    fn all_ids(&self) -> Result<RecordIdSet, QueryError> {
        Ok(self
            .entries
            .values()
            .flat_map(|ids| ids.iter().copied())
            .collect())
    }

    // composite families rank last
    fn unorderable_key(&self) -> Option<Value> {
        self.entries
            .keys()
            .rev()
            .take_while(|key| key.0.is_composite())
            .last()
            .map(|key| key.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> MemoryOrderedIndex {
        let mut index = MemoryOrderedIndex::new(false);
        index.insert(Value::Int(10), RecordId::new(1)).unwrap();
        index.insert(Value::Float64(20.5), RecordId::new(2)).unwrap();
        index.insert(Value::Uint(30), RecordId::new(3)).unwrap();
        index.insert(Value::Text("x".into()), RecordId::new(4)).unwrap();
        index.insert(Value::Null, RecordId::new(5)).unwrap();
        index
    }

    fn ids(raw: &[u64]) -> RecordIdSet {
        raw.iter().copied().map(RecordId::new).collect()
    }

    #[test]
    fn equality_crosses_numeric_variants() {
        assert_eq!(index().find_equal(&Value::Float64(10.0)).unwrap(), ids(&[1]));
        assert_eq!(index().find_equal(&Value::Null).unwrap(), ids(&[5]));
    }

    #[test]
    fn ranges_stay_within_the_operand_family() {
        let index = index();

        assert_eq!(index.find_greater_than(&Value::Int(10)).unwrap(), ids(&[2, 3]));
        assert_eq!(index.find_lesser_equal(&Value::Uint(30)).unwrap(), ids(&[1, 2, 3]));
        assert_eq!(index.find_greater_equal(&Value::Text("a".into())).unwrap(), ids(&[4]));
    }

    #[test]
    fn membership_unions_equal_lookups() {
        let found = index()
            .find_in(&[Value::Int(30), Value::Text("x".into()), Value::Int(99)])
            .unwrap();

        assert_eq!(found, ids(&[3, 4]));
    }

    #[test]
    fn unique_index_rejects_a_second_record() {
        let mut index = MemoryOrderedIndex::new(true);
        index.insert(Value::Int(1), RecordId::new(1)).unwrap();

        assert!(index.insert(Value::Float64(1.0), RecordId::new(2)).is_err());
        assert!(index.insert(Value::Int(1), RecordId::new(1)).is_ok());
        // missing values never collide
        index.insert(Value::Null, RecordId::new(3)).unwrap();
        index.insert(Value::Null, RecordId::new(4)).unwrap();
    }

    #[test]
    fn composite_keys_are_reported_as_unorderable() {
        let mut index = index();
        assert_eq!(index.unorderable_key(), None);

        index.insert(Value::from_list([2, 3]), RecordId::new(6)).unwrap();
        index.insert(Value::from_list([1]), RecordId::new(7)).unwrap();

        assert_eq!(index.unorderable_key(), Some(Value::from_list([1])));
    }

    #[test]
    fn removing_the_last_id_drops_the_key() {
        let mut index = index();
        index.remove(&Value::Int(10), RecordId::new(1));

        assert!(index.find_equal(&Value::Int(10)).unwrap().is_empty());
        assert_eq!(index.all_ids().unwrap(), ids(&[2, 3, 4, 5]));
    }
}
