use crate::db::document::{Document, RecordId};

///
/// RecordSource
///
/// Read access to the records of one collection.
///

pub trait RecordSource {
    fn get(&self, id: RecordId) -> Option<&Document>;

    /// Every record, in identifier order.
    fn scan(&self) -> Box<dyn Iterator<Item = (RecordId, &Document)> + '_>;
}
