use crate::{
    db::{
        document::RecordId,
        index::{RecordIdSet, TextIndex},
    },
    error::{ErrorOrigin, QueryError},
};
use std::collections::{BTreeMap, BTreeSet};

///
/// MemoryTextIndex
///
/// Inverted index from lowercase word to record ids.
///
/// Queries:
/// - `word other`  → records containing any of the words
/// - `word*`       → records with a word starting with `word`
/// - `*word`       → records with a word ending with `word`
/// - `*word*`      → records with a word containing `word`
///
/// Wildcards apply to single-word queries only.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryTextIndex {
    postings: BTreeMap<String, BTreeSet<RecordId>>,
}

impl MemoryTextIndex {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            postings: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, text: &str, id: RecordId) {
        for word in tokenize(text) {
            self.postings.entry(word).or_default().insert(id);
        }
    }

    pub fn remove(&mut self, text: &str, id: RecordId) {
        for word in tokenize(text) {
            if let Some(ids) = self.postings.get_mut(&word) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.postings.remove(&word);
                }
            }
        }
    }

    fn collect(&self, mut accept: impl FnMut(&str) -> bool) -> RecordIdSet {
        self.postings
            .iter()
            .filter(|(word, _)| accept(word))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }
}

impl TextIndex for MemoryTextIndex {
    fn find_text(&self, query: &str) -> Result<RecordIdSet, QueryError> {
        let query = query.trim();
        if query.starts_with('*') || query.ends_with('*') {
            return self.find_wildcard(query);
        }

        let mut out = RecordIdSet::new();
        for word in tokenize(query) {
            if let Some(ids) = self.postings.get(&word) {
                out.extend(ids.iter().copied().collect());
            }
        }

        Ok(out)
    }
}

impl MemoryTextIndex {
    fn find_wildcard(&self, query: &str) -> Result<RecordIdSet, QueryError> {
        if query.split_whitespace().count() > 1 {
            return Err(QueryError::filter(
                ErrorOrigin::Index,
                "multiple words with wildcard is not supported",
            ));
        }

        let leading = query.starts_with('*');
        let trailing = query.ends_with('*') && query.len() > 1;
        let term = query.trim_matches('*').to_lowercase();
        if term.is_empty() {
            return Err(QueryError::filter(
                ErrorOrigin::Index,
                format!("'{query}' is not a valid search string"),
            ));
        }

        let found = match (leading, trailing) {
            (true, true) => self.collect(|word| word.contains(&term)),
            (true, false) => self.collect(|word| word.ends_with(&term)),
            _ => self.collect(|word| word.starts_with(&term)),
        };

        Ok(found)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}
