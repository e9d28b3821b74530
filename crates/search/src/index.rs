//! The inverted word index.
//!
//! Invariant: for every key k with current value v, and for every token
//! t in the lowercased whitespace-split tokens of v, k is in
//! `postings[t]`; conversely no key not currently present appears in any
//! posting list. We track each key's prior token set so re-indexing a
//! key costs `O(|old_tokens| + |new_tokens|)` rather than a
//! full-table scan over every posting list.

use crate::tokenizer::tokenize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Maps lowercased tokens to the set of keys whose current value
/// contains them.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, HashSet<String>>,
    key_tokens: HashMap<String, HashSet<String>>,
}

impl InvertedIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)index `key` with its current `value`: drop it from every
    /// posting list it used to belong to, then insert it into the
    /// posting list of every token in `value`.
    pub fn index(&mut self, key: &str, value: &str) {
        self.remove(key);

        let tokens: HashSet<String> = tokenize(value).into_iter().collect();
        for token in &tokens {
            self.postings
                .entry(token.clone())
                .or_default()
                .insert(key.to_string());
        }
        self.key_tokens.insert(key.to_string(), tokens);
    }

    /// Remove `key` from every posting list it currently appears in.
    /// A no-op if the key was never indexed.
    pub fn remove(&mut self, key: &str) {
        if let Some(tokens) = self.key_tokens.remove(key) {
            for token in tokens {
                if let Some(keys) = self.postings.get_mut(&token) {
                    keys.remove(key);
                }
            }
        }
    }

    /// Discard every entry. Used before a full rebuild from the primary
    /// map during recovery.
    pub fn clear(&mut self) {
        self.postings.clear();
        self.key_tokens.clear();
    }

    /// Intersect the posting lists of every token in `query`. An empty
    /// query, or a query containing any token absent from the index,
    /// yields an empty result.
    pub fn search(&self, query: &str) -> BTreeSet<String> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return BTreeSet::new();
        }

        let mut result: Option<BTreeSet<String>> = None;
        for token in &tokens {
            let Some(keys) = self.postings.get(token) else {
                return BTreeSet::new();
            };
            let keys: BTreeSet<String> = keys.iter().cloned().collect();
            result = Some(match result {
                None => keys,
                Some(acc) => acc.intersection(&keys).cloned().collect(),
            });
        }
        result.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_intersects_posting_lists() {
        let mut idx = InvertedIndex::new();
        idx.index("d1", "the quick brown fox");
        idx.index("d2", "quick thinking");

        assert_eq!(
            idx.search("quick"),
            BTreeSet::from(["d1".to_string(), "d2".to_string()])
        );
        assert_eq!(idx.search("brown fox"), BTreeSet::from(["d1".to_string()]));
        assert!(idx.search("missing").is_empty());
    }

    #[test]
    fn empty_query_returns_empty_set() {
        let mut idx = InvertedIndex::new();
        idx.index("d1", "anything");
        assert!(idx.search("   ").is_empty());
    }

    #[test]
    fn reindexing_drops_stale_postings() {
        let mut idx = InvertedIndex::new();
        idx.index("k", "alpha beta");
        idx.index("k", "gamma");
        assert!(idx.search("alpha").is_empty());
        assert_eq!(idx.search("gamma"), BTreeSet::from(["k".to_string()]));
    }

    #[test]
    fn remove_clears_all_postings_for_key() {
        let mut idx = InvertedIndex::new();
        idx.index("k", "alpha beta");
        idx.remove("k");
        assert!(idx.search("alpha").is_empty());
        assert!(idx.search("beta").is_empty());
    }
}
