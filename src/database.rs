//! The size-partitioned inverted-index database.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::feature::{Feature, FeatureSet};
use crate::Extractor;

/// Below this many strings, bulk insertion stays sequential; past it, feature
/// extraction (the CPU-bound, embarrassingly parallel part) is fanned out
/// with rayon, avoiding thread-pool handoff overhead for small batches.
const PARALLEL_THRESHOLD: usize = 250;

/// An inserted string together with its assigned id and feature-set size.
#[derive(Debug, Clone)]
struct IndexedString {
    original: String,
    feature_set_size: usize,
}

/// The size-partitioned inverted index and the strings it was built from.
///
/// string_ids are dense, stable for the lifetime of the database, and never
/// reused except after `clear`, which resets everything atomically.
pub struct Database {
    extractor: Extractor,
    strings: Vec<IndexedString>,
    index: FxHashMap<(usize, Feature), Vec<usize>>,
    max_size: usize,
}

impl Database {
    pub fn new(extractor: Extractor) -> Self {
        Self {
            extractor,
            strings: Vec::new(),
            index: FxHashMap::default(),
            max_size: 0,
        }
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Number of indexed strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// The largest feature-set size among currently indexed strings, or 0 if
    /// empty. Used by the searcher to clamp an otherwise-unbounded τ_max.
    pub fn max_feature_set_size(&self) -> usize {
        self.max_size
    }

    /// The original strings, in insertion order.
    pub fn strings(&self) -> Vec<&str> {
        self.strings.iter().map(|s| s.original.as_str()).collect()
    }

    pub fn original_string(&self, id: usize) -> &str {
        &self.strings[id].original
    }

    pub fn feature_set_size(&self, id: usize) -> usize {
        self.strings[id].feature_set_size
    }

    /// Extracts features and indexes `s`, returning its new string_id.
    /// Idempotence is not required: inserting the same string twice yields
    /// two distinct ids. If the extractor fails, no state is mutated.
    pub fn insert(&mut self, s: impl Into<String>) -> Result<usize> {
        let s = s.into();
        let features = self.extractor.apply(&s)?;
        Ok(self.commit(s, features))
    }

    /// Bulk insertion. Below [`PARALLEL_THRESHOLD`] strings this is a plain
    /// loop; above it, feature extraction runs in parallel (index writes
    /// stay sequential, since the index is a single mutable aggregate).
    pub fn insert_all<I>(&mut self, items: I) -> Result<Vec<usize>>
    where
        I: IntoIterator<Item = String>,
    {
        let items: Vec<String> = items.into_iter().collect();
        let extracted: Vec<Result<FeatureSet>> = if items.len() < PARALLEL_THRESHOLD {
            items.iter().map(|s| self.extractor.apply(s)).collect()
        } else {
            items
                .par_iter()
                .map(|s| self.extractor.apply(s))
                .collect()
        };

        let mut ids = Vec::with_capacity(items.len());
        for (s, features) in items.into_iter().zip(extracted) {
            ids.push(self.commit(s, features?));
        }
        Ok(ids)
    }

    fn commit(&mut self, original: String, features: FeatureSet) -> usize {
        let id = self.strings.len();
        let size = features.len();
        self.strings.push(IndexedString {
            original,
            feature_set_size: size,
        });
        for feature in features {
            self.index.entry((size, feature)).or_default().push(id);
        }
        self.max_size = self.max_size.max(size);
        id
    }

    /// The string_ids sharing `feature` among indexed strings of exactly
    /// `size` features. Empty if no such bucket exists.
    pub fn lookup(&self, size: usize, feature: &Feature) -> &[usize] {
        self.index
            .get(&(size, feature.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Restores the empty state, including the id generator.
    pub fn clear(&mut self) {
        self.strings.clear();
        self.index.clear();
        self.max_size = 0;
    }
}
