//! An approximate string-matching engine implementing the CPQ algorithm:
//! feature extraction, a size-partitioned inverted index, and pluggable
//! similarity measures (Cosine, Dice, Jaccard, Overlap, exact match).
//!
//! A typical session builds a [`Database`] with one [`Extractor`], inserts
//! strings into it, and drives one or more [`Searcher`]s against it with a
//! chosen [`Measure`].
//!
//! ```
//! use std::sync::Arc;
//! use simstring_core::{Database, Extractor, Searcher, measure::Cosine};
//!
//! let mut db = Database::new(Extractor::character_ngrams(2, "$"));
//! db.insert("apple").unwrap();
//! db.insert("apply").unwrap();
//!
//! let searcher = Searcher::new(&db, Arc::new(Cosine));
//! let hits = searcher.search("aple", 0.6).unwrap();
//! assert!(!hits.is_empty());
//! ```

pub mod database;
pub mod error;
pub mod feature;
pub mod measure;
pub mod search;

pub use database::Database;
pub use error::{Result, SimstringError};
pub use feature::{CharacterNgrams, CustomExtractor, Extractor, Feature, FeatureSet, TokenSource, WordNgrams};
pub use search::Searcher;
