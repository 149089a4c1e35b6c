//! Feature extraction: turning a string into an occurrence-tagged, ordered
//! multiset of features.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::error::{Result, SimstringError};

/// An occurrence-tagged token: the atomic unit compared by similarity
/// measures. Two features are equal iff both the token text and the
/// 1-based occurrence index match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Feature {
    token: Box<str>,
    occurrence: u32,
}

impl Feature {
    /// The token text (e.g. a character n-gram or word n-gram window).
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The 1-based count of prior occurrences of this token in the feature
    /// sequence it came from.
    pub fn occurrence(&self) -> u32 {
        self.occurrence
    }
}

/// The ordered sequence of features produced for a string. Cardinality is
/// the size used by every similarity computation.
pub type FeatureSet = Vec<Feature>;

/// Turns an ordered, untagged token sequence into an occurrence-tagged
/// feature set. Shared by every extractor so tagging behaves identically
/// regardless of where the tokens came from.
fn tag_occurrences(tokens: Vec<String>) -> FeatureSet {
    let mut seen: FxHashMap<String, u32> = FxHashMap::default();
    tokens
        .into_iter()
        .map(|token| {
            let count = seen.entry(token.clone()).or_insert(0);
            *count += 1;
            Feature {
                token: token.into_boxed_str(),
                occurrence: *count,
            }
        })
        .collect()
}

/// Escape hatch for host-supplied tokenization. Implementors return a plain,
/// ordered token sequence; occurrence tagging is applied uniformly by the
/// core afterwards.
pub trait TokenSource: Send + Sync {
    /// Tokenize `text`. Implementations may fail (or panic, which the core
    /// catches at this boundary and reports as [`SimstringError::Extractor`]).
    fn apply(&self, text: &str) -> Result<Vec<String>>;
}

impl<F> TokenSource for F
where
    F: Fn(&str) -> Result<Vec<String>> + Send + Sync,
{
    fn apply(&self, text: &str) -> Result<Vec<String>> {
        self(text)
    }
}

/// Character n-grams over a padded string: pad both ends with (n-1) copies
/// of the endmarker, then slide a window of n characters across the result.
#[derive(Debug, Clone)]
pub struct CharacterNgrams {
    n: usize,
    endmarker: String,
}

impl CharacterNgrams {
    pub fn new(n: usize, endmarker: impl Into<String>) -> Self {
        assert!(n >= 1, "CharacterNgrams requires n >= 1");
        Self {
            n,
            endmarker: endmarker.into(),
        }
    }

    fn raw_tokens(&self, text: &str) -> Vec<String> {
        let pad = self.endmarker.repeat(self.n.saturating_sub(1));
        let padded: Vec<char> = pad.chars().chain(text.chars()).chain(pad.chars()).collect();
        if padded.len() < self.n {
            return Vec::new();
        }
        padded
            .windows(self.n)
            .map(|w| w.iter().collect::<String>())
            .collect()
    }
}

/// Word n-grams over a splitter-delimited token stream, with padding. The
/// splitter is compiled as a regex lazily, once per extractor instance.
pub struct WordNgrams {
    n: usize,
    splitter: String,
    padder: String,
    compiled: OnceCell<Regex>,
}

impl WordNgrams {
    pub fn new(n: usize, splitter: impl Into<String>, padder: impl Into<String>) -> Self {
        assert!(n >= 1, "WordNgrams requires n >= 1");
        Self {
            n,
            splitter: splitter.into(),
            padder: padder.into(),
            compiled: OnceCell::new(),
        }
    }

    fn splitter_re(&self) -> &Regex {
        self.compiled.get_or_init(|| {
            Regex::new(&regex::escape(&self.splitter))
                .expect("literal splitter pattern is always valid regex")
        })
    }

    fn raw_tokens(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = self
            .splitter_re()
            .split(text)
            .filter(|tok| !tok.is_empty())
            .collect();

        let pad_count = self.n.saturating_sub(1);
        let mut padded: Vec<&str> = Vec::with_capacity(words.len() + 2 * pad_count);
        padded.extend(std::iter::repeat(self.padder.as_str()).take(pad_count));
        padded.extend(words);
        padded.extend(std::iter::repeat(self.padder.as_str()).take(pad_count));

        if padded.len() < self.n {
            return Vec::new();
        }
        padded
            .windows(self.n)
            .map(|w| w.join(" "))
            .collect()
    }
}

impl fmt::Debug for WordNgrams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordNgrams")
            .field("n", &self.n)
            .field("splitter", &self.splitter)
            .field("padder", &self.padder)
            .finish()
    }
}

/// Delegates tokenization to an external callable, validated at construction.
#[derive(Clone)]
pub struct CustomExtractor {
    source: Arc<dyn TokenSource>,
}

impl fmt::Debug for CustomExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomExtractor").finish_non_exhaustive()
    }
}

impl CustomExtractor {
    fn raw_tokens(&self, text: &str) -> Result<Vec<String>> {
        let source = &self.source;
        let result = panic::catch_unwind(AssertUnwindSafe(|| source.apply(text)));
        match result {
            Ok(tokens) => tokens,
            Err(panic) => Err(SimstringError::Extractor(panic_message(panic))),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "custom extractor panicked".to_string()
    }
}

/// A feature extractor: one of the three built-in strategies, or a custom
/// host callback. Value type; holds configuration and no mutable state
/// beyond lazily-memoized, purely-derived data (the compiled splitter regex).
#[derive(Debug, Clone)]
pub enum Extractor {
    CharacterNgrams(Arc<CharacterNgrams>),
    WordNgrams(Arc<WordNgrams>),
    Custom(CustomExtractor),
}

impl Extractor {
    pub fn character_ngrams(n: usize, endmarker: impl Into<String>) -> Self {
        Extractor::CharacterNgrams(Arc::new(CharacterNgrams::new(n, endmarker)))
    }

    pub fn word_ngrams(
        n: usize,
        splitter: impl Into<String>,
        padder: impl Into<String>,
    ) -> Self {
        Extractor::WordNgrams(Arc::new(WordNgrams::new(n, splitter, padder)))
    }

    /// Wraps a statically-typed token source. The `TokenSource` bound is the
    /// capability check; it is enforced by the compiler, which is strictly
    /// stronger than a runtime duck-type check.
    pub fn custom<T: TokenSource + 'static>(source: T) -> Self {
        Extractor::Custom(CustomExtractor {
            source: Arc::new(source),
        })
    }

    /// Wraps a type-erased handle, for hosts that only have a dynamically
    /// typed object (e.g. a future FFI boundary). Fails with
    /// [`SimstringError::InvalidExtractor`] if the handle does not carry a
    /// `TokenSource` implementation.
    pub fn try_custom(source: Box<dyn Any + Send + Sync>) -> Result<Self> {
        match source.downcast::<Arc<dyn TokenSource>>() {
            Ok(source) => Ok(Extractor::Custom(CustomExtractor { source: *source })),
            Err(_) => Err(SimstringError::InvalidExtractor(
                "custom extractor must provide an apply(text) -> tokens capability".to_string(),
            )),
        }
    }

    /// Extracts the occurrence-tagged feature set for `text`.
    pub fn apply(&self, text: &str) -> Result<FeatureSet> {
        let tokens = match self {
            Extractor::CharacterNgrams(e) => e.raw_tokens(text),
            Extractor::WordNgrams(e) => e.raw_tokens(text),
            Extractor::Custom(e) => e.raw_tokens(text)?,
        };
        Ok(tag_occurrences(tokens))
    }
}
