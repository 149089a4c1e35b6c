//! End-to-end scenarios against the public API, independent of any single
//! module's internals.

use std::sync::Arc;

use simstring_core::measure::{Cosine, Dice, ExactMatch, Jaccard, Overlap};
use simstring_core::{Database, Extractor, Searcher, SimstringError};

fn bigram_db(strings: &[&str]) -> Database {
    let mut db = Database::new(Extractor::character_ngrams(2, "$"));
    for s in strings {
        db.insert(*s).unwrap();
    }
    db
}

#[test]
fn cosine_fruit_scenario() {
    let db = bigram_db(&["apple", "apply", "banana"]);
    let searcher = Searcher::new(&db, Arc::new(Cosine));

    let strict = searcher.ranked_search("apple", 0.8).unwrap();
    assert_eq!(strict, vec![("apple".to_string(), 1.0)]);

    let loose = searcher.ranked_search("apple", 0.6).unwrap();
    let names: Vec<&str> = loose.iter().map(|(s, _)| s.as_str()).collect();
    assert_eq!(names, vec!["apple", "apply"]);
}

#[test]
fn dice_jaccard_overlap_foo_scenario() {
    let db = bigram_db(&["foo", "bar", "fooo"]);

    let dice = Searcher::new(&db, Arc::new(Dice)).ranked_search("foo", 0.8).unwrap();
    assert_eq!(dice[0], ("foo".to_string(), 1.0));
    assert!((dice[1].1 - 8.0 / 9.0).abs() < 1e-6);

    let jaccard = Searcher::new(&db, Arc::new(Jaccard)).ranked_search("foo", 0.8).unwrap();
    assert_eq!(jaccard, vec![("foo".to_string(), 1.0), ("fooo".to_string(), 0.8)]);

    let overlap = Searcher::new(&db, Arc::new(Overlap)).ranked_search("foo", 0.8).unwrap();
    assert_eq!(overlap.len(), 2);
    assert!(overlap.iter().all(|(_, score)| (score - 1.0).abs() < 1e-9));
}

#[test]
fn exact_match_scenario() {
    let db = bigram_db(&["foo", "bar", "fooo"]);
    let searcher = Searcher::new(&db, Arc::new(ExactMatch));

    assert_eq!(
        searcher.ranked_search("foo", 1.0).unwrap(),
        vec![("foo".to_string(), 1.0)]
    );
    assert_eq!(
        searcher.ranked_search("foo", 0.5).unwrap(),
        vec![("foo".to_string(), 1.0)]
    );
}

#[test]
fn invalid_threshold_scenario() {
    let db = bigram_db(&["foo"]);
    let searcher = Searcher::new(&db, Arc::new(Cosine));

    let too_high = searcher.search("foo", 1.1).unwrap_err();
    assert!(matches!(too_high, SimstringError::InvalidThreshold(a) if a == 1.1));

    let too_low = searcher.search("foo", 0.0).unwrap_err();
    assert!(matches!(too_low, SimstringError::InvalidThreshold(a) if a == 0.0));
}

#[test]
fn word_ngrams_scenario() {
    let mut db = Database::new(Extractor::word_ngrams(2, " ", "#"));
    db.insert("foo bar baz").unwrap();
    let searcher = Searcher::new(&db, Arc::new(Jaccard));

    let results = searcher.ranked_search("foo bar baz", 1.0).unwrap();
    assert_eq!(results, vec![("foo bar baz".to_string(), 1.0)]);

    let empty_query = searcher.search("", 0.5).unwrap();
    assert!(empty_query.is_empty() || empty_query == vec!["foo bar baz".to_string()]);
}

#[test]
fn custom_extractor_scenario() {
    let extractor = Extractor::custom(|text: &str| Ok(text.split(',').map(String::from).collect()));
    let mut db = Database::new(extractor);
    db.insert("a,b,c").unwrap();
    db.insert("a,b,d").unwrap();

    let searcher = Searcher::new(&db, Arc::new(Jaccard));
    let results = searcher.search("a,b,c", 0.5).unwrap();
    assert!(results.contains(&"a,b,c".to_string()));
}

#[test]
fn bulk_insert_then_search_matches_one_by_one() {
    let mut sequential = bigram_db(&["apple", "apply", "banana"]);
    let mut bulk = Database::new(Extractor::character_ngrams(2, "$"));
    bulk.insert_all(
        ["apple", "apply", "banana"]
            .into_iter()
            .map(String::from),
    )
    .unwrap();

    let a = Searcher::new(&sequential, Arc::new(Cosine) as Arc<dyn simstring_core::measure::Measure>)
        .search("apple", 0.5)
        .unwrap();
    let b = Searcher::new(&bulk, Arc::new(Cosine) as Arc<dyn simstring_core::measure::Measure>)
        .search("apple", 0.5)
        .unwrap();
    assert_eq!(a, b);

    sequential.clear();
    assert!(sequential.is_empty());
}
