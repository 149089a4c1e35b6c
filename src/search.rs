//! The CPQ (Cosine/Dice/Jaccard/Overlap/Exact-match Pruning by Quantity)
//! search procedure.

use std::cmp::Ordering;
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::database::Database;
use crate::error::{Result, SimstringError};
use crate::feature::FeatureSet;
use crate::measure::Measure;

/// Below this many candidate feature-set sizes, the per-size scan stays
/// sequential; past it, sizes are fanned out with rayon. Each size's posting
/// lookup and intersection is independent of every other size, so this is
/// an embarrassingly parallel split, in the same spirit as the database's
/// bulk-insert crossover.
const PARALLEL_SIZE_THRESHOLD: usize = 16;

/// Drives the CPQ algorithm against a shared, read-only database reference.
/// Multiple searchers may share one database for concurrent read-only
/// queries, provided the host enforces writer exclusion.
pub struct Searcher<'db> {
    database: &'db Database,
    measure: Arc<dyn Measure>,
}

impl<'db> Searcher<'db> {
    pub fn new(database: &'db Database, measure: Arc<dyn Measure>) -> Self {
        Self { database, measure }
    }

    /// Every indexed string whose similarity to `query` is >= `alpha`,
    /// deduplicated by id, sorted lexicographically ascending.
    pub fn search(&self, query: &str, alpha: f64) -> Result<Vec<String>> {
        let accepted = self.accepted_candidates(query, alpha)?;
        let mut out: Vec<String> = accepted
            .keys()
            .map(|&id| self.database.original_string(id).to_string())
            .collect();
        out.sort();
        Ok(out)
    }

    /// Every accepted match paired with its similarity score, sorted by
    /// score descending, ties broken lexicographically ascending.
    pub fn ranked_search(&self, query: &str, alpha: f64) -> Result<Vec<(String, f64)>> {
        validate_alpha(alpha)?;
        let features = self.database.extractor().apply(query)?;
        let x = features.len();
        let accepted = self.accepted_candidates_for(&features, x, alpha);

        let mut out: Vec<(String, f64)> = accepted
            .into_iter()
            .map(|(id, c)| {
                let y = self.database.feature_set_size(id);
                let score = self.measure.similarity(x, y, c);
                (self.database.original_string(id).to_string(), score)
            })
            .collect();

        out.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        Ok(out)
    }

    /// Accepted candidate ids with their overlap count against the query,
    /// the id -> c map that both `search` and `ranked_search` build on.
    fn accepted_candidates(&self, query: &str, alpha: f64) -> Result<FxHashMap<usize, usize>> {
        validate_alpha(alpha)?;
        let features = self.database.extractor().apply(query)?;
        let x = features.len();
        Ok(self.accepted_candidates_for(&features, x, alpha))
    }

    fn accepted_candidates_for(
        &self,
        features: &FeatureSet,
        x: usize,
        alpha: f64,
    ) -> FxHashMap<usize, usize> {
        if x == 0 {
            return FxHashMap::default();
        }

        let tau_min = self.measure.min_feature_size(x, alpha).max(1);
        let tau_max = self
            .measure
            .max_feature_size(x, alpha)
            .min(self.database.max_feature_set_size());
        if tau_max < tau_min {
            return FxHashMap::default();
        }

        let sizes: Vec<usize> = (tau_min..=tau_max).collect();
        let per_size: Vec<FxHashMap<usize, usize>> = if sizes.len() < PARALLEL_SIZE_THRESHOLD {
            sizes
                .iter()
                .map(|&tau| self.search_size(features, x, tau, alpha))
                .collect()
        } else {
            sizes
                .par_iter()
                .map(|&tau| self.search_size(features, x, tau, alpha))
                .collect()
        };

        // Every candidate has exactly one feature-set size, so the per-size
        // maps are disjoint on keys; a plain union is exact, not a merge.
        let mut merged = FxHashMap::default();
        for map in per_size {
            merged.extend(map);
        }
        merged
    }

    /// Candidates of exactly `tau` features, accepted via threshold-counted
    /// intersection: build a count per candidate id across every
    /// query-feature posting list at this size, then keep ids whose count
    /// reaches μ. Preferred here over the shortest-lists-first scan because
    /// query feature-set sizes are small relative to posting-list lengths
    /// for this workload.
    fn search_size(
        &self,
        query_features: &FeatureSet,
        x: usize,
        tau: usize,
        alpha: f64,
    ) -> FxHashMap<usize, usize> {
        let mu = self.measure.min_common_feature_count(x, tau, alpha);
        let mut accepted = FxHashMap::default();
        if mu == 0 || mu > x || mu > tau {
            return accepted;
        }

        let postings: Vec<&[usize]> = query_features
            .iter()
            .map(|f| self.database.lookup(tau, f))
            .filter(|p| !p.is_empty())
            .collect();
        if postings.len() < mu {
            return accepted;
        }

        let mut counts: FxHashMap<usize, usize> = FxHashMap::default();
        for list in &postings {
            for &id in *list {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        accepted.extend(counts.into_iter().filter(|&(_, c)| c >= mu));
        accepted
    }
}

fn validate_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha <= 1.0 {
        Ok(())
    } else {
        Err(SimstringError::InvalidThreshold(alpha))
    }
}
