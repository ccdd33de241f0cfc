//! Content source: items whose feature text resembles the seeds'.
//!
//! ## Algorithm
//! 1. Rank every indexed item by its similarity to each seed separately
//!    (descending, ties by item order)
//! 2. Concatenate the three rankings in seed order
//! 3. Sort the concatenation by score, keeping concatenation order on ties
//!
//! The merged ranking still contains the seeds and may contain an item up
//! to three times. Seed removal, the pool window and deduplication are the
//! job of the filter pipeline.

use crate::error::{Result, SourceError};
use crate::similarity::CosineSimilarity;
use crate::types::{Candidate, CandidateSource, SEED_COUNT};
use crate::vectorizer::CountVectorizer;
use data_loader::ItemId;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Content-based candidate generation over a fixed item subset
#[derive(Clone)]
pub struct ContentSource {
    item_ids: Arc<Vec<ItemId>>,
    positions: Arc<HashMap<ItemId, usize>>,
    similarity: Arc<CosineSimilarity>,

    /// Size of the merged ranking window, rank 1 included
    pool_size: usize,
}

impl ContentSource {
    /// Vectorize `feature_texts` and index them under `item_ids`.
    ///
    /// Both slices are in item order; `feature_texts[i]` describes `item_ids[i]`.
    pub fn new<S: AsRef<str>>(item_ids: Vec<ItemId>, feature_texts: &[S]) -> Self {
        Self::with_vectorizer(item_ids, feature_texts, &CountVectorizer::new())
    }

    /// Like [`ContentSource::new`] with a custom vectorizer
    pub fn with_vectorizer<S: AsRef<str>>(
        item_ids: Vec<ItemId>,
        feature_texts: &[S],
        vectorizer: &CountVectorizer,
    ) -> Self {
        let counts = vectorizer.fit_transform(feature_texts);
        let similarity = CosineSimilarity::new(counts.matrix);

        // First occurrence wins if an id repeats
        let mut positions = HashMap::with_capacity(item_ids.len());
        for (position, &item_id) in item_ids.iter().enumerate() {
            positions.entry(item_id).or_insert(position);
        }

        debug!(
            "Indexed {} items over {} terms",
            item_ids.len(),
            counts.vocabulary.len()
        );

        Self {
            item_ids: Arc::new(item_ids),
            positions: Arc::new(positions),
            similarity: Arc::new(similarity),
            pool_size: 50,
        }
    }

    /// Configure the merged ranking window (default: 50)
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Indexed item ids, in item order
    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    /// Row of `item_id` in the similarity index
    pub fn position_of(&self, item_id: ItemId) -> Option<usize> {
        self.positions.get(&item_id).copied()
    }

    pub fn similarity(&self) -> &CosineSimilarity {
        &self.similarity
    }

    /// Similarity between two indexed items
    pub fn item_similarity(&self, a: ItemId, b: ItemId) -> Result<f64> {
        let row = self.require_position(a)?;
        let col = self.require_position(b)?;
        Ok(self.similarity.similarity(row, col).unwrap_or(0.0))
    }

    /// Merged similarity ranking of the three seeds, assuming only the
    /// seeds themselves are dropped downstream.
    pub fn get_candidates(&self, seeds: &[ItemId; SEED_COUNT]) -> Result<Vec<Candidate>> {
        let excluded: HashSet<ItemId> = seeds.iter().copied().collect();
        self.get_candidates_excluding(seeds, &excluded)
    }

    /// Merged similarity ranking of the three seeds.
    ///
    /// `excluded` holds every item the caller removes before the pool
    /// window. Each seed contributes only the head of its own ranking: an
    /// entry further down than `pool_size - 1` plus the number of indexed
    /// excluded items already has a full window ahead of it.
    #[instrument(skip(self, excluded))]
    pub fn get_candidates_excluding(
        &self,
        seeds: &[ItemId; SEED_COUNT],
        excluded: &HashSet<ItemId>,
    ) -> Result<Vec<Candidate>> {
        let reserved = excluded
            .iter()
            .filter(|id| self.positions.contains_key(id))
            .count();
        let head = self.pool_size.saturating_sub(1) + reserved;

        let mut merged = Vec::with_capacity(head * SEED_COUNT);
        for (seed_position, &seed) in seeds.iter().enumerate() {
            let row = self.require_position(seed)?;
            for (position, score) in self.ranked_row(row, head) {
                let mut candidate =
                    Candidate::new(self.item_ids[position], CandidateSource::Content, score);
                candidate.metadata.seed_position = Some(seed_position);
                merged.push(candidate);
            }
        }

        merged.sort_by(|a, b| {
            b.base_score
                .partial_cmp(&a.base_score)
                .unwrap_or(Ordering::Equal)
        });

        debug!("Merged {} content candidates", merged.len());
        Ok(merged)
    }

    /// The `limit` most similar rows to `row`, best first, ties by row order
    fn ranked_row(&self, row: usize, limit: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = self
            .similarity
            .similarity_row(row)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .collect();

        let by_score = |a: &(usize, f64), b: &(usize, f64)| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        };
        if limit < ranked.len() {
            ranked.select_nth_unstable_by(limit, by_score);
            ranked.truncate(limit);
        }
        ranked.sort_by(by_score);
        ranked
    }

    fn require_position(&self, item_id: ItemId) -> Result<usize> {
        self.position_of(item_id)
            .ok_or(SourceError::UnknownItem { item_id })
    }
}
