//! Candidate users: the users the rating model expects to like a seed most.

use crate::types::SEED_COUNT;
use data_loader::{ItemId, UserId};
use predictor::RatingPredictor;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Finds, for each seed item, the users with the highest predicted rating
#[derive(Clone)]
pub struct NeighborFinder {
    predictor: Arc<dyn RatingPredictor>,

    /// Users kept per seed
    neighbors_per_seed: usize,
}

impl NeighborFinder {
    pub fn new(predictor: Arc<dyn RatingPredictor>) -> Self {
        Self {
            predictor,
            neighbors_per_seed: 50,
        }
    }

    /// Configure how many users are kept per seed (default: 50)
    pub fn with_neighbors_per_seed(mut self, n: usize) -> Self {
        self.neighbors_per_seed = n;
        self
    }

    /// The top users for a single item, best first.
    ///
    /// Users with equal estimates keep the order of `users`.
    pub fn top_users_for(&self, item_id: ItemId, users: &[UserId]) -> Vec<UserId> {
        let mut predictions = self.predictor.predict_for_users(item_id, users);
        predictions.sort_by(|a, b| {
            b.estimate
                .partial_cmp(&a.estimate)
                .unwrap_or(Ordering::Equal)
        });
        predictions
            .into_iter()
            .take(self.neighbors_per_seed)
            .map(|p| p.user_id)
            .collect()
    }

    /// Union of the top users of every seed
    pub fn find_candidate_users(
        &self,
        seeds: &[ItemId; SEED_COUNT],
        users: &[UserId],
    ) -> HashSet<UserId> {
        let mut candidates = HashSet::new();
        for &seed in seeds {
            candidates.extend(self.top_users_for(seed, users));
        }
        debug!(
            "Found {} candidate users among {} for seeds {:?}",
            candidates.len(),
            users.len(),
            seeds
        );
        candidates
    }
}
