//! Collaborative source: what users who resemble the seeds like best.
//!
//! ## Algorithm
//! 1. Ask the rating model which users would rate each seed highest
//! 2. Keep every rating of those users from the working subset
//! 3. Append the virtual user's seed ratings
//! 4. Build the normalized utility matrix and rank users by cosine
//!    similarity to the virtual user
//! 5. Take the top K other users that carry signal as neighbours
//! 6. Each neighbour votes for all items at their maximum normalized value
//! 7. Rank items by votes (ties by first vote)

use crate::error::{Result, SourceError};
use crate::neighbors::NeighborFinder;
use crate::types::{Candidate, CandidateSource, SEED_COUNT};
use crate::utility::{UtilityMatrix, VirtualUser};
use data_loader::{ItemId, RatingStore, UserId};
use predictor::RatingPredictor;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Collaborative candidate generation around a virtual user
#[derive(Clone)]
pub struct CollaborativeSource {
    finder: NeighborFinder,
    virtual_user: VirtualUser,

    /// Neighbours of the virtual user that vote
    k: usize,
}

impl CollaborativeSource {
    pub fn new(predictor: Arc<dyn RatingPredictor>, virtual_user: VirtualUser) -> Self {
        Self {
            finder: NeighborFinder::new(predictor),
            virtual_user,
            k: 50,
        }
    }

    /// Configure the number of voting neighbours (default: 50)
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Configure users kept per seed by the neighbor finder (default: 50)
    pub fn with_neighbors_per_seed(mut self, n: usize) -> Self {
        self.finder = self.finder.with_neighbors_per_seed(n);
        self
    }

    pub fn virtual_user(&self) -> &VirtualUser {
        &self.virtual_user
    }

    /// Utility matrix of the candidate users plus the virtual user
    pub fn build_utility_matrix(
        &self,
        seeds: &[ItemId; SEED_COUNT],
        working: &RatingStore,
    ) -> UtilityMatrix {
        let candidate_users = self.finder.find_candidate_users(seeds, working.users());
        let subset = working.ratings_of_users(&candidate_users);
        debug!(
            "Working subset for {} candidate users: {} ratings",
            candidate_users.len(),
            subset.len()
        );

        let augmented = self.virtual_user.augment(subset, seeds);
        UtilityMatrix::from_ratings(&augmented)
    }

    /// The K users most similar to the virtual user, best first.
    ///
    /// Users without signal are skipped; ties keep user id order.
    pub fn select_neighbors(&self, matrix: &UtilityMatrix) -> Vec<UserId> {
        let virtual_id = self.virtual_user.id();
        if !matrix.has_signal(virtual_id) {
            warn!("Virtual user {} has no rating signal", virtual_id);
            return Vec::new();
        }
        let Some(mut similarities) = matrix.similarities_to(virtual_id) else {
            return Vec::new();
        };

        similarities.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        similarities
            .into_iter()
            .filter(|&(user_id, _)| user_id != virtual_id && matrix.has_signal(user_id))
            .take(self.k)
            .map(|(user_id, _)| user_id)
            .collect()
    }

    /// Items ranked by neighbour votes
    #[instrument(skip(self, working), fields(working_ratings = working.len()))]
    pub fn get_candidates(
        &self,
        seeds: &[ItemId; SEED_COUNT],
        working: &RatingStore,
    ) -> Result<Vec<Candidate>> {
        let matrix = self.build_utility_matrix(seeds, working);
        let neighbors = self.select_neighbors(&matrix);
        if neighbors.is_empty() {
            return Err(SourceError::EmptyCandidatePool);
        }
        debug!("Selected {} neighbours", neighbors.len());

        let mut order: Vec<ItemId> = Vec::new();
        let mut votes: HashMap<ItemId, u32> = HashMap::new();
        for &neighbor in &neighbors {
            for item_id in matrix.max_rated_items(neighbor) {
                let count = votes.entry(item_id).or_insert_with(|| {
                    order.push(item_id);
                    0
                });
                *count += 1;
            }
        }

        let mut candidates: Vec<Candidate> = order
            .into_iter()
            .map(|item_id| {
                let count = votes.get(&item_id).copied().unwrap_or(0);
                let mut candidate =
                    Candidate::new(item_id, CandidateSource::Collaborative, count as f64);
                candidate.metadata.neighbor_votes = Some(count);
                candidate
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.base_score
                .partial_cmp(&a.base_score)
                .unwrap_or(Ordering::Equal)
        });

        debug!("Generated {} collaborative candidates", candidates.len());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Rating;

    /// Predicts higher ratings for lower user ids
    struct RankByIdPredictor;

    impl RatingPredictor for RankByIdPredictor {
        fn predict(&self, user_id: UserId, _item_id: ItemId) -> f32 {
            5.0 - user_id as f32 * 0.1
        }
    }

    const VIRTUAL: UserId = 1000;
    const SEEDS: [ItemId; 3] = [1, 2, 3];

    fn working_store() -> RatingStore {
        let rows = [
            // Users 1 and 2 love the seeds and item 10
            (1, 1, 5.0),
            (1, 2, 4.0),
            (1, 10, 5.0),
            (1, 20, 1.0),
            (2, 1, 5.0),
            (2, 3, 4.0),
            (2, 10, 5.0),
            (2, 30, 1.0),
            // User 3 likes item 20
            (3, 1, 4.0),
            (3, 20, 5.0),
            (3, 30, 1.0),
            // User 4 rates everything the same
            (4, 1, 3.0),
            (4, 40, 3.0),
        ];
        RatingStore::from_ratings(rows.iter().map(|&(u, i, r)| Rating::new(u, i, r)))
    }

    fn source() -> CollaborativeSource {
        CollaborativeSource::new(Arc::new(RankByIdPredictor), VirtualUser::new(VIRTUAL))
    }

    #[test]
    fn test_virtual_user_is_in_matrix_but_not_a_neighbor() {
        let source = source();
        let matrix = source.build_utility_matrix(&SEEDS, &working_store());
        assert!(matrix.contains_user(VIRTUAL));
        assert!(matrix.has_signal(VIRTUAL));

        let neighbors = source.select_neighbors(&matrix);
        assert!(!neighbors.contains(&VIRTUAL));
        assert!(!neighbors.contains(&4), "flat user carries no signal");
        assert_eq!(neighbors.len(), 3);
    }

    #[test]
    fn test_votes_rank_candidates() {
        let candidates = source().get_candidates(&SEEDS, &working_store()).unwrap();

        // Users 1 and 2 peak on the seed 1 and item 10, user 3 on item 20.
        // Seeds are still present here; the filter pipeline removes them.
        let ids: Vec<ItemId> = candidates.iter().map(|c| c.item_id).collect();
        assert_eq!(ids, vec![1, 10, 20]);
        assert_eq!(candidates[1].metadata.neighbor_votes, Some(2));
        assert_eq!(candidates[2].metadata.neighbor_votes, Some(1));
        assert!(candidates.iter().all(|c| c.source == CandidateSource::Collaborative));
    }

    #[test]
    fn test_k_limits_neighbors() {
        let source = source().with_k(1);
        let matrix = source.build_utility_matrix(&SEEDS, &working_store());
        assert_eq!(source.select_neighbors(&matrix).len(), 1);
    }

    #[test]
    fn test_no_neighbors_is_empty_pool() {
        let store = RatingStore::from_ratings(vec![Rating::new(1, 1, 3.0), Rating::new(1, 2, 3.0)]);
        let result = source().get_candidates(&SEEDS, &store);
        assert_eq!(result, Err(SourceError::EmptyCandidatePool));
    }

    #[test]
    fn test_neighbors_per_seed_restricts_candidate_users() {
        let source = source().with_neighbors_per_seed(1);
        let matrix = source.build_utility_matrix(&SEEDS, &working_store());
        // Lowest id is predicted highest for every seed
        assert_eq!(matrix.users(), &[1, VIRTUAL]);
    }
}
