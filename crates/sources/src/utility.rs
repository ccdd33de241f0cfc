//! The virtual user and the normalized user × item utility matrix.
//!
//! A utility matrix is built fresh for every collaborative request from the
//! ratings of the candidate users plus the virtual user's seed ratings. It
//! is never shared between requests.
//!
//! ## Normalization
//! Per user, over the ratings that user actually gave:
//! `(r - mean) / (max - min)`. A user whose ratings are all equal has no
//! range; every cell of that row becomes 0. Absent cells are 0.

use crate::similarity::CosineSimilarity;
use crate::types::SEED_COUNT;
use data_loader::{ItemId, Rating, UserId};
use sprs::{CsMat, TriMat};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// A synthetic user standing in for the caller's three seed choices
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualUser {
    id: UserId,
    ratings: [f32; SEED_COUNT],
}

impl VirtualUser {
    /// Virtual user rating the seeds 5.0, 5.0 and 4.5
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            ratings: [5.0, 5.0, 4.5],
        }
    }

    /// Configure the ratings given to the seeds, in seed order
    pub fn with_ratings(mut self, ratings: [f32; SEED_COUNT]) -> Self {
        self.ratings = ratings;
        self
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    /// The rows this user contributes for `seeds`, in seed order
    pub fn ratings_for(&self, seeds: &[ItemId; SEED_COUNT]) -> Vec<Rating> {
        seeds
            .iter()
            .zip(self.ratings)
            .map(|(&item_id, rating)| Rating::new(self.id, item_id, rating))
            .collect()
    }

    /// Append this user's seed ratings after `ratings`
    pub fn augment(&self, mut ratings: Vec<Rating>, seeds: &[ItemId; SEED_COUNT]) -> Vec<Rating> {
        ratings.extend(self.ratings_for(seeds));
        ratings
    }
}

/// Row-normalized user × item matrix with user-user cosine similarity.
///
/// Rows are sorted by user id, columns by item id. Only items with at least
/// one non-zero normalized value are kept as columns.
#[derive(Debug, Clone)]
pub struct UtilityMatrix {
    users: Vec<UserId>,
    items: Vec<ItemId>,
    rows: HashMap<UserId, usize>,
    columns: HashMap<ItemId, usize>,
    values: CsMat<f64>,
    signal: Vec<bool>,
    similarity: CosineSimilarity,
}

impl UtilityMatrix {
    /// Pivot `ratings` into a normalized matrix.
    ///
    /// Repeated (user, item) pairs are averaged before normalization.
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let mut cells: BTreeMap<UserId, BTreeMap<ItemId, (f64, u32)>> = BTreeMap::new();
        for rating in ratings {
            let cell = cells
                .entry(rating.user_id)
                .or_default()
                .entry(rating.item_id)
                .or_insert((0.0, 0));
            cell.0 += rating.rating as f64;
            cell.1 += 1;
        }

        let mut normalized: Vec<(UserId, Vec<(ItemId, f64)>)> = Vec::with_capacity(cells.len());
        let mut degenerate = 0usize;
        for (user_id, row) in cells {
            let means: Vec<(ItemId, f64)> = row
                .into_iter()
                .map(|(item_id, (sum, count))| (item_id, sum / count as f64))
                .collect();

            let n = means.len() as f64;
            let mean = means.iter().map(|(_, v)| v).sum::<f64>() / n;
            let max = means.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
            let min = means.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
            let range = max - min;

            let row = if range > 0.0 {
                means
                    .into_iter()
                    .map(|(item_id, v)| (item_id, (v - mean) / range))
                    .collect()
            } else {
                degenerate += 1;
                Vec::new()
            };
            normalized.push((user_id, row));
        }
        if degenerate > 0 {
            debug!("DegenerateNormalization: {} users with zero rating range", degenerate);
        }

        let items: Vec<ItemId> = normalized
            .iter()
            .flat_map(|(_, row)| row.iter())
            .filter(|(_, v)| *v != 0.0)
            .map(|(item_id, _)| *item_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let columns: HashMap<ItemId, usize> = items
            .iter()
            .enumerate()
            .map(|(col, &item_id)| (item_id, col))
            .collect();

        let users: Vec<UserId> = normalized.iter().map(|(user_id, _)| *user_id).collect();
        let rows: HashMap<UserId, usize> = users
            .iter()
            .enumerate()
            .map(|(row, &user_id)| (user_id, row))
            .collect();

        let mut triplets = TriMat::new((users.len(), items.len()));
        let mut signal = vec![false; users.len()];
        for (row, (_, values)) in normalized.iter().enumerate() {
            for &(item_id, value) in values {
                if value == 0.0 {
                    continue;
                }
                if let Some(&col) = columns.get(&item_id) {
                    triplets.add_triplet(row, col, value);
                    signal[row] = true;
                }
            }
        }
        let values: CsMat<f64> = triplets.to_csr();
        let similarity = CosineSimilarity::new(values.clone());

        debug!(
            "Built utility matrix: {} users x {} items, {} non-zero cells",
            users.len(),
            items.len(),
            values.nnz()
        );

        Self {
            users,
            items,
            rows,
            columns,
            values,
            signal,
            similarity,
        }
    }

    /// Row order: user ids ascending
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    /// Column order: item ids ascending, no-signal items dropped
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.rows.contains_key(&user_id)
    }

    /// Normalized cell value, 0 when absent
    pub fn value(&self, user_id: UserId, item_id: ItemId) -> f64 {
        match (self.rows.get(&user_id), self.columns.get(&item_id)) {
            (Some(&row), Some(&col)) => self.values.get(row, col).copied().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Whether a user has at least one non-zero normalized value
    pub fn has_signal(&self, user_id: UserId) -> bool {
        self.rows
            .get(&user_id)
            .is_some_and(|&row| self.signal[row])
    }

    /// Cosine similarity of `user_id` to every user, in row order
    pub fn similarities_to(&self, user_id: UserId) -> Option<Vec<(UserId, f64)>> {
        let row = *self.rows.get(&user_id)?;
        let similarities = self.similarity.similarity_row(row)?;
        Some(self.users.iter().copied().zip(similarities).collect())
    }

    /// Full user × user similarity matrix, in row order
    pub fn user_similarity_matrix(&self) -> Vec<Vec<f64>> {
        self.similarity.similarity_matrix()
    }

    /// Items holding the user's maximum normalized value, in item order.
    ///
    /// Empty for users without signal.
    pub fn max_rated_items(&self, user_id: UserId) -> Vec<ItemId> {
        let Some(row) = self.rows.get(&user_id).and_then(|&r| self.values.outer_view(r)) else {
            return Vec::new();
        };

        let max = row
            .iter()
            .map(|(_, &v)| v)
            .fold(f64::NEG_INFINITY, f64::max);
        if max <= 0.0 {
            return Vec::new();
        }

        row.iter()
            .filter(|&(_, &v)| v == max)
            .map(|(col, _)| self.items[col])
            .collect()
    }
}
