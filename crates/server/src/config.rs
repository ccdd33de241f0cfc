//! Recommender configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "subset_size": 10000, "similar_users": 30 }
//! ```

use crate::error::RecommendError;
use data_loader::{ItemId, UserId};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Catalog prefix used by the content recommender
    #[serde(default = "default_subset_size")]
    pub subset_size: usize,

    /// Merged content ranking window, rank 1 included
    #[serde(default = "default_content_pool_size")]
    pub content_pool_size: usize,

    /// Users kept per seed when looking for candidate users
    #[serde(default = "default_neighbors_per_seed")]
    pub neighbors_per_seed: usize,

    /// Neighbours of the virtual user that vote
    #[serde(default = "default_similar_users")]
    pub similar_users: usize,

    /// Preferred id of the virtual user
    #[serde(default = "default_virtual_user_id")]
    pub virtual_user_id: UserId,

    /// Ratings the virtual user gives the seeds, in seed order
    #[serde(default = "default_virtual_ratings")]
    pub virtual_ratings: [f32; 3],

    /// Items offered to callers; when set, the collaborative recommender
    /// only works with users who rated at least one of them
    #[serde(default)]
    pub selectable_items: Vec<ItemId>,
}

fn default_subset_size() -> usize {
    27_000
}

fn default_content_pool_size() -> usize {
    50
}

fn default_neighbors_per_seed() -> usize {
    50
}

fn default_similar_users() -> usize {
    50
}

fn default_virtual_user_id() -> UserId {
    200_000
}

fn default_virtual_ratings() -> [f32; 3] {
    [5.0, 5.0, 4.5]
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            subset_size: default_subset_size(),
            content_pool_size: default_content_pool_size(),
            neighbors_per_seed: default_neighbors_per_seed(),
            similar_users: default_similar_users(),
            virtual_user_id: default_virtual_user_id(),
            virtual_ratings: default_virtual_ratings(),
            selectable_items: Vec::new(),
        }
    }
}

impl RecommenderConfig {
    /// Read and validate a JSON config file
    pub fn from_file(path: &Path) -> Result<Self, RecommendError> {
        let invalid = |reason: String| {
            RecommendError::InvalidConfig(format!("{}: {}", path.display(), reason))
        };
        let bytes = std::fs::read(path).map_err(|e| invalid(e.to_string()))?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|e| invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RecommendError> {
        if self.subset_size == 0 {
            return Err(RecommendError::InvalidConfig(
                "subset_size must be at least 1".into(),
            ));
        }
        if self.content_pool_size < 2 {
            return Err(RecommendError::InvalidConfig(
                "content_pool_size must be at least 2".into(),
            ));
        }
        if self.virtual_ratings.iter().any(|r| !r.is_finite()) {
            return Err(RecommendError::InvalidConfig(
                "virtual_ratings must be finite".into(),
            ));
        }
        Ok(())
    }
}
