//! Rating predictor backed by a pretrained latent-factor model.
//!
//! The model is consumed as an opaque artifact: it is trained elsewhere,
//! serialized to JSON and loaded once at startup. This crate provides:
//! - The `RatingPredictor` trait the recommenders depend on
//! - `LatentFactorModel`, a biased matrix-factorisation predictor
//! - Batch prediction of one item across an ordered set of users

use data_loader::{ItemId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading or validating a model artifact
#[derive(Error, Debug)]
pub enum PredictorError {
    /// The artifact could not be read or decoded. Fatal at startup.
    #[error("Rating model unavailable at {path}: {reason}")]
    ModelUnavailable { path: String, reason: String },

    /// The artifact decoded but its contents are inconsistent
    #[error("Invalid rating model: {0}")]
    InvalidModel(String),
}

/// One estimated rating
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub estimate: f32,
}

/// Anything that can estimate how a user would rate an item.
///
/// Implementations are immutable after construction and shared between
/// concurrent requests.
pub trait RatingPredictor: Send + Sync {
    /// Estimated rating of `item_id` by `user_id`
    fn predict(&self, user_id: UserId, item_id: ItemId) -> f32;

    /// Predict `item_id` for every user in `users`, preserving their order
    fn predict_for_users(&self, item_id: ItemId, users: &[UserId]) -> Vec<Prediction> {
        users
            .iter()
            .map(|&user_id| Prediction {
                user_id,
                item_id,
                estimate: self.predict(user_id, item_id),
            })
            .collect()
    }
}

/// Learned bias and latent vector of one user or item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentFactors {
    pub bias: f32,
    pub factors: Vec<f32>,
}

/// Biased matrix-factorisation model.
///
/// `estimate(u, i) = global_mean + b_u + b_i + q_i · p_u`, clipped to
/// `rating_scale`. An unknown user contributes neither bias nor factors,
/// likewise an unknown item, so a fully unknown pair estimates the global mean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatentFactorModel {
    pub global_mean: f32,
    pub rating_scale: (f32, f32),
    pub users: HashMap<UserId, LatentFactors>,
    pub items: HashMap<ItemId, LatentFactors>,
}

impl LatentFactorModel {
    /// Load and validate a JSON model artifact
    pub fn load(path: &Path) -> Result<Self, PredictorError> {
        info!("Loading rating model from {:?}", path);
        let unavailable = |reason: String| PredictorError::ModelUnavailable {
            path: path.display().to_string(),
            reason,
        };

        let bytes = std::fs::read(path).map_err(|e| unavailable(e.to_string()))?;
        let model: LatentFactorModel =
            serde_json::from_slice(&bytes).map_err(|e| unavailable(e.to_string()))?;
        model.validate()?;

        info!(
            "Rating model loaded: {} users, {} items, {} factors",
            model.users.len(),
            model.items.len(),
            model.n_factors()
        );
        Ok(model)
    }

    /// Check that every latent vector has the same dimension, every learned
    /// value is finite and the scale is sane
    pub fn validate(&self) -> Result<(), PredictorError> {
        let (low, high) = self.rating_scale;
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(PredictorError::InvalidModel(format!(
                "rating scale ({}, {}) is not an increasing finite range",
                low, high
            )));
        }
        if !self.global_mean.is_finite() {
            return Err(PredictorError::InvalidModel("global mean is not finite".into()));
        }

        let dim = self.n_factors();
        let mismatch = self
            .users
            .values()
            .chain(self.items.values())
            .find(|f| f.factors.len() != dim);
        if let Some(bad) = mismatch {
            return Err(PredictorError::InvalidModel(format!(
                "expected {} latent factors, found a vector of {}",
                dim,
                bad.factors.len()
            )));
        }

        let non_finite = self
            .users
            .iter()
            .map(|(&id, f)| ("user", id, f))
            .chain(self.items.iter().map(|(&id, f)| ("item", id, f)))
            .find(|(_, _, f)| !f.bias.is_finite() || f.factors.iter().any(|v| !v.is_finite()));
        if let Some((kind, id, _)) = non_finite {
            return Err(PredictorError::InvalidModel(format!(
                "{} {} has a non-finite bias or factor",
                kind, id
            )));
        }
        Ok(())
    }

    /// Dimension of the latent space (0 for a bias-only model)
    pub fn n_factors(&self) -> usize {
        self.users
            .values()
            .chain(self.items.values())
            .next()
            .map(|f| f.factors.len())
            .unwrap_or(0)
    }
}

impl RatingPredictor for LatentFactorModel {
    fn predict(&self, user_id: UserId, item_id: ItemId) -> f32 {
        let user = self.users.get(&user_id);
        let item = self.items.get(&item_id);

        let mut estimate = self.global_mean;
        if let Some(u) = user {
            estimate += u.bias;
        }
        if let Some(i) = item {
            estimate += i.bias;
        }
        if let (Some(u), Some(i)) = (user, item) {
            estimate += u
                .factors
                .iter()
                .zip(&i.factors)
                .map(|(p, q)| p * q)
                .sum::<f32>();
        } else {
            debug!("Unknown user {} or item {}, using baseline estimate", user_id, item_id);
        }

        let (low, high) = self.rating_scale;
        estimate.clamp(low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_model() -> LatentFactorModel {
        let mut users = HashMap::new();
        users.insert(1, LatentFactors { bias: 0.5, factors: vec![1.0, 0.0] });
        users.insert(2, LatentFactors { bias: -0.5, factors: vec![0.0, 1.0] });
        let mut items = HashMap::new();
        items.insert(10, LatentFactors { bias: 0.25, factors: vec![0.5, -0.5] });

        LatentFactorModel {
            global_mean: 3.5,
            rating_scale: (0.0, 5.0),
            users,
            items,
        }
    }

    #[test]
    fn test_predict_known_pair() {
        let model = test_model();
        // 3.5 + 0.5 + 0.25 + 0.5
        assert!((model.predict(1, 10) - 4.75).abs() < 1e-6);
        // 3.5 - 0.5 + 0.25 - 0.5
        assert!((model.predict(2, 10) - 2.75).abs() < 1e-6);
    }

    #[test]
    fn test_predict_unknown_user_and_item() {
        let model = test_model();
        assert!((model.predict(99, 10) - 3.75).abs() < 1e-6);
        assert!((model.predict(1, 99) - 4.0).abs() < 1e-6);
        assert!((model.predict(99, 99) - 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_predict_is_clipped_to_scale() {
        let mut model = test_model();
        model.global_mean = 6.0;
        assert_eq!(model.predict(1, 10), 5.0);
        model.global_mean = -3.0;
        assert_eq!(model.predict(2, 10), 0.0);
    }

    #[test]
    fn test_predict_for_users_preserves_order() {
        let model = test_model();
        let predictions = model.predict_for_users(10, &[2, 1, 99]);
        let users: Vec<UserId> = predictions.iter().map(|p| p.user_id).collect();
        assert_eq!(users, vec![2, 1, 99]);
        assert!(predictions.iter().all(|p| p.item_id == 10));
    }

    #[test]
    fn test_validate_rejects_dimension_mismatch() {
        let mut model = test_model();
        model.items.insert(11, LatentFactors { bias: 0.0, factors: vec![1.0] });
        assert!(matches!(model.validate(), Err(PredictorError::InvalidModel(_))));
    }

    #[test]
    fn test_validate_rejects_non_finite_values() {
        let mut model = test_model();
        model.users.insert(3, LatentFactors { bias: f32::INFINITY, factors: vec![0.0, 0.0] });
        assert!(matches!(model.validate(), Err(PredictorError::InvalidModel(_))));

        let mut model = test_model();
        model.items.insert(11, LatentFactors { bias: 0.0, factors: vec![f32::NAN, 1.0] });
        assert!(matches!(model.validate(), Err(PredictorError::InvalidModel(_))));

        assert!(test_model().validate().is_ok());
    }

    #[test]
    fn test_load_missing_artifact_is_unavailable() {
        let result = LatentFactorModel::load(Path::new("/no/such/model.json"));
        assert!(matches!(result, Err(PredictorError::ModelUnavailable { .. })));
    }
}
