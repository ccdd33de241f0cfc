//! Server crate for the seed-based recommendation engine.
//!
//! This crate contains the service object that owns the shared stores and
//! the rating model and coordinates both recommendation strategies.

pub mod config;
pub mod error;
pub mod orchestrator;

pub use config::RecommenderConfig;
pub use error::{RecommendError, Result};
pub use orchestrator::{Recommendation, RecommendationService};
