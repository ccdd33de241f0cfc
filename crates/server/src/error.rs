use pipeline::FeatureError;
use predictor::PredictorError;
use sources::SourceError;
use thiserror::Error;

/// Errors surfaced by the recommendation service
#[derive(Error, Debug)]
pub enum RecommendError {
    /// A seed title has no matching item in the catalog the strategy uses
    #[error("Item not found: {title}")]
    ItemNotFound { title: String },

    /// The catalog has no items to impute or recommend from
    #[error("Catalog is empty")]
    EmptyCatalog,

    /// The rating model artifact could not be loaded
    #[error(transparent)]
    ModelUnavailable(#[from] PredictorError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Candidate generation failed: {0}")]
    Source(SourceError),

    #[error("Filter pipeline failed: {0}")]
    Filter(#[from] anyhow::Error),
}

impl From<FeatureError> for RecommendError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::EmptyCatalog => RecommendError::EmptyCatalog,
        }
    }
}

pub type Result<T> = std::result::Result<T, RecommendError>;
