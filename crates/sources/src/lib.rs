//! # Sources Crate
//!
//! Candidate generation for seed-based recommendations.
//!
//! ## Components
//!
//! ### Content Source
//! Text similarity over item feature text:
//! - Unigram and bigram term counts with English stop words removed
//! - Sparse cosine similarity between items
//! - Merged ranking of the three seeds' similarity rows
//!
//! ### Collaborative Source
//! Neighbourhood voting around a virtual user:
//! - Rating model picks the users most likely to love each seed
//! - A virtual user rating the seeds joins their ratings
//! - Normalized utility matrix and user-user cosine similarity
//! - The virtual user's nearest neighbours vote with their favourite items
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{CollaborativeSource, ContentSource, VirtualUser};
//! use std::sync::Arc;
//!
//! let content = ContentSource::new(item_ids, &feature_texts);
//! let ranked = content.get_candidates(&[1, 2, 3])?;
//!
//! let collaborative = CollaborativeSource::new(Arc::new(model), VirtualUser::new(200000));
//! let voted = collaborative.get_candidates(&[1, 2, 3], &working_ratings)?;
//! ```

pub mod collaborative;
pub mod content;
pub mod error;
pub mod neighbors;
pub mod similarity;
pub mod stopwords;
pub mod types;
pub mod utility;
pub mod vectorizer;

// Re-export commonly used types
pub use collaborative::CollaborativeSource;
pub use content::ContentSource;
pub use error::SourceError;
pub use neighbors::NeighborFinder;
pub use similarity::CosineSimilarity;
pub use types::{Candidate, CandidateMetadata, CandidateSource, SEED_COUNT, SeedContext};
pub use utility::{UtilityMatrix, VirtualUser};
pub use vectorizer::{CountVectorizer, TermCounts};
