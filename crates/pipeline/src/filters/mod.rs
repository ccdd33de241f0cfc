//! Filter implementations for the candidate pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod duplicate;
pub mod seed_exclusion;
pub mod window;

// Re-export for convenience
pub use duplicate::DuplicateFilter;
pub use seed_exclusion::SeedExclusionFilter;
pub use window::WindowFilter;
