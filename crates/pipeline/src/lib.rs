//! Pipeline for feature construction and filtering of ranked candidates.
//!
//! This crate provides:
//! - FeatureBuilder, which turns catalog metadata into feature text
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//!
//! ## Architecture
//! The content source consumes the feature text built here. Both sources
//! then hand their ranked candidates to a FilterPipeline, which removes
//! the seeds, cuts ranking windows and collapses duplicates.
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FeatureBuilder, FilterPipeline};
//! use pipeline::filters::*;
//!
//! let featured = FeatureBuilder::new().with_subset_size(27_000).build(&catalog)?;
//!
//! let pipeline = FilterPipeline::new()
//!     .add_filter(SeedExclusionFilter::by_id())
//!     .add_filter(WindowFilter::new(49))
//!     .add_filter(DuplicateFilter)
//!     .add_filter(WindowFilter::new(top_n));
//! let ranked = pipeline.apply(candidates, &seed_context)?;
//! ```

pub mod features;
pub mod filter_pipeline;
pub mod filters;
pub mod traits;

// Re-export main types
pub use features::{FeatureBuilder, FeatureError, FeaturedCatalog, FeaturedItem};
pub use filter_pipeline::FilterPipeline;
pub use traits::Filter;
