//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to ranked candidate lists.

use anyhow::Result;
use sources::{Candidate, SeedContext};

/// Core trait for filtering candidates.
///
/// Filters receive candidates in rank order and must preserve the relative
/// order of the candidates they keep.
///
/// - `Send + Sync` allows filters to be shared by concurrent requests
/// - Filters take ownership of the Vec<Candidate> and return a filtered Vec
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a ranked set of candidates.
    ///
    /// # Arguments
    /// * `candidates` - The candidates to filter (takes ownership)
    /// * `context` - The seeds of the current request
    fn apply(&self, candidates: Vec<Candidate>, context: &SeedContext) -> Result<Vec<Candidate>>;
}
