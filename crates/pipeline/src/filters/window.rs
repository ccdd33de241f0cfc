//! Filter that keeps the head of a ranked list.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, SeedContext};

/// Keeps at most `size` candidates, in rank order
pub struct WindowFilter {
    size: usize,
}

impl WindowFilter {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl Filter for WindowFilter {
    fn name(&self) -> &str {
        "WindowFilter"
    }

    fn apply(&self, mut candidates: Vec<Candidate>, _context: &SeedContext) -> Result<Vec<Candidate>> {
        candidates.truncate(self.size);
        Ok(candidates)
    }
}
