//! Filter to collapse repeated items, keeping the best-ranked occurrence.

use crate::traits::Filter;
use anyhow::Result;
use data_loader::ItemId;
use sources::{Candidate, SeedContext};
use std::collections::HashSet;

pub struct DuplicateFilter;

impl Filter for DuplicateFilter {
    fn name(&self) -> &str {
        "DuplicateFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, _context: &SeedContext) -> Result<Vec<Candidate>> {
        let mut seen: HashSet<ItemId> = HashSet::with_capacity(candidates.len());
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| seen.insert(candidate.item_id))
            .collect();
        Ok(filtered)
    }
}
