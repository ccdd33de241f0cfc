//! Filter to remove the seed items from a recommendation list.
//!
//! Seeds are removed by identity. Optionally, any item whose title equals
//! one of the supplied seed titles is removed as well, which also catches
//! catalog rows that share a seed's title under a different id.

use crate::traits::Filter;
use anyhow::Result;
use data_loader::CatalogStore;
use sources::{Candidate, SeedContext};
use std::sync::Arc;

/// Removes candidates that are one of the request's seeds.
pub struct SeedExclusionFilter {
    /// Catalog for title lookups, when matching by title
    catalog: Option<Arc<CatalogStore>>,
}

impl SeedExclusionFilter {
    /// Match seeds by item id only
    pub fn by_id() -> Self {
        Self { catalog: None }
    }

    /// Also match candidates whose catalog title equals a seed title
    pub fn with_titles(mut self, catalog: Arc<CatalogStore>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    fn is_seed(&self, candidate: &Candidate, context: &SeedContext) -> bool {
        if context.is_seed(candidate.item_id) {
            return true;
        }
        self.catalog
            .as_ref()
            .and_then(|catalog| catalog.title_of(candidate.item_id))
            .is_some_and(|title| context.is_seed_title(title))
    }
}

impl Filter for SeedExclusionFilter {
    fn name(&self) -> &str {
        "SeedExclusionFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, context: &SeedContext) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !self.is_seed(candidate, context))
            .collect();
        Ok(filtered)
    }
}
