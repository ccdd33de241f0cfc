//! Feature text construction for content similarity.
//!
//! Each item's feature text concatenates, in order:
//! 1. plot keywords
//! 2. cast
//! 3. the director token, three times
//! 4. genres
//!
//! Missing cast, keywords or director are first imputed with the most
//! frequent value of that field across the whole catalog.

use data_loader::{CatalogStore, Item, ItemId};
use rayon::prelude::*;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

/// How many times the director token is repeated
const DIRECTOR_WEIGHT: usize = 3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    /// Imputation needs at least one item
    #[error("Catalog is empty, no modal value to impute from")]
    EmptyCatalog,
}

/// One item of the featured subset
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturedItem {
    pub item_id: ItemId,
    pub title: String,
    pub feature_text: String,
}

/// The first `subset_size` catalog items with their feature text, in catalog order
#[derive(Debug, Clone, Default)]
pub struct FeaturedCatalog {
    items: Vec<FeaturedItem>,
}

impl FeaturedCatalog {
    pub fn items(&self) -> &[FeaturedItem] {
        &self.items
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.item_id).collect()
    }

    pub fn feature_texts(&self) -> Vec<&str> {
        self.items
            .iter()
            .map(|item| item.feature_text.as_str())
            .collect()
    }

    /// First featured item with this exact title
    pub fn find_by_title(&self, title: &str) -> Option<&FeaturedItem> {
        self.items.iter().find(|item| item.title == title)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Modal values used to fill missing fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Imputation {
    pub cast: Vec<String>,
    pub plot_keywords: Vec<String>,
    pub director: String,
}

/// Builds feature text for a capped prefix of the catalog
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    subset_size: usize,
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self { subset_size: 27_000 }
    }

    /// Configure how many catalog items are featured (default: 27000)
    pub fn with_subset_size(mut self, subset_size: usize) -> Self {
        self.subset_size = subset_size;
        self
    }

    /// Modal cast, keywords and director over the full catalog
    pub fn imputation(catalog: &CatalogStore) -> Result<Imputation, FeatureError> {
        if catalog.is_empty() {
            return Err(FeatureError::EmptyCatalog);
        }
        let items = catalog.items();

        let cast = modal(items.iter().filter_map(|item| item.cast.as_ref()))
            .cloned()
            .unwrap_or_default();
        let plot_keywords = modal(items.iter().filter_map(|item| item.plot_keywords.as_ref()))
            .cloned()
            .unwrap_or_default();
        let director = modal(items.iter().filter_map(|item| item.director.as_ref()))
            .cloned()
            .unwrap_or_default();

        Ok(Imputation {
            cast,
            plot_keywords,
            director,
        })
    }

    /// Feature text for every item of the subset.
    ///
    /// The catalog itself is left untouched.
    pub fn build(&self, catalog: &CatalogStore) -> Result<FeaturedCatalog, FeatureError> {
        let imputation = Self::imputation(catalog)?;
        debug!(
            "Imputing director '{}', {} cast members, {} keywords",
            imputation.director,
            imputation.cast.len(),
            imputation.plot_keywords.len()
        );

        let subset = &catalog.items()[..self.subset_size.min(catalog.len())];
        let items: Vec<FeaturedItem> = subset
            .par_iter()
            .map(|item| FeaturedItem {
                item_id: item.id,
                title: item.title.clone(),
                feature_text: feature_text(item, &imputation),
            })
            .collect();

        info!(
            "Built feature text for {} of {} items",
            items.len(),
            catalog.len()
        );
        Ok(FeaturedCatalog { items })
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase and strip all whitespace so a director is a single token
pub fn director_token(director: &str) -> String {
    director
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Feature text of one item, missing fields filled from `imputation`
pub fn feature_text(item: &Item, imputation: &Imputation) -> String {
    let keywords = item.plot_keywords.as_ref().unwrap_or(&imputation.plot_keywords);
    let cast = item.cast.as_ref().unwrap_or(&imputation.cast);
    let director = director_token(item.director.as_deref().unwrap_or(&imputation.director));

    let mut tokens: Vec<&str> = Vec::new();
    tokens.extend(keywords.iter().map(String::as_str));
    tokens.extend(cast.iter().map(String::as_str));
    tokens.extend(std::iter::repeat(director.as_str()).take(DIRECTOR_WEIGHT));
    tokens.extend(item.genres.iter().map(String::as_str));

    tokens
        .into_iter()
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Most frequent value; ties go to the smallest value
fn modal<'a, T>(values: impl Iterator<Item = &'a T>) -> Option<&'a T>
where
    T: Ord + std::hash::Hash + 'a,
{
    let mut counts: HashMap<&T, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(a, count_a), (b, count_b)| count_a.cmp(count_b).then_with(|| b.cmp(a)))
        .map(|(value, _)| value)
}
