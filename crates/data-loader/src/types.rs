//! Core domain types: items, ratings and the two read-only stores.
//!
//! Both stores preserve insertion (file) order. That order is significant:
//! it is the "original item order" used to break ties between equally
//! similar items and the order in which users are presented to the rating
//! predictor.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for an item in the catalog
pub type ItemId = u32;

/// Inclusive bounds of the rating scale used by the Rating Store
pub const RATING_SCALE: (f32, f32) = (0.0, 5.0);

// =============================================================================
// Item
// =============================================================================

/// An item in the catalog together with its descriptive metadata.
///
/// `cast`, `plot_keywords` and `director` are optional because the metadata
/// file does not cover every item. Missing values are imputed later by the
/// feature builder, never here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub genres: Vec<String>,
    pub cast: Option<Vec<String>>,
    pub plot_keywords: Option<Vec<String>>,
    pub director: Option<String>,
}

impl Item {
    /// Create an item with a title and genres and no extended metadata
    pub fn new(id: ItemId, title: impl Into<String>, genres: Vec<String>) -> Self {
        Self {
            id,
            title: title.into(),
            genres,
            cast: None,
            plot_keywords: None,
            director: None,
        }
    }

    pub fn with_cast(mut self, cast: Vec<String>) -> Self {
        self.cast = Some(cast);
        self
    }

    pub fn with_plot_keywords(mut self, keywords: Vec<String>) -> Self {
        self.plot_keywords = Some(keywords);
        self
    }

    pub fn with_director(mut self, director: impl Into<String>) -> Self {
        self.director = Some(director.into());
        self
    }
}

// =============================================================================
// Rating
// =============================================================================

/// A single (user, item, value) observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    /// Rating value within [`RATING_SCALE`]
    pub rating: f32,
    /// Unix timestamp when the rating was made, if the source carried one
    pub timestamp: Option<i64>,
}

impl Rating {
    pub fn new(user_id: UserId, item_id: ItemId, rating: f32) -> Self {
        Self {
            user_id,
            item_id,
            rating,
            timestamp: None,
        }
    }
}

// =============================================================================
// Catalog Store
// =============================================================================

/// Immutable-after-load table of items, in catalog order.
#[derive(Debug, Default, Clone)]
pub struct CatalogStore {
    pub(crate) items: Vec<Item>,
    /// Position of each item in `items`
    pub(crate) by_id: HashMap<ItemId, usize>,
    /// Positions of every item carrying a title (titles may repeat)
    pub(crate) by_title: HashMap<String, Vec<usize>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from items in order
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut catalog = Self::new();
        for item in items {
            catalog.insert_item(item);
        }
        catalog
    }

    /// Append an item. Re-inserting an existing id replaces the earlier row in place.
    pub fn insert_item(&mut self, item: Item) {
        if let Some(&position) = self.by_id.get(&item.id) {
            let old_title = std::mem::replace(&mut self.items[position].title, item.title.clone());
            if let Some(positions) = self.by_title.get_mut(&old_title) {
                positions.retain(|&p| p != position);
                if positions.is_empty() {
                    self.by_title.remove(&old_title);
                }
            }
            self.index_title(&item.title, position);
            self.items[position] = item;
            return;
        }

        let position = self.items.len();
        self.by_id.insert(item.id, position);
        self.index_title(&item.title, position);
        self.items.push(item);
    }

    fn index_title(&mut self, title: &str, position: usize) {
        let positions = self.by_title.entry(title.to_string()).or_default();
        positions.push(position);
        positions.sort_unstable();
    }

    pub fn get_item(&self, id: ItemId) -> Option<&Item> {
        self.by_id.get(&id).map(|&p| &self.items[p])
    }

    /// All items in catalog order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Catalog positions of every item with exactly this title, in catalog order
    pub fn positions_of_title(&self, title: &str) -> &[usize] {
        self.by_title
            .get(title)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// First item (in catalog order) with exactly this title
    pub fn first_by_title(&self, title: &str) -> Option<&Item> {
        self.positions_of_title(title)
            .first()
            .map(|&p| &self.items[p])
    }

    pub fn title_of(&self, id: ItemId) -> Option<&str> {
        self.get_item(id).map(|item| item.title.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Rating Store
// =============================================================================

/// Immutable-after-load table of ratings, in file order.
#[derive(Debug, Default, Clone)]
pub struct RatingStore {
    pub(crate) ratings: Vec<Rating>,
    /// Positions in `ratings` for each user
    pub(crate) user_ratings: HashMap<UserId, Vec<usize>>,
    /// Users in order of their first rating
    pub(crate) users: Vec<UserId>,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let mut store = Self::new();
        for rating in ratings {
            store.insert_rating(rating);
        }
        store
    }

    /// Append a rating and update the per-user index
    pub fn insert_rating(&mut self, rating: Rating) {
        let position = self.ratings.len();
        let positions = self.user_ratings.entry(rating.user_id).or_default();
        if positions.is_empty() {
            self.users.push(rating.user_id);
        }
        positions.push(position);
        self.ratings.push(rating);
    }

    /// All ratings in file order
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    /// All ratings made by a user, in file order
    pub fn get_user_ratings(&self, user_id: UserId) -> Vec<&Rating> {
        self.user_ratings
            .get(&user_id)
            .map(|positions| positions.iter().map(|&p| &self.ratings[p]).collect())
            .unwrap_or_default()
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.user_ratings.contains_key(&user_id)
    }

    /// Distinct users in order of first appearance
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn max_user_id(&self) -> Option<UserId> {
        self.users.iter().copied().max()
    }

    /// Every rating belonging to any of `users`, in file order.
    ///
    /// Returns an owned copy so callers can extend it without touching the store.
    pub fn ratings_of_users(&self, users: &HashSet<UserId>) -> Vec<Rating> {
        self.ratings
            .iter()
            .filter(|r| users.contains(&r.user_id))
            .copied()
            .collect()
    }

    /// Restrict the store to users who rated at least one of `items`.
    ///
    /// All ratings of those users are kept, not just the ones on `items`.
    pub fn for_users_who_rated(&self, items: &HashSet<ItemId>) -> RatingStore {
        let users: HashSet<UserId> = self
            .ratings
            .iter()
            .filter(|r| items.contains(&r.item_id))
            .map(|r| r.user_id)
            .collect();
        RatingStore::from_ratings(self.ratings_of_users(&users))
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}

// =============================================================================
// DataIndex - both stores loaded together
// =============================================================================

/// The pair of stores produced by a single load
#[derive(Debug, Default)]
pub struct DataIndex {
    pub catalog: CatalogStore,
    pub ratings: RatingStore,
}

impl DataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// (items, distinct users, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.catalog.len(),
            self.ratings.users().len(),
            self.ratings.len(),
        )
    }

    /// Split into the two stores
    pub fn into_stores(self) -> (CatalogStore, RatingStore) {
        (self.catalog, self.ratings)
    }
}
