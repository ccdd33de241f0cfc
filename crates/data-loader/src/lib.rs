//! # Data Loader Crate
//!
//! Loads and indexes the item catalog and the rating observations that the
//! recommenders read from.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Item, Rating, CatalogStore, RatingStore, DataIndex)
//! - **parser**: Parse the CSV input files into Rust structs
//! - **index**: Parallel loading and integrity validation
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("data"))?;
//! let (catalog, ratings) = index.into_stores();
//!
//! let item = catalog.first_by_title("Toy Story (1995)").unwrap();
//! println!("{} has {} genres", item.title, item.genres.len());
//! ```

pub mod error;
pub mod index;
pub mod parser;
pub mod types;

pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    ItemId,
    UserId,
    // Core types
    CatalogStore,
    DataIndex,
    Item,
    Rating,
    RatingStore,
    RATING_SCALE,
};
