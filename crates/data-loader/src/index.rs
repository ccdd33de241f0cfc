//! DataIndex loading and validation.
//!
//! Parses the three input files in parallel, joins item metadata onto the
//! catalog and checks referential integrity of the ratings.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

impl DataIndex {
    /// Load the catalog and ratings from a directory.
    ///
    /// Expects `movies.csv` and `ratings.csv`; `imdb_data.csv` is optional and
    /// items without a metadata row keep empty optional fields.
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading dataset from {:?}", data_dir);

        let movies_path = data_dir.join("movies.csv");
        let metadata_path = data_dir.join("imdb_data.csv");
        let ratings_path = data_dir.join("ratings.csv");

        // Three-way parallel parse
        let ((items, metadata), ratings) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_movies(&movies_path),
                    || {
                        if metadata_path.exists() {
                            parser::parse_metadata(&metadata_path)
                        } else {
                            warn!("No metadata file at {:?}, continuing without it", metadata_path);
                            Ok(HashMap::new())
                        }
                    },
                )
            },
            || parser::parse_ratings(&ratings_path),
        );

        let mut items = items?;
        let metadata = metadata?;
        let ratings = ratings?;

        parser::attach_metadata(&mut items, &metadata);

        info!(
            "Loaded {} items ({} with metadata), {} ratings",
            items.len(),
            metadata.len(),
            ratings.len()
        );

        let index = DataIndex {
            catalog: CatalogStore::from_items(items),
            ratings: RatingStore::from_ratings(ratings),
        };
        index.validate()?;

        info!("DataIndex successfully built and validated");
        Ok(index)
    }

    /// Validate data integrity.
    ///
    /// Every rating must reference a catalog item and lie within [`RATING_SCALE`].
    pub fn validate(&self) -> Result<()> {
        let (low, high) = RATING_SCALE;
        let invalid = self.ratings.ratings().par_iter().find_first(|rating| {
            self.catalog.get_item(rating.item_id).is_none()
                || !(low..=high).contains(&rating.rating)
        });

        match invalid {
            None => Ok(()),
            Some(rating) if self.catalog.get_item(rating.item_id).is_none() => {
                Err(DataLoadError::MissingReference {
                    entity: "Item".to_string(),
                    id: rating.item_id,
                })
            }
            Some(rating) => Err(DataLoadError::InvalidValue {
                field: "rating".to_string(),
                value: rating.rating.to_string(),
            }),
        }
    }
}
