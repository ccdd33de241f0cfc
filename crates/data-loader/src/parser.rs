//! Parsers for the flat input files.
//!
//! - movies.csv: movieId,title,genres
//! - imdb_data.csv: movieId,title_cast,director,runtime,budget,plot_keywords
//! - ratings.csv: userId,movieId,rating[,timestamp]
//!
//! Multi-valued columns (genres, cast, plot keywords) are pipe-separated.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct MovieRecord {
    #[serde(rename = "movieId")]
    movie_id: ItemId,
    title: Option<String>,
    genres: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImdbRecord {
    #[serde(rename = "movieId")]
    movie_id: ItemId,
    title_cast: Option<String>,
    director: Option<String>,
    plot_keywords: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: ItemId,
    rating: f32,
    #[serde(default)]
    timestamp: Option<i64>,
}

/// Extended metadata for one item, as read from imdb_data.csv
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemMetadata {
    pub cast: Option<Vec<String>>,
    pub plot_keywords: Option<Vec<String>>,
    pub director: Option<String>,
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Treat empty strings the same as absent values
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Split a pipe-separated field, dropping empty entries
///
/// Example: "Action|Adventure|Sci-Fi" -> ["Action", "Adventure", "Sci-Fi"]
pub fn split_pipe_list(s: &str) -> Vec<String> {
    s.split('|')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse movies.csv.
///
/// Rows with a missing title or genres are dropped, matching how the
/// catalog is cleaned before feature construction.
pub fn parse_movies(path: &Path) -> Result<Vec<Item>> {
    let mut reader = open_reader(path)?;
    let mut items = Vec::new();

    for result in reader.deserialize::<MovieRecord>() {
        let record = result?;
        let (Some(title), Some(genres)) = (non_empty(record.title), non_empty(record.genres))
        else {
            continue;
        };
        items.push(Item::new(record.movie_id, title, split_pipe_list(&genres)));
    }
    Ok(items)
}

/// Parse imdb_data.csv into a lookup by item id.
///
/// Later rows for the same id overwrite earlier ones.
pub fn parse_metadata(path: &Path) -> Result<HashMap<ItemId, ItemMetadata>> {
    let mut reader = open_reader(path)?;
    let mut metadata = HashMap::new();

    for result in reader.deserialize::<ImdbRecord>() {
        let record = result?;
        metadata.insert(
            record.movie_id,
            ItemMetadata {
                cast: non_empty(record.title_cast).map(|c| split_pipe_list(&c)),
                plot_keywords: non_empty(record.plot_keywords).map(|k| split_pipe_list(&k)),
                director: non_empty(record.director),
            },
        );
    }
    Ok(metadata)
}

/// Parse ratings.csv
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let mut reader = open_reader(path)?;
    let mut ratings = Vec::new();

    for (idx, result) in reader.deserialize::<RatingRecord>().enumerate() {
        let record = result?;
        if !record.rating.is_finite() {
            return Err(DataLoadError::ParseError {
                file: file_name(path),
                // header is line 1
                line: idx as u64 + 2,
                reason: format!("Invalid rating: {}", record.rating),
            });
        }
        ratings.push(Rating {
            user_id: record.user_id,
            item_id: record.movie_id,
            rating: record.rating,
            timestamp: record.timestamp,
        });
    }
    Ok(ratings)
}

/// Left-join metadata onto items by id. Items without metadata keep `None` fields.
pub fn attach_metadata(items: &mut [Item], metadata: &HashMap<ItemId, ItemMetadata>) {
    for item in items.iter_mut() {
        if let Some(meta) = metadata.get(&item.id) {
            item.cast = meta.cast.clone();
            item.plot_keywords = meta.plot_keywords.clone();
            item.director = meta.director.clone();
        }
    }
}
