//! Candidate and request types shared by the sources and the filter pipeline.

use data_loader::ItemId;

/// Number of seed items a request carries
pub const SEED_COUNT: usize = 3;

/// Which strategy produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    /// Text similarity over item feature text
    Content,
    /// Votes of users similar to the virtual user
    Collaborative,
}

/// Strategy-specific detail kept alongside a candidate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateMetadata {
    /// Index of the seed whose similarity row produced this entry
    pub seed_position: Option<usize>,
    /// Number of neighbours whose favourite set contains the item
    pub neighbor_votes: Option<u32>,
}

/// A recommendable item with the score its source assigned
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub item_id: ItemId,
    pub source: CandidateSource,
    pub base_score: f64,
    pub metadata: CandidateMetadata,
}

impl Candidate {
    pub fn new(item_id: ItemId, source: CandidateSource, base_score: f64) -> Self {
        Self {
            item_id,
            source,
            base_score,
            metadata: CandidateMetadata::default(),
        }
    }
}

/// The three seed items of one request, resolved to catalog ids.
///
/// `seed_titles[i]` is the title the caller supplied for `seed_items[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedContext {
    pub seed_items: [ItemId; SEED_COUNT],
    pub seed_titles: [String; SEED_COUNT],
}

impl SeedContext {
    pub fn new(seed_items: [ItemId; SEED_COUNT], seed_titles: [String; SEED_COUNT]) -> Self {
        Self {
            seed_items,
            seed_titles,
        }
    }

    /// Whether `item_id` is one of the seeds
    pub fn is_seed(&self, item_id: ItemId) -> bool {
        self.seed_items.contains(&item_id)
    }

    /// Whether `title` equals one of the supplied seed titles
    pub fn is_seed_title(&self, title: &str) -> bool {
        self.seed_titles.iter().any(|t| t == title)
    }
}
