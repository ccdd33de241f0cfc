use data_loader::ItemId;
use thiserror::Error;

/// Errors raised while generating candidates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// No user carries enough signal to act as a neighbour of the virtual user
    #[error("No users similar to the seed items were found")]
    EmptyCandidatePool,

    /// A seed item is not part of the indexed item subset
    #[error("Item {item_id} is not in the indexed item subset")]
    UnknownItem { item_id: ItemId },
}

pub type Result<T> = std::result::Result<T, SourceError>;
