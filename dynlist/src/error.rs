//! List error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ListError {
    #[error("cannot add null item into list view")]
    NullItem,

    #[error("cannot add duplicate item into list view (already at index {index})")]
    DuplicateItem { index: usize },

    #[error("item not found in list view")]
    ItemNotFound,

    #[error("index {index} out of range for list of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}
