use thiserror::Error;

use crate::database::repo::StoreError;

/// Upload rejections. The display text is the client-facing message.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No image file provided")]
    MissingImage,
    #[error("Missing title, description, or tags")]
    MissingFields,
    #[error("No selected file")]
    EmptyFilename,
    #[error("Invalid image file type")]
    InvalidFileType,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Item not found")]
    NotFound,
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
    #[error("upload directory failure: {0}")]
    Io(#[from] std::io::Error),
}
