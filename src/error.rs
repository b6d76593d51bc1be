use thiserror::Error;

/// Failures of the document operations in [`crate::pdf`].
#[derive(Error, Debug)]
pub enum EditError {
    #[error("Failed to parse PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Page {page} is out of range (1-{total})")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("No pages specified")]
    NoPages,

    #[error("Please select at least one page to keep")]
    NothingToKeep,

    #[error("Rotation must be a multiple of 90 degrees, got {0}")]
    InvalidRotation(i64),

    #[error("Invalid page order: {0}")]
    InvalidOrder(String),

    #[error("Unknown color: {0}")]
    InvalidColor(String),

    #[error("Malformed PDF structure: {0}")]
    Malformed(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type EditResult<T> = Result<T, EditError>;
