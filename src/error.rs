//! Error handling for the role selector

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SelectorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid role catalog: {0}")]
    InvalidCatalog(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Template unavailable: {0}")]
    TemplateUnavailable(String),
}

pub type Result<T> = std::result::Result<T, SelectorError>;
