use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SplitError>;

#[derive(Debug, Error)]
pub enum SplitError {
    /// Template or source cannot be used at all; the batch does not start.
    #[error("Cannot open input {}: {reason}", path.display())]
    FatalInput { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Category '{category}' has no usable folder name ('{folder}')")]
    UnsafeFolder { category: String, folder: String },

    #[error("Category '{category}' shares folder '{folder}' with '{owner}'")]
    FolderClash {
        category: String,
        folder: String,
        owner: String,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl SplitError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SplitError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Cannot open workbook {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("Sheet '{0}' not found")]
    MissingSheet(String),

    #[error("Cannot write {sheet}!{address}: {reason}")]
    Write {
        sheet: String,
        address: String,
        reason: String,
    },

    #[error("Cannot save workbook {}: {reason}", path.display())]
    Save { path: PathBuf, reason: String },
}
