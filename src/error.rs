//! Error types for the mask codec and the batch pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the run-length codec itself. They never touch the filesystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed run-length encoding: {0}")]
    MalformedEncoding(String),

    #[error("invalid mask shape {width}x{height}: {reason}")]
    InvalidShape {
        width: usize,
        height: usize,
        reason: String,
    },
}

/// Errors produced while running a batch over files or tables.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The file is not in the recognized extension set; counted as a skip.
    #[error("unsupported file: {}", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A column requested by name is absent from the table header.
    #[error("column '{0}' not found in table header")]
    MissingColumn(String),

    /// An earlier row in the same table already targets this output file.
    #[error("output {} is already written by row {first_row}", .path.display())]
    DuplicateOutput { path: PathBuf, first_row: usize },

    #[error("row {row}: cannot parse shape from '{value}'")]
    InvalidShapeCell { row: usize, value: String },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
