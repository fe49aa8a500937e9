//! Binary mask to run-length encoding converter
//!
//! This library converts directories of single-channel segmentation masks to CSV tables
//! of run-length encodings, and rebuilds mask images from such tables.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod rle;
pub mod table;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use config::{Args, Command};
pub use dispatch::{apply_batch, DispatchPolicy, Strategy, DEFAULT_PARALLEL_THRESHOLD};
pub use error::{CodecError, Error, Result};
pub use pipeline::{run_decode_batch, run_encode_batch, BatchReport};
pub use rle::{decode, encode};
pub use table::{ShapeColumns, TableColumns, TableRow};
pub use types::{BinaryMask, MaskShape, ProcessingStats, RunLengthRecord};
