use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use crate::dispatch::{DispatchPolicy, DEFAULT_PARALLEL_THRESHOLD};
use crate::table::{
    ShapeColumns, TableColumns, DEFAULT_NAME_COLUMN, DEFAULT_RLE_COLUMN, DEFAULT_SHAPE_COLUMN,
};

/// Command-line arguments for converting binary masks to RLE tables and back.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Convert a directory of mask images to a .csv file with RLE labels
    Torle(EncodeArgs),
    /// Convert RLE labels from a .csv file back to mask images
    Fromrle(DecodeArgs),
}

/// Options shared by both directions
#[derive(ClapArgs, Debug, Clone)]
pub struct DispatchArgs {
    /// Number of worker threads for large batches (defaults to the number of CPU cores)
    #[arg(long = "workers", value_parser = validate_positive)]
    pub workers: Option<usize>,

    /// Batch size at which processing switches from sequential to parallel
    #[arg(long = "parallel_threshold", default_value_t = DEFAULT_PARALLEL_THRESHOLD, value_parser = validate_positive)]
    pub parallel_threshold: usize,
}

impl DispatchArgs {
    pub fn to_policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            parallel_threshold: self.parallel_threshold,
            workers: self.workers,
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EncodeArgs {
    /// Directory with mask images to encode
    #[arg(long = "imdir")]
    pub imdir: PathBuf,

    /// Output .csv file (defaults to rle_of_<imdir name>.csv)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub dispatch: DispatchArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DecodeArgs {
    /// File with RLE labels
    #[arg(long = "file")]
    pub file: PathBuf,

    /// Column with run-length encodings
    #[arg(long = "colrle", default_value = DEFAULT_RLE_COLUMN)]
    pub colrle: String,

    /// Column with "<width> <height>" of each mask
    #[arg(long = "colsize", default_value = DEFAULT_SHAPE_COLUMN)]
    pub colsize: String,

    /// Column with mask width; use together with --colheight instead of --colsize
    #[arg(long = "colwidth", requires = "colheight")]
    pub colwidth: Option<String>,

    /// Column with mask height; use together with --colwidth instead of --colsize
    #[arg(long = "colheight", requires = "colwidth")]
    pub colheight: Option<String>,

    /// Column with the name of the corresponding image
    #[arg(long = "colimg", default_value = DEFAULT_NAME_COLUMN)]
    pub colimg: String,

    /// Directory for reconstructed masks (defaults to masks_of_<file stem> next to the file)
    #[arg(long = "outdir")]
    pub outdir: Option<PathBuf>,

    #[command(flatten)]
    pub dispatch: DispatchArgs,
}

impl DecodeArgs {
    pub fn to_columns(&self) -> TableColumns {
        let shape = match (&self.colwidth, &self.colheight) {
            (Some(width), Some(height)) => ShapeColumns::Split {
                width: width.clone(),
                height: height.clone(),
            },
            _ => ShapeColumns::Combined(self.colsize.clone()),
        };
        TableColumns {
            rle: self.colrle.clone(),
            shape,
            name: self.colimg.clone(),
        }
    }
}

// Validate that a count is at least 1
fn validate_positive(s: &str) -> Result<usize, String> {
    match usize::from_str(s) {
        Ok(val) if val >= 1 => Ok(val),
        _ => Err("value must be an integer >= 1".to_string()),
    }
}
