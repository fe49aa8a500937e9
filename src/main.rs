use clap::Parser;

use log::{error, info};
use std::io::{Error as IoError, ErrorKind};
use std::path::Path;
use std::process::ExitCode;

use mask2rle::config::{DecodeArgs, EncodeArgs};
use mask2rle::pipeline::{default_decode_output, default_encode_output};
use mask2rle::{run_decode_batch, run_encode_batch, Args, Command};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let result = match &args.command {
        Command::Torle(encode) => torle(encode),
        Command::Fromrle(decode) => fromrle(decode),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn torle(args: &EncodeArgs) -> mask2rle::Result<()> {
    if !args.imdir.exists() {
        return Err(not_found("imdir", &args.imdir));
    }

    info!("Converting masks to RLE...");
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_encode_output(&args.imdir));
    let report = run_encode_batch(&args.imdir, &output, &args.dispatch.to_policy())?;
    if report.is_complete() {
        info!("Conversion process completed successfully.");
    }
    Ok(())
}

fn fromrle(args: &DecodeArgs) -> mask2rle::Result<()> {
    if !args.file.exists() {
        return Err(not_found("file", &args.file));
    }

    info!("Converting RLE to masks...");
    let outdir = args
        .outdir
        .clone()
        .unwrap_or_else(|| default_decode_output(&args.file));
    let report = run_decode_batch(
        &args.file,
        &args.to_columns(),
        &outdir,
        &args.dispatch.to_policy(),
    )?;
    if report.is_complete() {
        info!("Conversion process completed successfully.");
    }
    Ok(())
}

fn not_found(what: &str, path: &Path) -> mask2rle::Error {
    IoError::new(
        ErrorKind::NotFound,
        format!("The specified {} does not exist: {}", what, path.display()),
    )
    .into()
}
