use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
            label
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Create the output directory if it is missing and return its path. Existing contents are kept.
pub fn ensure_output_directory(path: &Path) -> std::io::Result<PathBuf> {
    if !path.exists() {
        log::debug!("Creating output directory {:?}", path);
        fs::create_dir_all(path)?;
    }
    Ok(path.to_path_buf())
}

/// Final path component as a string, falling back to the full path for roots like `.`
pub fn dir_display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
