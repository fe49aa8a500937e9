use image::{DynamicImage, GrayImage, Luma};
use jwalk::WalkDir;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{has_image_extension, BinaryMask};

/// Value written for foreground pixels
pub const MASK_ON: u8 = u8::MAX;
pub const MASK_OFF: u8 = 0;

/// Files found directly inside a mask directory, split by extension support
#[derive(Debug, Default)]
pub struct DirectoryListing {
    pub masks: Vec<PathBuf>,
    pub unsupported: Vec<PathBuf>,
}

/// List regular files directly inside `dirname`, sorted by file name.
pub fn list_mask_files(dirname: &Path) -> Result<DirectoryListing> {
    // Surface a missing directory as an I/O error instead of an empty walk
    let metadata = fs::metadata(dirname)?;
    if !metadata.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a directory", dirname.display()),
        )));
    }

    let mut listing = DirectoryListing::default();
    for entry in WalkDir::new(dirname)
        .skip_hidden(false)
        .sort(true)
        .min_depth(1)
        .max_depth(1)
    {
        let entry = entry.map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let recognized = entry
            .file_name()
            .to_str()
            .is_some_and(has_image_extension);
        if recognized {
            listing.masks.push(path);
        } else {
            listing.unsupported.push(path);
        }
    }
    Ok(listing)
}

/// Read a mask image, converting to 8-bit luma and thresholding at 0.5.
pub fn read_mask(path: &Path) -> Result<BinaryMask> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    if !has_image_extension(file_name) {
        return Err(Error::UnsupportedFile(path.to_path_buf()));
    }

    let gray = image::open(path)?.to_luma8();
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    let pixels = gray.pixels().map(|Luma([v])| f32::from(*v) > 0.5).collect();
    Ok(BinaryMask::from_pixels(height, width, pixels)?)
}

/// Write a mask as an 8-bit grayscale image; the format follows the path's extension.
pub fn write_mask(mask: &BinaryMask, path: &Path) -> Result<()> {
    let gray = GrayImage::from_fn(mask.width() as u32, mask.height() as u32, |x, y| {
        if mask.get(y as usize, x as usize) {
            Luma([MASK_ON])
        } else {
            Luma([MASK_OFF])
        }
    });

    if path.extension().is_some_and(|ext| ext == "gif") {
        // The GIF encoder only takes RGB(A) buffers
        DynamicImage::ImageLuma8(gray).to_rgba8().save(path)?;
    } else {
        gray.save(path)?;
    }
    Ok(())
}

/// Output path for a mask named `image_name`; unrecognized names get a `.png` suffix.
pub fn mask_output_path(output_dir: &Path, image_name: &str) -> PathBuf {
    let sanitized = sanitize_filename::sanitize(image_name);
    if has_image_extension(&sanitized) {
        output_dir.join(sanitized)
    } else {
        output_dir.join(format!("{}.png", sanitized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_output_path() {
        let dir = Path::new("out");
        assert_eq!(mask_output_path(dir, "a.png"), dir.join("a.png"));
        assert_eq!(mask_output_path(dir, "a"), dir.join("a.png"));
        assert_eq!(mask_output_path(dir, "a.tif"), dir.join("a.tif.png"));
        assert_eq!(mask_output_path(dir, "sub/b.bmp"), dir.join("subb.bmp"));
    }

    #[test]
    fn test_write_then_read_thresholds() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("m.png");
        let mask = BinaryMask::from_rows(&[[true, false], [false, true], [true, true]]).unwrap();
        write_mask(&mask, &path).unwrap();
        assert_eq!(read_mask(&path).unwrap(), mask);
    }

    #[test]
    fn test_read_mask_rejects_unrecognized_extension() {
        let err = read_mask(Path::new("labels.csv")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFile(_)));
    }
}
