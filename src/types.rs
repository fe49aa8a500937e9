use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CodecError;

// Recognized mask file extensions, matched case-sensitively against the file name suffix
pub const IMG_FORMATS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".bmp", ".tiff"];

/// Returns true when `name` ends with one of the recognized mask extensions
pub fn has_image_extension(name: &str) -> bool {
    IMG_FORMATS.iter().any(|ext| name.ends_with(ext))
}

/// Mask dimensions in the order used by the run-length text form: width first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaskShape {
    pub width: usize,
    pub height: usize,
}

/// Largest number of pixels a single mask may cover
pub const MAX_MASK_PIXELS: usize = 1 << 30;

impl MaskShape {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered by the shape, or `None` on overflow
    pub fn checked_len(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }

    /// Pixel count of a shape a mask can be allocated and written for.
    ///
    /// Each side must lie in `1..=u32::MAX` and the area must not exceed `MAX_MASK_PIXELS`.
    pub fn validated_len(&self) -> Result<usize, CodecError> {
        let invalid = |reason: String| CodecError::InvalidShape {
            width: self.width,
            height: self.height,
            reason,
        };
        if self.width == 0 || self.height == 0 {
            return Err(invalid("mask dimensions must be at least 1".to_string()));
        }
        if self.width > u32::MAX as usize || self.height > u32::MAX as usize {
            return Err(invalid(format!("a side exceeds {}", u32::MAX)));
        }
        match self.checked_len() {
            Some(len) if len <= MAX_MASK_PIXELS => Ok(len),
            _ => Err(invalid(format!(
                "area exceeds the limit of {} pixels",
                MAX_MASK_PIXELS
            ))),
        }
    }
}

impl fmt::Display for MaskShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.width, self.height)
    }
}

/// A single-channel binary mask stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    height: usize,
    width: usize,
    pixels: Vec<bool>,
}

impl BinaryMask {
    /// All-background mask of the given shape
    pub fn new(shape: MaskShape) -> Result<Self, CodecError> {
        let len = shape.validated_len()?;
        Ok(Self {
            height: shape.height,
            width: shape.width,
            pixels: vec![false; len],
        })
    }

    /// Build a mask from row-major pixels. Fails when the buffer does not cover `height * width`.
    pub fn from_pixels(
        height: usize,
        width: usize,
        pixels: Vec<bool>,
    ) -> Result<Self, CodecError> {
        let len = MaskShape::new(width, height).validated_len()?;
        if pixels.len() != len {
            return Err(CodecError::InvalidShape {
                width,
                height,
                reason: format!("pixel buffer holds {} values", pixels.len()),
            });
        }
        Ok(Self {
            height,
            width,
            pixels,
        })
    }

    /// Build a mask from rows of booleans; all rows must have the same length.
    pub fn from_rows<R: AsRef<[bool]>>(rows: &[R]) -> Result<Self, CodecError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().len());
        let mut pixels = Vec::with_capacity(height * width);
        for row in rows {
            let row = row.as_ref();
            if row.len() != width {
                return Err(CodecError::InvalidShape {
                    width,
                    height,
                    reason: format!("ragged row of length {}", row.len()),
                });
            }
            pixels.extend_from_slice(row);
        }
        Self::from_pixels(height, width, pixels)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn shape(&self) -> MaskShape {
        MaskShape::new(self.width, self.height)
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.pixels[row * self.width + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        self.pixels[row * self.width + col] = value;
    }

    /// Row-major view of the pixels
    pub fn pixels(&self) -> &[bool] {
        &self.pixels
    }

    /// Iterate pixels column by column, top to bottom within each column
    pub fn column_major(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.width)
            .flat_map(move |col| (0..self.height).map(move |row| self.get(row, col)))
    }
}

// One row of the encoded table: image name, run-length text and mask shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLengthRecord {
    pub image_name: String,
    pub rle: String,
    #[serde(with = "shape_cell")]
    pub shape: MaskShape,
}

/// Serialize a `MaskShape` as the single text cell `"<width> <height>"`.
pub(crate) mod shape_cell {
    use super::MaskShape;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(shape: &MaskShape, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(shape)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MaskShape, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).ok_or_else(|| de::Error::custom(format!("invalid shape '{}'", text)))
    }

    /// Accepts `"3 2"`, `"3,2"`, `"(3, 2)"` and `"[3, 2]"`; the first number is always the width.
    pub fn parse(text: &str) -> Option<MaskShape> {
        let trimmed = text
            .trim()
            .trim_start_matches(['(', '['])
            .trim_end_matches([')', ']']);
        let mut numbers = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| token.parse::<usize>());
        match (numbers.next(), numbers.next(), numbers.next()) {
            (Some(Ok(width)), Some(Ok(height)), None) => Some(MaskShape::new(width, height)),
            _ => None,
        }
    }
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_items: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_unsupported: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_total(&mut self) {
        self.total_items += 1;
    }

    pub fn increment_succeeded(&mut self) {
        self.succeeded += 1;
    }

    pub fn increment_failed(&mut self) {
        self.failed += 1;
    }

    pub fn increment_skipped_unsupported(&mut self) {
        self.skipped_unsupported += 1;
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Total items processed: {}", self.total_items);
        log::info!("Succeeded: {}", self.succeeded);
        log::info!("Failed: {}", self.failed);
        if self.skipped_unsupported > 0 {
            log::warn!(
                "Skipped (unsupported file extension): {}",
                self.skipped_unsupported
            );
        }
        if self.failed > 0 {
            log::warn!("{} item(s) failed, see errors above", self.failed);
        }
    }
}
