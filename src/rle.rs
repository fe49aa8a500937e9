//! Run-length codec for binary masks.
//!
//! Masks are linearized column by column (top to bottom, then left to right) and the
//! foreground runs are written as space separated `start length` pairs, where `start`
//! is 1-based. An all-background mask encodes to the empty string.

use std::iter;

use crate::error::CodecError;
use crate::types::{BinaryMask, MaskShape};

/// Encode a mask into its run-length text form
pub fn encode(mask: &BinaryMask) -> String {
    let mut rle = String::new();
    let mut previous = false;
    let mut run_start = 0usize;

    // A trailing background sentinel closes a run that touches the last pixel
    for (index, pixel) in mask.column_major().chain(iter::once(false)).enumerate() {
        if pixel == previous {
            continue;
        }
        let position = index + 1;
        if pixel {
            run_start = position;
        } else {
            if !rle.is_empty() {
                rle.push(' ');
            }
            rle.push_str(&format!("{} {}", run_start, position - run_start));
        }
        previous = pixel;
    }

    rle
}

/// Parse run-length text into 0-based half-open `[lo, hi)` ranges over the linearized mask.
pub fn parse_runs(rle: &str) -> Result<Vec<(usize, usize)>, CodecError> {
    let tokens = rle
        .split_whitespace()
        .map(|token| {
            token.parse::<i64>().map_err(|_| {
                CodecError::MalformedEncoding(format!("'{}' is not an integer", token))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if tokens.len() % 2 != 0 {
        return Err(CodecError::MalformedEncoding(format!(
            "expected an even number of tokens, found {}",
            tokens.len()
        )));
    }

    tokens
        .chunks_exact(2)
        .map(|pair| {
            let (start, length) = (pair[0], pair[1]);
            let lo = start.checked_sub(1).filter(|lo| *lo >= 0).ok_or_else(|| {
                CodecError::MalformedEncoding(format!("run start {} is below 1", start))
            })?;
            let hi = lo.checked_add(length).ok_or_else(|| {
                CodecError::MalformedEncoding(format!(
                    "run at {} with length {} overflows",
                    start, length
                ))
            })?;
            if lo > hi {
                return Err(CodecError::MalformedEncoding(format!(
                    "run at {} has negative length {}",
                    start, length
                )));
            }
            match (usize::try_from(lo), usize::try_from(hi)) {
                (Ok(lo), Ok(hi)) => Ok((lo, hi)),
                _ => Err(CodecError::MalformedEncoding(format!(
                    "run at {} is out of addressable range",
                    start
                ))),
            }
        })
        .collect()
}

/// Decode run-length text into a mask of the given `(width, height)` shape
pub fn decode(rle: &str, shape: MaskShape) -> Result<BinaryMask, CodecError> {
    let total = shape.validated_len()?;
    let runs = parse_runs(rle)?;

    let mut mask = BinaryMask::new(shape)?;
    for (lo, hi) in runs {
        if hi > total {
            return Err(CodecError::InvalidShape {
                width: shape.width,
                height: shape.height,
                reason: format!("run ends at {} past the last pixel {}", hi, total),
            });
        }
        // Linear index `col * height + row` holds pixel (row, col)
        for index in lo..hi {
            mask.set(index % shape.height, index / shape.height, true);
        }
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_three() -> BinaryMask {
        BinaryMask::from_rows(&[[false, false, true], [true, true, true]]).unwrap()
    }

    #[test]
    fn test_encode_runs_in_column_major_order() {
        assert_eq!(encode(&two_by_three()), "2 1 4 3");
    }

    #[test]
    fn test_decode_non_square_mask() {
        let mask = decode("2 1 4 3", MaskShape::new(3, 2)).unwrap();
        assert_eq!(mask, two_by_three());
        assert_eq!(mask.height(), 2);
        assert_eq!(mask.width(), 3);
    }

    #[test]
    fn test_swapped_shape_does_not_round_trip() {
        let mask = decode("2 1 4 3", MaskShape::new(2, 3)).unwrap();
        assert_ne!(mask, two_by_three());
    }

    #[test]
    fn test_empty_mask() {
        let shape = MaskShape::new(5, 4);
        let mask = BinaryMask::new(shape).unwrap();
        assert_eq!(encode(&mask), "");
        assert_eq!(decode("", shape).unwrap(), mask);
        assert_eq!(decode("   ", shape).unwrap(), mask);
    }

    #[test]
    fn test_full_mask() {
        let shape = MaskShape::new(3, 3);
        let mask = BinaryMask::from_pixels(3, 3, vec![true; 9]).unwrap();
        assert_eq!(encode(&mask), "1 9");
        assert_eq!(decode("1 9", shape).unwrap(), mask);
    }

    #[test]
    fn test_run_touching_last_pixel() {
        let mask = BinaryMask::from_rows(&[[false, true], [false, true]]).unwrap();
        assert_eq!(encode(&mask), "3 2");
    }

    #[test]
    fn test_odd_token_count_is_malformed() {
        let err = decode("2 1 4", MaskShape::new(3, 2)).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding(_)));
    }

    #[test]
    fn test_non_integer_token_is_malformed() {
        let err = decode("2 x", MaskShape::new(3, 2)).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding(_)));
        let err = decode("2.5 1", MaskShape::new(3, 2)).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding(_)));
    }

    #[test]
    fn test_negative_length_and_zero_start_are_malformed() {
        assert!(matches!(
            decode("3 -2", MaskShape::new(3, 2)),
            Err(CodecError::MalformedEncoding(_))
        ));
        assert!(matches!(
            decode("0 1", MaskShape::new(3, 2)),
            Err(CodecError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_extreme_integers_are_malformed() {
        for rle in [
            "2 9223372036854775807",
            "-9223372036854775808 1",
            "9223372036854775807 9223372036854775807",
            "1 1 2 -9223372036854775808",
        ] {
            assert!(
                matches!(
                    decode(rle, MaskShape::new(3, 2)),
                    Err(CodecError::MalformedEncoding(_))
                ),
                "{}",
                rle
            );
        }
        assert!(matches!(
            decode("1 99999999999999999999", MaskShape::new(3, 2)),
            Err(CodecError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_overflowing_shape_is_invalid() {
        assert!(matches!(
            decode("", MaskShape::new(1 << 32, 1 << 32)),
            Err(CodecError::InvalidShape { .. })
        ));
        assert!(matches!(
            decode("1 1", MaskShape::new(usize::MAX, usize::MAX)),
            Err(CodecError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_run_past_end_is_invalid_shape() {
        assert!(matches!(
            decode("5 3", MaskShape::new(3, 2)),
            Err(CodecError::InvalidShape { .. })
        ));
        assert!(matches!(
            decode("", MaskShape::new(0, 2)),
            Err(CodecError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_parse_runs_zero_based() {
        assert_eq!(parse_runs("2 1 4 3").unwrap(), vec![(1, 2), (3, 6)]);
        assert!(parse_runs("").unwrap().is_empty());
    }
}
