//! CSV persistence for run-length records.

use csv::{ReaderBuilder, StringRecord, Writer};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{shape_cell, MaskShape, RunLengthRecord};

pub const DEFAULT_NAME_COLUMN: &str = "image_name";
pub const DEFAULT_RLE_COLUMN: &str = "rle";
pub const DEFAULT_SHAPE_COLUMN: &str = "shape";

/// Where a table keeps the mask dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeColumns {
    /// One cell holding `"<width> <height>"`
    Combined(String),
    /// Separate width and height cells
    Split { width: String, height: String },
}

/// Names of the columns read from an input table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumns {
    pub rle: String,
    pub shape: ShapeColumns,
    pub name: String,
}

impl Default for TableColumns {
    fn default() -> Self {
        Self {
            rle: DEFAULT_RLE_COLUMN.to_string(),
            shape: ShapeColumns::Combined(DEFAULT_SHAPE_COLUMN.to_string()),
            name: DEFAULT_NAME_COLUMN.to_string(),
        }
    }
}

/// A row ready for decoding. `rle` is `None` when the row carries no annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub image_name: String,
    pub rle: Option<String>,
    pub shape: MaskShape,
}

enum ShapeIndex {
    Combined(usize),
    Split { width: usize, height: usize },
}

struct ColumnIndex {
    rle: usize,
    shape: ShapeIndex,
    name: usize,
}

/// Write records in order, one row per image, with columns `image_name,rle,shape`.
pub fn write_records(path: &Path, records: &[RunLengthRecord]) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    if records.is_empty() {
        writer.write_record([DEFAULT_NAME_COLUMN, DEFAULT_RLE_COLUMN, DEFAULT_SHAPE_COLUMN])?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a table by column name.
///
/// A missing column fails the whole read. Rows that cannot be parsed are returned as
/// per-row errors so the caller can report them alongside the successful rows.
pub fn read_table(path: &Path, columns: &TableColumns) -> Result<Vec<Result<TableRow>>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let index = locate_columns(reader.headers()?, columns)?;

    let rows = reader
        .records()
        .enumerate()
        .map(|(row, record)| parse_row(row, &record?, &index))
        .collect();
    Ok(rows)
}

fn locate_columns(headers: &StringRecord, columns: &TableColumns) -> Result<ColumnIndex> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim() == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    };

    let shape = match &columns.shape {
        ShapeColumns::Combined(name) => ShapeIndex::Combined(find(name)?),
        ShapeColumns::Split { width, height } => ShapeIndex::Split {
            width: find(width)?,
            height: find(height)?,
        },
    };

    Ok(ColumnIndex {
        rle: find(&columns.rle)?,
        shape,
        name: find(&columns.name)?,
    })
}

fn parse_row(row: usize, record: &StringRecord, index: &ColumnIndex) -> Result<TableRow> {
    let cell = |i: usize| record.get(i).unwrap_or_default().trim();

    let shape = match index.shape {
        ShapeIndex::Combined(i) => shape_cell::parse(cell(i)),
        ShapeIndex::Split { width, height } => {
            match (cell(width).parse::<usize>(), cell(height).parse::<usize>()) {
                (Ok(w), Ok(h)) => Some(MaskShape::new(w, h)),
                _ => None,
            }
        }
    };
    let shape = shape.ok_or_else(|| Error::InvalidShapeCell {
        row,
        value: match index.shape {
            ShapeIndex::Combined(i) => cell(i).to_string(),
            ShapeIndex::Split { width, height } => format!("{} {}", cell(width), cell(height)),
        },
    })?;

    Ok(TableRow {
        image_name: cell(index.name).to_string(),
        rle: missing_as_none(cell(index.rle)),
        shape,
    })
}

/// Empty cells and the `nan` marker written by dataframe tools mean "no annotation".
fn missing_as_none(text: &str) -> Option<String> {
    if text.is_empty() || text.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_write_records_layout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("rle.csv");
        let records = vec![
            RunLengthRecord {
                image_name: "a.png".to_string(),
                rle: "2 1 4 3".to_string(),
                shape: MaskShape::new(3, 2),
            },
            RunLengthRecord {
                image_name: "b.png".to_string(),
                rle: String::new(),
                shape: MaskShape::new(4, 4),
            },
        ];
        write_records(&path, &records).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "image_name,rle,shape");
        assert_eq!(lines[1], "a.png,2 1 4 3,3 2");
        assert_eq!(lines[2], "b.png,,4 4");
    }

    #[test]
    fn test_read_table_missing_values_and_split_shape() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("in.csv");
        fs::write(&path, "name,mask,w,h\nx.png,1 2,2,2\ny.png,NaN,3,1\nz.png,,5,5\n").unwrap();

        let columns = TableColumns {
            rle: "mask".to_string(),
            shape: ShapeColumns::Split {
                width: "w".to_string(),
                height: "h".to_string(),
            },
            name: "name".to_string(),
        };
        let rows: Vec<TableRow> = read_table(&path, &columns)
            .unwrap()
            .into_iter()
            .map(|row| row.unwrap())
            .collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].rle.as_deref(), Some("1 2"));
        assert_eq!(rows[0].shape, MaskShape::new(2, 2));
        assert_eq!(rows[1].rle, None);
        assert_eq!(rows[1].shape, MaskShape::new(3, 1));
        assert_eq!(rows[2].rle, None);
    }

    #[test]
    fn test_read_table_missing_column_is_fatal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("in.csv");
        fs::write(&path, "image_name,rle\na.png,1 1\n").unwrap();

        let err = read_table(&path, &TableColumns::default()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "shape"));
    }

    #[test]
    fn test_read_table_bad_shape_is_per_row() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("in.csv");
        fs::write(&path, "image_name,rle,shape\na.png,1 1,2 2\nb.png,1 1,oops\n").unwrap();

        let rows = read_table(&path, &TableColumns::default()).unwrap();
        assert!(rows[0].is_ok());
        assert!(matches!(rows[1], Err(Error::InvalidShapeCell { row: 1, .. })));
    }
}
