use std::io::Read;
use std::path::{Path, PathBuf};

use crate::{
    error::{LoadError, LoadResult},
    models::{parse_score, Record, Table, TableKind},
};

use super::{Columns, TableSource};

/// Loads the table from a headered CSV file
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    columns: Columns,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>, columns: Columns) -> Self {
        Self {
            path: path.into(),
            columns,
        }
    }
}

#[async_trait::async_trait]
impl TableSource for CsvSource {
    async fn fetch(&self) -> LoadResult<Table> {
        let path = self.path.clone();
        let columns = self.columns.clone();
        tokio::task::spawn_blocking(move || read_csv(&path, &columns)).await?
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn kind(&self) -> TableKind {
        self.columns.kind()
    }
}

/// Reads a CSV file from disk
pub fn read_csv(path: &Path, columns: &Columns) -> LoadResult<Table> {
    let file = std::fs::File::open(path)?;
    parse_csv(file, columns)
}

/// Parses CSV data with a header row into a table.
///
/// Cells are decoded as UTF-8 and blank cells count as missing. Rows without
/// a label are skipped.
pub fn parse_csv<R: Read>(reader: R, columns: &Columns) -> LoadResult<Table> {
    // Short rows are kept; their missing trailing cells read as blank
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.byte_headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h == name.as_bytes())
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
    };

    let category_idx = columns.category.as_deref().map(find).transpose()?;
    let tag_idx = find(columns.tag.as_str())?;
    let label_idx = find(columns.label.as_str())?;
    let score_idx = find(columns.score.as_str())?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for row in reader.byte_records() {
        let row = row?;
        let cell = |idx: usize, column: &str| -> LoadResult<Option<String>> {
            decode_cell(row.get(idx).unwrap_or_default(), column)
        };

        let Some(label) = cell(label_idx, columns.label.as_str())? else {
            skipped += 1;
            continue;
        };

        let category = match (category_idx, columns.category.as_deref()) {
            (Some(idx), Some(column)) => cell(idx, column)?,
            _ => None,
        };
        let tag = cell(tag_idx, columns.tag.as_str())?;
        let score = cell(score_idx, columns.score.as_str())?
            .as_deref()
            .and_then(parse_score);

        records.push(Record {
            category,
            tag,
            label,
            score,
        });
    }

    if skipped > 0 {
        tracing::warn!(skipped, "Skipped CSV rows without a label");
    }

    Ok(Table::new(columns.kind(), records))
}

fn decode_cell(bytes: &[u8], column: &str) -> LoadResult<Option<String>> {
    if bytes.is_empty() {
        return Ok(None);
    }

    String::from_utf8(bytes.to_vec())
        .map(Some)
        .map_err(|source| LoadError::Decode {
            column: column.to_string(),
            source,
        })
}
