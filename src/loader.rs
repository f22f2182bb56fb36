use crate::error::Result;
use crate::types::{Field, RawRow};
use csv::ReaderBuilder;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
}

/// JSON payloads come either bare or wrapped the way the API returns them.
///
/// Items stay untyped here so one malformed row is skipped and counted
/// instead of failing the whole file.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonRows {
    Bare(Vec<Value>),
    Envelope { items: Vec<Value> },
}

/// Load report rows from a `.json` or CSV file.
pub fn load_rows(path: &Path) -> Result<(Vec<RawRow>, LoadReport)> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let (rows, report) = if is_json {
        load_json(path)?
    } else {
        load_csv(path)?
    };
    info!(
        path = %path.display(),
        total = report.total_rows,
        loaded = report.loaded_rows,
        errors = report.parse_errors,
        "loaded report rows"
    );
    Ok((rows, report))
}

/// Every cell is copied as text. Columns that are not row fields are ignored.
pub fn load_csv(path: &Path) -> Result<(Vec<RawRow>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let fields: Vec<Option<Field>> = rdr
        .headers()?
        .iter()
        .map(|h| h.parse().ok())
        .collect();
    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut rows = Vec::new();

    for result in rdr.records() {
        total_rows += 1;
        match result {
            Ok(record) => {
                let mut row = RawRow::default();
                for (field, value) in fields.iter().zip(record.iter()) {
                    if let Some(field) = field {
                        row.set(*field, value);
                    }
                }
                rows.push(row);
            }
            Err(e) => {
                warn!(line = total_rows + 1, error = %e, "skipping unreadable row");
                parse_errors += 1;
            }
        }
    }

    let report = LoadReport {
        total_rows,
        loaded_rows: rows.len(),
        parse_errors,
    };
    Ok((rows, report))
}

pub fn load_json(path: &Path) -> Result<(Vec<RawRow>, LoadReport)> {
    let text = std::fs::read_to_string(path)?;
    let items = match serde_json::from_str::<JsonRows>(&text)? {
        JsonRows::Bare(items) | JsonRows::Envelope { items } => items,
    };
    let total_rows = items.len();
    let mut parse_errors = 0usize;
    let mut rows = Vec::with_capacity(total_rows);

    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<RawRow>(item) {
            Ok(r) => rows.push(r),
            Err(e) => {
                warn!(item = i, error = %e, "skipping unreadable row");
                parse_errors += 1;
            }
        }
    }

    let report = LoadReport {
        total_rows,
        loaded_rows: rows.len(),
        parse_errors,
    };
    Ok((rows, report))
}

/// One row key per line; blanks skipped, first occurrence wins.
pub fn load_row_keys(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_row_keys(&text))
}

pub fn parse_row_keys(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| seen.insert(l.to_string()))
        .map(str::to_string)
        .collect()
}
