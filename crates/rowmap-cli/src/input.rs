//! Reading input rows

use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use clap::ValueEnum;
use rowmap_schema::FieldPath;
use serde_json::{Map, Value};
use tracing::debug;

/// Input file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Guess the format from the file extension
    pub fn detect(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(Self::Csv),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => bail!(
                "cannot tell the format of '{}'; pass --format csv|json",
                path.display()
            ),
        }
    }
}

/// Read every row of `path`
pub fn read_rows(path: &Path, format: Option<InputFormat>) -> anyhow::Result<Vec<Value>> {
    let format = match format {
        Some(format) => format,
        None => InputFormat::detect(path)?,
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read input '{}'", path.display()))?;

    let rows = match format {
        InputFormat::Csv => parse_csv(&text),
        InputFormat::Json => parse_json(&text),
    }
    .with_context(|| format!("invalid input '{}'", path.display()))?;

    debug!("Read {} row(s) from {}", rows.len(), path.display());
    Ok(rows)
}

/// One object per data line, keyed by header
///
/// Dotted headers such as `club.city` become nested objects. Cells are kept
/// as strings.
pub fn parse_csv(text: &str) -> anyhow::Result<Vec<Value>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers: Vec<(String, Option<FieldPath>)> = reader
        .headers()
        .context("failed to read CSV headers")?
        .iter()
        .map(|header| {
            let path = header
                .contains('.')
                .then(|| FieldPath::parse(header).ok())
                .flatten();
            (header.to_string(), path)
        })
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("bad CSV record {}", line + 1))?;
        let mut row = Value::Object(Map::new());
        for ((header, path), cell) in headers.iter().zip(record.iter()) {
            let cell = Value::String(cell.to_string());
            match path {
                Some(path) => path.set(&mut row, cell)?,
                None => {
                    if let Value::Object(map) = &mut row {
                        map.insert(header.clone(), cell);
                    }
                }
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

/// A JSON array of rows, or a single object treated as one row
pub fn parse_json(text: &str) -> anyhow::Result<Vec<Value>> {
    match serde_json::from_str(text)? {
        Value::Array(rows) => Ok(rows),
        row @ Value::Object(_) => Ok(vec![row]),
        other => bail!(
            "expected an array of rows or one object, found {}",
            rowmap_schema::value::type_name(&other)
        ),
    }
}
