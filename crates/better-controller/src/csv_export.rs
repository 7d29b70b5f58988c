// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! CSV export of JSON collections.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

use crate::error::{BetterControllerError, Result};
use crate::response::ControllerResponse;
use crate::turbo::humanize;

/// Options for [`send_csv`].
#[derive(Debug, Clone, PartialEq)]
pub struct CsvOptions {
    /// Attachment filename (default: `export.csv`).
    pub filename: String,
    /// Columns to export, in order. Detected from the first row when `None`.
    pub columns: Option<Vec<String>>,
    /// Header labels. Humanized column names when `None`.
    pub headers: Option<Vec<String>>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            filename: "export.csv".to_string(),
            columns: None,
            headers: None,
        }
    }
}

impl CsvOptions {
    /// Options with a filename.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    /// Restricts the export to these columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Overrides the header labels.
    pub fn with_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = Some(headers.into_iter().map(Into::into).collect());
        self
    }
}

/// Generates CSV text for a collection of JSON objects.
///
/// An empty collection yields an empty string.
///
/// # Errors
///
/// Returns [`BetterControllerError::CsvError`] when columns must be detected
/// and the first row is not an object.
pub fn generate_csv(collection: &[JsonValue], columns: Option<&[String]>, headers: Option<&[String]>) -> Result<String> {
    let Some(first) = collection.first() else {
        return Ok(String::new());
    };

    let columns: Vec<String> = match columns {
        Some(cols) => cols.to_vec(),
        None => first
            .as_object()
            .map(|obj| obj.keys().cloned().collect())
            .ok_or_else(|| BetterControllerError::CsvError("cannot detect columns: first row is not an object".to_string()))?,
    };

    let header_row: Vec<String> = match headers {
        Some(labels) => labels.to_vec(),
        None => columns.iter().map(|c| humanize(c)).collect(),
    };

    let mut out = String::new();
    write_row(&mut out, header_row.iter().map(String::as_str));
    for row in collection {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| row.get(col).map(format_cell).unwrap_or_default())
            .collect();
        write_row(&mut out, cells.iter().map(String::as_str));
    }
    Ok(out)
}

/// Builds a CSV download response.
///
/// # Errors
///
/// See [`generate_csv`].
pub fn send_csv(collection: &[JsonValue], options: &CsvOptions) -> Result<ControllerResponse> {
    let body = generate_csv(collection, options.columns.as_deref(), options.headers.as_deref())?;
    tracing::debug!(rows = collection.len(), filename = %options.filename, "sending csv");
    Ok(ControllerResponse::Data {
        status: 200,
        headers: Default::default(),
        content_type: "text/csv".to_string(),
        filename: Some(options.filename.clone()),
        body,
    })
}

/// Formats one cell value.
///
/// Timestamps become `YYYY-MM-DD HH:MM:SS`, dates `YYYY-MM-DD`, arrays are
/// comma-joined, objects are JSON-encoded and `null` is empty.
pub fn format_cell(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => format_string(s),
        JsonValue::Array(items) => items.iter().map(format_cell).collect::<Vec<_>>().join(","),
        JsonValue::Object(_) => value.to_string(),
        other => other.to_string(),
    }
}

fn format_string(s: &str) -> String {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return ts.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return ts.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    s.to_string()
}

fn write_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    let row: Vec<String> = cells.map(quote).collect();
    out.push_str(&row.join(","));
    out.push('\n');
}

fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
