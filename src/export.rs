//! Spreadsheet export over the projector contract.
//!
//! The writer knows nothing about breakdowns beyond the file name: it
//! takes the projector's column schema and projected rows verbatim. Empty
//! cells stay empty (never zero) and CTR stays a fraction, exactly as the
//! projector produced it.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::models::Breakdown;
use crate::project::{Cell, Column, ProjectedRow};

#[derive(Debug, Clone, Default)]
pub struct ExportOptions<'a> {
    pub account_name: Option<&'a str>,
    pub start_date: Option<&'a str>,
    pub end_date: Option<&'a str>,
}

/// Write one breakdown's rows to a CSV file and return its path.
pub fn write_single(
    dir: &Path,
    breakdown: Breakdown,
    columns: &[Column],
    rows: &[ProjectedRow],
    opts: &ExportOptions<'_>,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name(breakdown, opts));
    debug!(path = %path.display(), rows = rows.len(), "writing export");

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(columns.iter().map(|c| c.header.as_str()))?;
    for row in rows {
        writer.write_record(columns.iter().map(|c| field(row.cell(&c.key))))?;
    }
    writer.flush()?;

    Ok(path)
}

/// Write several breakdowns in one call, one file per breakdown.
pub fn write_bundle(
    dir: &Path,
    sheets: &[(Breakdown, Vec<Column>, Vec<ProjectedRow>)],
    opts: &ExportOptions<'_>,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(sheets.len());
    for (breakdown, columns, rows) in sheets {
        paths.push(write_single(dir, *breakdown, columns, rows, opts)?);
    }
    Ok(paths)
}

fn field(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Number(n) => n.to_string(),
        Cell::Empty => String::new(),
    }
}

fn file_name(breakdown: Breakdown, opts: &ExportOptions<'_>) -> String {
    let account = sanitize(opts.account_name.unwrap_or(""));
    let start = sanitize(opts.start_date.unwrap_or(""));
    let end = sanitize(opts.end_date.unwrap_or(""));

    let mut name = String::from("RealizeReport-");
    if !account.is_empty() {
        name.push_str(&account);
        name.push('-');
    }
    name.push_str(breakdown.as_str());
    if !start.is_empty() && !end.is_empty() {
        name.push_str(&format!("-{start}_to_{end}"));
    }
    name.push_str(".csv");
    name
}

/// Collapse anything outside [A-Za-z0-9_-] into single underscores and
/// trim them from the ends.
fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last_was_sep = false;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    out.trim_matches('_').to_owned()
}
