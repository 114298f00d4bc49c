//! CSV report writer.
//!
//! Fields are quoted only when they contain the separator, a quote or a line
//! break; quotes inside a quoted field are doubled.

use crate::models::OutputRow;
use std::io::{self, Write};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const SEP: char = ',';

fn needs_quotes(field: &str) -> bool {
    field.contains(SEP) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write one CSV row to any writer.
pub fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{SEP}")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{cell}")?;
        }
    }
    writeln!(w)
}

/// The whole report, header row first.
pub fn render_report(rows: &[OutputRow]) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_row(&mut buf, &OutputRow::COLUMNS)?;
    for row in rows {
        write_row(&mut buf, &row.to_record())?;
    }
    Ok(buf)
}

/// Write the report for `rows` to `path`, replacing any existing file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = rows.len()))]
pub async fn write_report(path: &Path, rows: &[OutputRow]) -> io::Result<()> {
    let csv = render_report(rows)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, csv).await?;
    info!("Wrote report");
    Ok(())
}
