//! Delimited result-table writer

use crate::error::Result;
use crate::types::ResultRow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Default output file name
pub const DEFAULT_OUTPUT: &str = "audioAnalyzed.tab";

/// Header of the file column
pub const FILE_COLUMN: &str = "File";

/// Write `rows` as a tab-delimited table under a header built from `aspects`
pub fn write_delimited<S: AsRef<str>>(path: &Path, aspects: &[S], rows: &[ResultRow]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_rows(&mut writer, aspects, rows)?;
    writer.flush()?;

    tracing::info!(
        path = %path.display(),
        row_count = rows.len(),
        "Result table written"
    );
    Ok(())
}

/// Write the header line and one line per row
pub fn write_rows<W: Write, S: AsRef<str>>(writer: &mut W, aspects: &[S], rows: &[ResultRow]) -> Result<()> {
    let header: Vec<&str> = std::iter::once(FILE_COLUMN)
        .chain(aspects.iter().map(|a| a.as_ref()))
        .collect();
    writeln!(writer, "{}", header.join("\t"))?;

    for row in rows {
        writeln!(writer, "{}", row.cells().join("\t"))?;
    }
    Ok(())
}
