//! CSV export of projected rule rows.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{SyncError, SyncResult};
use crate::export::projector::ExportRow;

/// Fixed export header, in column order.
pub const EXPORT_HEADER: [&str; 9] = [
    "Listener Port",
    "Rule Priority",
    "Rule ARN",
    "Action Type",
    "Target Group ARN",
    "Target Group Name",
    "Redirect URL",
    "Condition Field",
    "Condition Value",
];

/// Write rows with the fixed header to any sink.
pub fn write_rows<W: Write>(sink: W, rows: &[ExportRow]) -> SyncResult<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(EXPORT_HEADER)?;
    for row in rows {
        writer.write_record(row.cells())?;
    }
    writer
        .flush()
        .map_err(|e| SyncError::Tabular(format!("failed to flush export: {}", e)))?;
    Ok(())
}

/// Create (or truncate) `path` and write the rows to it.
pub fn write_path(path: &Path, rows: &[ExportRow]) -> SyncResult<()> {
    let file = File::create(path).map_err(|e| {
        SyncError::Tabular(format!("cannot create '{}': {}", path.display(), e))
    })?;
    write_rows(file, rows)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "Export written");
    Ok(())
}
