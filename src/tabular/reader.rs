//! CSV import of desired rule rows.
//!
//! # Responsibilities
//! - Read records positionally through a `ColumnMap`
//! - Skip short or unreadable rows with a diagnostic instead of failing the run
//! - Fail only when the source itself cannot be opened

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{SyncError, SyncResult};
use crate::tabular::columns::ColumnMap;

/// One raw row of the import table, cells trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source.
    pub line: usize,
    pub listener_port: String,
    pub action_type: String,
    pub target_group_name: String,
    pub condition_field: String,
    pub condition_value: String,
}

/// A row that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    pub line: usize,
    pub reason: String,
}

/// Rows read from a table plus those that could not be read.
#[derive(Debug, Default)]
pub struct TableRead {
    pub rows: Vec<RawRow>,
    pub rejected: Vec<RowRejection>,
}

/// Open and read a CSV file.
///
/// An unopenable file is the one import failure that aborts the run.
pub fn read_path(path: &Path, columns: &ColumnMap) -> SyncResult<TableRead> {
    let file = File::open(path).map_err(|e| {
        SyncError::Tabular(format!("cannot open '{}': {}", path.display(), e))
    })?;
    read_rows(file, columns)
}

/// Read rows from any CSV source.
pub fn read_rows<R: Read>(source: R, columns: &ColumnMap) -> SyncResult<TableRead> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(columns.has_header)
        .flexible(true)
        .from_reader(source);

    let width = columns.required_width();
    let mut table = TableRead::default();

    for (idx, result) in reader.records().enumerate() {
        let fallback_line = idx + 1 + usize::from(columns.has_header);
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(line = fallback_line, error = %e, "Skipping unreadable row");
                table.rejected.push(RowRejection {
                    line: fallback_line,
                    reason: format!("unreadable row: {}", e),
                });
                continue;
            }
        };
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        if record.iter().all(|cell| cell.trim().is_empty()) {
            tracing::debug!(line, "Skipping blank row");
            continue;
        }

        if record.len() < width {
            tracing::warn!(line, cells = record.len(), required = width, "Skipping short row");
            table.rejected.push(RowRejection {
                line,
                reason: format!("row has {} cells, at least {} required", record.len(), width),
            });
            continue;
        }

        let cell = |i: usize| record.get(i).unwrap_or_default().trim().to_string();
        table.rows.push(RawRow {
            line,
            listener_port: cell(columns.listener_port),
            action_type: cell(columns.action_type),
            target_group_name: cell(columns.target_group_name),
            condition_field: cell(columns.condition_field),
            condition_value: cell(columns.condition_value),
        });
    }

    tracing::debug!(rows = table.rows.len(), rejected = table.rejected.len(), "Table read");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXPORT_CSV: &str = "\
Listener Port,Rule Priority,Rule ARN,Action Type,Target Group ARN,Target Group Name,Redirect URL,Condition Field,Condition Value
443,1,arn:r1,forward,arn:tg1,tg1,,host-header,a.com
443,2,arn:r2,forward,arn:tg1,tg1
,,,,,,,,
80,3,arn:r3,redirect,,,HTTPS://#{host}:443/#{path}?#{query},path-pattern, /old/*
";

    #[test]
    fn test_read_export_layout() {
        let table = read_rows(EXPORT_CSV.as_bytes(), &ColumnMap::export_layout()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].line, 2);
        assert_eq!(table.rows[0].target_group_name, "tg1");
        assert_eq!(table.rows[1].condition_value, "/old/*");

        assert_eq!(table.rejected.len(), 1);
        assert_eq!(table.rejected[0].line, 3);
    }

    #[test]
    fn test_read_compact_layout() {
        let csv = "port,priority,arn,action,tg,field,value\n80,,,forward,web,path-pattern,/api/*\n";
        let table = read_rows(csv.as_bytes(), &ColumnMap::compact_layout()).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].target_group_name, "web");
        assert_eq!(table.rows[0].condition_field, "path-pattern");
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = read_path(Path::new("/nonexistent/rules.csv"), &ColumnMap::default());
        assert!(matches!(result, Err(SyncError::Tabular(_))));
    }

    #[test]
    fn test_read_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXPORT_CSV.as_bytes()).unwrap();
        let table = read_path(file.path(), &ColumnMap::default()).unwrap();
        assert_eq!(table.rows.len(), 2);
    }
}
