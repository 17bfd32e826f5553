//! Tabular source and sink.
//!
//! # Data Flow
//! ```text
//! Import:  CSV file → reader.rs (ColumnMap, short-row diagnostics) → RawRow[]
//! Export:  ExportRow[] → writer.rs (fixed 9-column header) → CSV file
//! ```
//!
//! # Design Decisions
//! - Columns addressed by position, never by header name
//! - The default import layout equals the export layout so exports re-apply

pub mod columns;
pub mod reader;
pub mod writer;

pub use columns::ColumnMap;
pub use reader::{RawRow, RowRejection, TableRead};
