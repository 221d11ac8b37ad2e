//! CSV exporter.
//!
//! Serializes rows in the order given, restricted to the visible columns.
//! The header line uses column labels; values use their string form and
//! missing values are written as empty fields.

use serde::Serialize;

use crate::csv::format_line;
use crate::rows::Row;
use crate::schema::SchemaRegistry;

/// Filename offered to the user when none is configured.
pub const DEFAULT_EXPORT_FILENAME: &str = "table-data.csv";

/// Generated document plus the filename to suggest when saving it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    pub filename: String,
    pub content: String,
    pub row_count: usize,
}

/// Render `rows` as CSV text. Lines are joined with `\n` and there is no
/// trailing newline.
pub fn export_csv(rows: &[&Row], schema: &SchemaRegistry) -> String {
    let columns = schema.list_visible();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format_line(columns.iter().map(|c| c.label.as_str())));

    for row in rows {
        lines.push(format_line(columns.iter().map(|c| {
            row.get(&c.id).map(|v| v.to_string()).unwrap_or_default()
        })));
    }

    lines.join("\n")
}

pub fn export_document(rows: &[&Row], schema: &SchemaRegistry, filename: Option<&str>) -> ExportDocument {
    ExportDocument {
        filename: filename.unwrap_or(DEFAULT_EXPORT_FILENAME).to_string(),
        content: export_csv(rows, schema),
        row_count: rows.len(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
