//! CSV importer.
//!
//! An import is all-or-nothing. Every record is validated, every violation is
//! collected, and the row store is replaced only when no record has an error.
//! Parsing and validation ([`prepare_import`]) never touch the store, so a
//! caller may run them on another thread and drop the result without harm.
//!
//! Phases: `Idle -> Parsing -> Committed | HasErrors -> Idle`.

use serde::Serialize;

use crate::csv::{self, CsvTable};
use crate::edit::EditSessions;
use crate::error::CoreError;
use crate::rows::{Row, RowStore};
use crate::schema::{DataType, SchemaRegistry};
use crate::types::{parse_number, CellValue, FieldMap};

/// Row number and field used for whole-file failures.
pub const FILE_ERROR_ROW: usize = 0;
pub const FILE_ERROR_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// Field contract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    RequiredText,
    RequiredEmail,
    RequiredNumber,
    OptionalText,
}

/// Fields every import is checked against, in column order.
const CONTRACT: [(&str, Rule, &str); 6] = [
    ("name", Rule::RequiredText, "Name is required and must be text"),
    ("email", Rule::RequiredEmail, "Valid email is required"),
    ("age", Rule::RequiredNumber, "Age must be a valid number"),
    ("role", Rule::RequiredText, "Role is required and must be text"),
    ("department", Rule::OptionalText, ""),
    ("location", Rule::OptionalText, ""),
];

fn in_contract(column_id: &str) -> bool {
    CONTRACT.iter().any(|(id, _, _)| *id == column_id)
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One validation violation. `row` is 1-based; `0` marks a whole-file failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportError {
    pub row: usize,
    pub field: String,
    pub message: String,
}

impl ImportError {
    fn new(row: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// A failure of the file as a whole, reported at row `0`, field `"file"`.
    pub fn file(message: impl Into<String>) -> Self {
        Self::new(FILE_ERROR_ROW, FILE_ERROR_FIELD, message)
    }
}

/// Output of parsing and validating a file, before anything is committed.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportBatch {
    /// Every record passed; rows carry fresh ids.
    Valid(Vec<Row>),
    /// At least one violation; nothing may be committed.
    Invalid(Vec<ImportError>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
    Committed { row_count: usize },
    Rejected { errors: Vec<ImportError> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    #[default]
    Idle,
    Parsing,
    Committed,
    HasErrors,
}

// ---------------------------------------------------------------------------
// Parse + validate
// ---------------------------------------------------------------------------

/// Parse raw file bytes and validate every record against `schema`.
pub fn prepare_import(bytes: &[u8], schema: &SchemaRegistry) -> ImportBatch {
    match csv::parse_bytes(bytes) {
        Ok(table) => validate_table(&table, schema),
        Err(e) => ImportBatch::Invalid(vec![ImportError::file(format!(
            "Failed to parse CSV file: {e}"
        ))]),
    }
}

/// Locate the header for a column: its id first, then its label.
fn resolve_header(table: &CsvTable, schema: &SchemaRegistry, column_id: &str) -> Option<usize> {
    table.header_index(column_id).or_else(|| {
        schema
            .get(column_id)
            .and_then(|column| table.header_index(&column.label))
    })
}

/// Validate parsed records. The pass never stops early: all rows are checked
/// and all violations reported.
pub fn validate_table(table: &CsvTable, schema: &SchemaRegistry) -> ImportBatch {
    let contract: Vec<(&str, Rule, &str, Option<usize>)> = CONTRACT
        .iter()
        .map(|(id, rule, message)| (*id, *rule, *message, resolve_header(table, schema, id)))
        .collect();

    let extra: Vec<(&crate::schema::Column, usize)> = schema
        .columns()
        .iter()
        .filter(|column| !in_contract(&column.id))
        .filter_map(|column| resolve_header(table, schema, &column.id).map(|i| (column, i)))
        .collect();

    let mut errors = Vec::new();
    let mut rows = Vec::with_capacity(table.records.len());

    for (index, record) in table.records.iter().enumerate() {
        let row_number = index + 1;
        let errors_before = errors.len();
        let mut fields = FieldMap::new();
        let cell = |i: Option<usize>| i.and_then(|i| record.get(i)).map(|s| s.trim());

        for (id, rule, message, header) in &contract {
            let value = cell(*header).filter(|v| !v.is_empty());
            match (rule, value) {
                (Rule::OptionalText, Some(v)) => {
                    fields.insert(id.to_string(), CellValue::text(v));
                }
                (Rule::OptionalText, None) => {}
                (Rule::RequiredText, Some(v)) => {
                    fields.insert(id.to_string(), CellValue::text(v));
                }
                (Rule::RequiredEmail, Some(v)) if v.contains('@') => {
                    fields.insert(id.to_string(), CellValue::text(v));
                }
                (Rule::RequiredNumber, Some(v)) => match parse_number(v) {
                    Some(n) => {
                        fields.insert(id.to_string(), CellValue::Number(n));
                    }
                    None => errors.push(ImportError::new(row_number, id, *message)),
                },
                _ => errors.push(ImportError::new(row_number, id, *message)),
            }
        }

        for (column, header) in &extra {
            let value = cell(Some(*header)).filter(|v| !v.is_empty());
            let Some(v) = value else {
                if column.required {
                    errors.push(ImportError::new(
                        row_number,
                        &column.id,
                        format!("{} is required", column.label),
                    ));
                }
                continue;
            };
            match column.data_type {
                DataType::Number => match parse_number(v) {
                    Some(n) => {
                        fields.insert(column.id.clone(), CellValue::Number(n));
                    }
                    None => errors.push(ImportError::new(
                        row_number,
                        &column.id,
                        format!("{} must be a valid number", column.label),
                    )),
                },
                DataType::Email if !v.contains('@') => errors.push(ImportError::new(
                    row_number,
                    &column.id,
                    format!("{} must be a valid email", column.label),
                )),
                DataType::Email | DataType::Text => {
                    fields.insert(column.id.clone(), CellValue::text(v));
                }
            }
        }

        if errors.len() == errors_before {
            rows.push(Row::with_random_id(fields));
        }
    }

    if errors.is_empty() {
        ImportBatch::Valid(rows)
    } else {
        ImportBatch::Invalid(errors)
    }
}

// ---------------------------------------------------------------------------
// Importer state machine
// ---------------------------------------------------------------------------

/// Handle for one in-flight import. Starting a new import invalidates older
/// tickets, so an abandoned import can never commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportTicket(u64);

#[derive(Debug, Clone, Default)]
pub struct CsvImporter {
    phase: ImportPhase,
    active: Option<u64>,
    issued: u64,
    last_errors: Vec<ImportError>,
}

impl CsvImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ImportPhase {
        self.phase
    }

    /// Errors reported by the most recent rejected import.
    pub fn last_errors(&self) -> &[ImportError] {
        &self.last_errors
    }

    /// Enter `Parsing`. Any earlier unfinished import is superseded.
    pub fn start(&mut self) -> ImportTicket {
        self.issued += 1;
        self.active = Some(self.issued);
        self.phase = ImportPhase::Parsing;
        self.last_errors.clear();
        ImportTicket(self.issued)
    }

    /// Drop an in-flight import without touching any state but the phase.
    pub fn abandon(&mut self, ticket: ImportTicket) {
        if self.active == Some(ticket.0) {
            self.active = None;
            self.phase = ImportPhase::Idle;
        }
    }

    /// Back to `Idle` and forget the last result. An import still in flight
    /// is abandoned; its ticket can no longer commit.
    pub fn reset(&mut self) {
        if self.active.take().is_some() {
            tracing::debug!("In-flight CSV import abandoned by reset");
        }
        self.phase = ImportPhase::Idle;
        self.last_errors.clear();
    }

    /// Apply a prepared batch. A valid batch replaces the store and ends every
    /// edit session; an invalid one changes nothing but the phase.
    pub fn finish(
        &mut self,
        ticket: ImportTicket,
        batch: ImportBatch,
        store: &mut RowStore,
        edits: &mut EditSessions,
    ) -> Result<ImportOutcome, CoreError> {
        if self.active != Some(ticket.0) {
            return Err(CoreError::Conflict(
                "import was superseded or abandoned".into(),
            ));
        }
        self.active = None;

        match batch {
            ImportBatch::Valid(rows) => {
                let row_count = rows.len();
                if let Err(e) = store.replace_all(rows) {
                    self.phase = ImportPhase::Idle;
                    return Err(e);
                }
                let discarded = edits.discard_all();
                self.phase = ImportPhase::Committed;
                tracing::info!(row_count, discarded_edits = discarded, "CSV import committed");
                Ok(ImportOutcome::Committed { row_count })
            }
            ImportBatch::Invalid(errors) => {
                self.phase = ImportPhase::HasErrors;
                self.last_errors = errors.clone();
                tracing::info!(error_count = errors.len(), "CSV import rejected");
                Ok(ImportOutcome::Rejected { errors })
            }
        }
    }

    /// Parse, validate and apply in one step.
    pub fn import(
        &mut self,
        bytes: &[u8],
        schema: &SchemaRegistry,
        store: &mut RowStore,
        edits: &mut EditSessions,
    ) -> Result<ImportOutcome, CoreError> {
        let ticket = self.start();
        let batch = prepare_import(bytes, schema);
        self.finish(ticket, batch, store, edits)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
