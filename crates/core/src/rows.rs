//! Row store and new-row form validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::edit::EditSessions;
use crate::error::CoreError;
use crate::schema::{DataType, SchemaRegistry};
use crate::types::{parse_number, CellValue, FieldMap, RowId};

/// Pattern for email fields entered through the new-row form.
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// A table row. `fields` may hold keys for columns that are not in the
/// schema; those are kept but never displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub fields: FieldMap,
}

impl Row {
    pub fn new(id: impl Into<RowId>, fields: FieldMap) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Row with a fresh random id.
    pub fn with_random_id(fields: FieldMap) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), fields)
    }

    pub fn get(&self, column_id: &str) -> Option<&CellValue> {
        self.fields.get(column_id)
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RowStore {
    rows: Vec<Row>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the sample rows a fresh table starts with.
    pub fn seeded() -> Self {
        Self { rows: sample_rows() }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn insert(&mut self, row: Row) -> Result<(), CoreError> {
        if self.contains(&row.id) {
            return Err(CoreError::DuplicateId(row.id));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Merge `fields` into the row. Keys not present in `fields` are kept.
    pub fn update(&mut self, id: &str, fields: FieldMap) -> Result<(), CoreError> {
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| CoreError::row_not_found(id))?;
        row.fields.extend(fields);
        Ok(())
    }

    /// Remove a row, discarding its pending edit session in the same step.
    pub fn delete(&mut self, id: &str, edits: &mut EditSessions) -> Result<Row, CoreError> {
        let index = self
            .rows
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| CoreError::row_not_found(id))?;
        edits.discard(id);
        Ok(self.rows.remove(index))
    }

    /// Swap the whole collection. The store is unchanged if `rows` repeats an id.
    pub fn replace_all(&mut self, rows: Vec<Row>) -> Result<(), CoreError> {
        for (i, row) in rows.iter().enumerate() {
            if rows[..i].iter().any(|r| r.id == row.id) {
                return Err(CoreError::DuplicateId(row.id.clone()));
            }
        }
        self.rows = rows;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// New-row form validation
// ---------------------------------------------------------------------------

/// A single field problem in the new-row form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Check a new-row form against the editable columns of the schema.
///
/// Returns an empty vec when the form is acceptable.
pub fn validate_row_form(schema: &SchemaRegistry, fields: &FieldMap) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    for column in schema.list_editable() {
        let value = fields.get(&column.id);
        let present = value.is_some_and(|v| !v.to_string().trim().is_empty());

        if !present {
            if column.required {
                violations.push(FieldViolation {
                    field: column.id.clone(),
                    message: format!("{} is required", column.label),
                });
            }
            continue;
        }

        let Some(value) = value else { continue };
        match column.data_type {
            DataType::Email => {
                if !EMAIL_RE.is_match(&value.to_string()) {
                    violations.push(FieldViolation {
                        field: column.id.clone(),
                        message: "Invalid email address".to_string(),
                    });
                }
            }
            DataType::Number => {
                let numeric = match value {
                    CellValue::Number(n) => n.is_finite(),
                    CellValue::Text(s) => parse_number(s).is_some(),
                };
                if !numeric {
                    violations.push(FieldViolation {
                        field: column.id.clone(),
                        message: format!("{} must be a number", column.label),
                    });
                }
            }
            DataType::Text => {}
        }
    }

    violations
}

/// Normalize form input before insertion: number columns given as text are
/// converted to numbers, other values pass through.
pub fn coerce_row_form(schema: &SchemaRegistry, fields: FieldMap) -> FieldMap {
    fields
        .into_iter()
        .map(|(key, value)| {
            let value = match (schema.get(&key), &value) {
                (Some(column), CellValue::Text(raw)) if column.data_type == DataType::Number => {
                    column.coerce_input(raw)
                }
                _ => value,
            };
            (key, value)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sample data
// ---------------------------------------------------------------------------

/// The twelve sample rows, ids `"1"` through `"12"`.
pub fn sample_rows() -> Vec<Row> {
    const SAMPLE: [(&str, &str, i64, &str, &str, &str); 12] = [
        ("John Doe", "john@example.com", 30, "Developer", "Engineering", "New York"),
        ("Jane Smith", "jane@example.com", 28, "Designer", "Design", "San Francisco"),
        ("Mike Johnson", "mike@example.com", 35, "Manager", "Operations", "Chicago"),
        ("Sarah Wilson", "sarah@example.com", 32, "Analyst", "Finance", "Boston"),
        ("David Brown", "david@example.com", 29, "Developer", "Engineering", "Seattle"),
        ("Emily Davis", "emily@example.com", 31, "Designer", "Design", "Los Angeles"),
        ("Alex Thompson", "alex@example.com", 33, "Manager", "Marketing", "Miami"),
        ("Lisa Anderson", "lisa@example.com", 27, "Developer", "Engineering", "Austin"),
        ("Tom Wilson", "tom@example.com", 34, "Analyst", "Finance", "Denver"),
        ("Maria Garcia", "maria@example.com", 26, "Designer", "Design", "Portland"),
        ("Chris Lee", "chris@example.com", 36, "Manager", "Sales", "Phoenix"),
        ("Anna Taylor", "anna@example.com", 25, "Intern", "HR", "Atlanta"),
    ];

    SAMPLE
        .iter()
        .enumerate()
        .map(|(i, (name, email, age, role, department, location))| {
            let fields = FieldMap::from([
                ("name".to_string(), CellValue::from(*name)),
                ("email".to_string(), CellValue::from(*email)),
                ("age".to_string(), CellValue::from(*age)),
                ("role".to_string(), CellValue::from(*role)),
                ("department".to_string(), CellValue::from(*department)),
                ("location".to_string(), CellValue::from(*location)),
            ]);
            Row::new((i + 1).to_string(), fields)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
