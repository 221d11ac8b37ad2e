//! Column schema registry.
//!
//! The registry owns the ordered list of column definitions. Registry order
//! is the table header order and the CSV export column order. Column ids are
//! unique and immutable once created.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{parse_number, CellValue};

// ---------------------------------------------------------------------------
// Column definitions
// ---------------------------------------------------------------------------

/// The three primitive column kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Text,
    Number,
    Email,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Number => "number",
            DataType::Email => "email",
        }
    }
}

/// A column definition as held by the registry and persisted across loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub visible: bool,
    pub sortable: bool,
    pub editable: bool,
    #[serde(default)]
    pub required: bool,
}

impl Column {
    /// Convert raw user input into a value of this column's kind.
    ///
    /// Number columns take the parsed number, falling back to `0` when the
    /// input is not numeric. Text and email columns keep the input as-is.
    pub fn coerce_input(&self, raw: &str) -> CellValue {
        match self.data_type {
            DataType::Number => CellValue::Number(parse_number(raw).unwrap_or(0.0)),
            DataType::Text | DataType::Email => CellValue::text(raw),
        }
    }
}

/// Input for [`SchemaRegistry::add_column`]. The id is normalized before use.
#[derive(Debug, Clone, Deserialize)]
pub struct NewColumn {
    pub id: String,
    pub label: String,
    #[serde(default, rename = "type")]
    pub data_type: DataType,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default = "default_true")]
    pub editable: bool,
    #[serde(default)]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

impl NewColumn {
    /// A visible, sortable, editable, optional column.
    pub fn new(id: impl Into<String>, label: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            data_type,
            visible: true,
            sortable: true,
            editable: true,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Lower-case the input and collapse every whitespace run into `_`.
pub fn normalize_column_id(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.extend(c.to_lowercase());
            in_whitespace = false;
        }
    }
    out
}

/// The six columns a fresh table starts with.
pub fn default_columns() -> Vec<Column> {
    [
        ("name", "Name", DataType::Text, true),
        ("email", "Email", DataType::Email, true),
        ("age", "Age", DataType::Number, true),
        ("role", "Role", DataType::Text, true),
        ("department", "Department", DataType::Text, false),
        ("location", "Location", DataType::Text, false),
    ]
    .into_iter()
    .map(|(id, label, data_type, required)| Column {
        id: id.to_string(),
        label: label.to_string(),
        data_type,
        visible: true,
        sortable: true,
        editable: true,
        required,
    })
    .collect()
}

/// Empty ids and labels are rejected like duplicates.
fn check_column_names(id: &str, label: &str) -> Result<(), CoreError> {
    let reason = if id.is_empty() {
        "id must not be empty"
    } else if label.is_empty() {
        "label must not be empty"
    } else {
        return Ok(());
    };
    Err(CoreError::DuplicateColumn {
        id: id.to_string(),
        reason,
    })
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    columns: Vec<Column>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with [`default_columns`].
    pub fn with_defaults() -> Self {
        Self {
            columns: default_columns(),
        }
    }

    /// Build a registry from an existing column list, rejecting duplicate ids.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, CoreError> {
        let mut registry = Self::new();
        registry.set_columns(columns)?;
        Ok(registry)
    }

    /// Append a new column after normalizing its id.
    pub fn add_column(&mut self, def: NewColumn) -> Result<&Column, CoreError> {
        let id = normalize_column_id(&def.id);
        check_column_names(&id, &def.label)?;
        if self.get(&id).is_some() {
            return Err(CoreError::column_exists(&id));
        }

        self.columns.push(Column {
            id,
            label: def.label,
            data_type: def.data_type,
            visible: def.visible,
            sortable: def.sortable,
            editable: def.editable,
            required: def.required,
        });
        Ok(&self.columns[self.columns.len() - 1])
    }

    /// Flip `visible` for a column and return its new visibility.
    pub fn toggle_visibility(&mut self, id: &str) -> Result<bool, CoreError> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CoreError::column_not_found(id))?;
        column.visible = !column.visible;
        Ok(column.visible)
    }

    /// Replace the whole column list.
    ///
    /// Every column must pass the checks of [`add_column`](Self::add_column)
    /// with its id already in normalized form. Columns may be reordered,
    /// relabelled or appended, but an id that exists now must still be in the
    /// new list. The registry is untouched when anything is rejected.
    pub fn set_columns(&mut self, columns: Vec<Column>) -> Result<(), CoreError> {
        for (i, column) in columns.iter().enumerate() {
            check_column_names(&column.id, &column.label)?;
            if normalize_column_id(&column.id) != column.id {
                return Err(CoreError::DuplicateColumn {
                    id: column.id.clone(),
                    reason: "id is not normalized",
                });
            }
            if columns[..i].iter().any(|c| c.id == column.id) {
                return Err(CoreError::column_exists(&column.id));
            }
        }
        if let Some(dropped) = self
            .columns
            .iter()
            .find(|existing| !columns.iter().any(|c| c.id == existing.id))
        {
            return Err(CoreError::Validation(format!(
                "column '{}' cannot be renamed or removed",
                dropped.id
            )));
        }
        self.columns = columns;
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn get(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn list_visible(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.visible).collect()
    }

    pub fn list_editable(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.editable).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
