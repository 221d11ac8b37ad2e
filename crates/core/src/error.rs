#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A column id that collides with another column, or a column whose id or
    /// label cannot be used at all.
    #[error("Column '{id}' rejected: {reason}")]
    DuplicateColumn { id: String, reason: &'static str },

    #[error("Row already exists: {0}")]
    DuplicateId(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Row is not being edited: {0}")]
    NotInEdit(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Malformed CSV: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Shorthand for a missing row.
    pub fn row_not_found(id: &str) -> Self {
        CoreError::NotFound {
            entity: "Row",
            id: id.to_string(),
        }
    }

    /// Shorthand for a column id that is already taken.
    pub fn column_exists(id: &str) -> Self {
        CoreError::DuplicateColumn {
            id: id.to_string(),
            reason: "id already exists",
        }
    }

    /// Shorthand for a missing column.
    pub fn column_not_found(id: &str) -> Self {
        CoreError::NotFound {
            entity: "Column",
            id: id.to_string(),
        }
    }
}
