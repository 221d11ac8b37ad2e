//! Edit session tracker.
//!
//! A row is in edit mode exactly when it has an entry in [`EditSessions`].
//! The entry holds a pending copy of the row's fields, initialized from the
//! committed values when editing begins. Edits touch only the pending copy
//! until the session is committed into the row store.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::CoreError;
use crate::rows::RowStore;
use crate::schema::SchemaRegistry;
use crate::types::{CellValue, FieldMap, RowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditState {
    Clean,
    Editing,
}

/// Pending field values for one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingEdit {
    pub fields: FieldMap,
}

/// Outcome of [`EditSessions::commit_all`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommitSummary {
    /// Rows whose pending values were written.
    pub committed: Vec<RowId>,
    /// Sessions dropped because their row no longer exists.
    pub missing: Vec<RowId>,
}

#[derive(Debug, Clone, Default)]
pub struct EditSessions {
    sessions: BTreeMap<RowId, PendingEdit>,
}

impl EditSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, row_id: &str) -> EditState {
        if self.sessions.contains_key(row_id) {
            EditState::Editing
        } else {
            EditState::Clean
        }
    }

    pub fn is_editing(&self, row_id: &str) -> bool {
        self.sessions.contains_key(row_id)
    }

    pub fn editing_ids(&self) -> Vec<&str> {
        self.sessions.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn pending(&self, row_id: &str) -> Option<&PendingEdit> {
        self.sessions.get(row_id)
    }

    /// Start editing a row. Calling it again for a row already in edit mode
    /// keeps the existing pending values.
    pub fn begin(&mut self, store: &RowStore, row_id: &str) -> Result<&PendingEdit, CoreError> {
        let row = store
            .get(row_id)
            .ok_or_else(|| CoreError::row_not_found(row_id))?;
        Ok(self
            .sessions
            .entry(row_id.to_string())
            .or_insert_with(|| PendingEdit {
                fields: row.fields.clone(),
            }))
    }

    /// Set one pending value. The committed row is not touched.
    pub fn edit_field(
        &mut self,
        row_id: &str,
        column_id: &str,
        value: CellValue,
    ) -> Result<(), CoreError> {
        let pending = self
            .sessions
            .get_mut(row_id)
            .ok_or_else(|| CoreError::NotInEdit(row_id.to_string()))?;
        pending.fields.insert(column_id.to_string(), value);
        Ok(())
    }

    /// Set one pending value from raw user input, converted by the column's
    /// data type. The column must exist and be editable.
    pub fn edit_field_input(
        &mut self,
        schema: &SchemaRegistry,
        row_id: &str,
        column_id: &str,
        raw: &str,
    ) -> Result<(), CoreError> {
        let column = schema
            .get(column_id)
            .ok_or_else(|| CoreError::column_not_found(column_id))?;
        if !column.editable {
            return Err(CoreError::Validation(format!(
                "column '{column_id}' is not editable"
            )));
        }
        self.edit_field(row_id, column_id, column.coerce_input(raw))
    }

    /// Write the pending values into the store and leave edit mode.
    ///
    /// If the row vanished in the meantime the session is still cleared and
    /// `NotFound` is returned.
    pub fn commit(&mut self, store: &mut RowStore, row_id: &str) -> Result<(), CoreError> {
        let pending = self
            .sessions
            .remove(row_id)
            .ok_or_else(|| CoreError::NotInEdit(row_id.to_string()))?;
        store.update(row_id, pending.fields)
    }

    /// Leave edit mode without writing. Returns whether a session existed.
    pub fn discard(&mut self, row_id: &str) -> bool {
        self.sessions.remove(row_id).is_some()
    }

    /// Commit every open session. Never fails, even with nothing to commit.
    pub fn commit_all(&mut self, store: &mut RowStore) -> CommitSummary {
        let mut summary = CommitSummary::default();
        for (row_id, pending) in std::mem::take(&mut self.sessions) {
            match store.update(&row_id, pending.fields) {
                Ok(()) => summary.committed.push(row_id),
                Err(_) => summary.missing.push(row_id),
            }
        }
        summary
    }

    /// Discard every open session and return how many there were.
    pub fn discard_all(&mut self) -> usize {
        let count = self.sessions.len();
        self.sessions.clear();
        count
    }

    /// The value to display for a cell: pending while editing, else committed.
    pub fn display_value<'a>(
        &'a self,
        store: &'a RowStore,
        row_id: &str,
        column_id: &str,
    ) -> Option<&'a CellValue> {
        match self.sessions.get(row_id) {
            Some(pending) => pending.fields.get(column_id),
            None => store.get(row_id).and_then(|row| row.get(column_id)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
