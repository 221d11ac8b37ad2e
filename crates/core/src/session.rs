//! The table session: one schema, one row store, one query state, one set of
//! edit sessions and one importer, owned together.
//!
//! Each component receives the others it needs as explicit arguments; the
//! session only wires them up and persists the schema after it changes.

use crate::edit::{CommitSummary, EditSessions, EditState};
use crate::error::CoreError;
use crate::exporter::{export_document, ExportDocument};
use crate::importer::{prepare_import, CsvImporter, ImportBatch, ImportOutcome, ImportTicket};
use crate::persist::{load_columns, save_columns, KeyValueStore};
use crate::query::{QueryState, SortDirection};
use crate::rows::{coerce_row_form, validate_row_form, FieldViolation, Row, RowStore};
use crate::schema::{Column, NewColumn, SchemaRegistry};
use crate::types::{CellValue, FieldMap};
use crate::view::{self, PageView};

pub struct TableSession {
    schema: SchemaRegistry,
    rows: RowStore,
    query: QueryState,
    edits: EditSessions,
    importer: CsvImporter,
    storage: Box<dyn KeyValueStore>,
}

impl std::fmt::Debug for TableSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableSession")
            .field("columns", &self.schema.columns().len())
            .field("rows", &self.rows.len())
            .field("editing", &self.edits.len())
            .finish()
    }
}

impl TableSession {
    /// Start a fresh session: columns from storage (or the defaults), sample
    /// rows, default query state.
    ///
    /// A stored column list that cannot be read is logged and replaced by
    /// the defaults.
    pub fn load(storage: Box<dyn KeyValueStore>, page_size: usize) -> Result<Self, CoreError> {
        let schema = match load_columns(storage.as_ref()) {
            Ok(Some(columns)) => match SchemaRegistry::from_columns(columns) {
                Ok(schema) => {
                    tracing::info!(columns = schema.columns().len(), "Restored column schema");
                    schema
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Stored column schema rejected, using defaults");
                    SchemaRegistry::with_defaults()
                }
            },
            Ok(None) => SchemaRegistry::with_defaults(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored column schema unreadable, using defaults");
                SchemaRegistry::with_defaults()
            }
        };

        Ok(Self {
            schema,
            rows: RowStore::seeded(),
            query: QueryState::with_page_size(page_size)?,
            edits: EditSessions::new(),
            importer: CsvImporter::new(),
            storage,
        })
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn edits(&self) -> &EditSessions {
        &self.edits
    }

    pub fn importer(&self) -> &CsvImporter {
        &self.importer
    }

    // -- schema --------------------------------------------------------------

    /// Apply `change` to a copy of the schema, persist it, then keep it.
    fn change_schema<T>(
        &mut self,
        change: impl FnOnce(&mut SchemaRegistry) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut next = self.schema.clone();
        let out = change(&mut next)?;
        save_columns(self.storage.as_mut(), next.columns())?;
        self.schema = next;
        Ok(out)
    }

    pub fn add_column(&mut self, def: NewColumn) -> Result<Column, CoreError> {
        let column = self.change_schema(|schema| schema.add_column(def).cloned())?;
        tracing::info!(column_id = %column.id, data_type = column.data_type.as_str(), "Column added");
        Ok(column)
    }

    pub fn toggle_visibility(&mut self, column_id: &str) -> Result<bool, CoreError> {
        let visible = self.change_schema(|schema| schema.toggle_visibility(column_id))?;
        tracing::debug!(column_id, visible, "Column visibility toggled");
        Ok(visible)
    }

    pub fn set_columns(&mut self, columns: Vec<Column>) -> Result<(), CoreError> {
        self.change_schema(|schema| schema.set_columns(columns))
    }

    // -- query ---------------------------------------------------------------

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.query.set_search_text(text);
    }

    pub fn set_page_index(&mut self, page_index: usize) {
        self.query.set_page_index(page_index);
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), CoreError> {
        self.query.set_page_size(page_size)
    }

    pub fn set_sort(&mut self, column_id: Option<&str>, direction: SortDirection) -> Result<(), CoreError> {
        self.query.set_sort(&self.schema, column_id, direction)
    }

    pub fn toggle_sort(&mut self, column_id: &str) -> Result<(), CoreError> {
        self.query.toggle_sort(&self.schema, column_id)
    }

    // -- view ----------------------------------------------------------------

    pub fn visible_rows(&self) -> Vec<&Row> {
        view::visible_rows(&self.rows, &self.schema, &self.query)
    }

    pub fn current_page(&self) -> Vec<&Row> {
        view::current_page(&self.rows, &self.schema, &self.query)
    }

    pub fn page_view(&self) -> PageView<'_> {
        view::page_view(&self.rows, &self.schema, &self.query)
    }

    pub fn total_count(&self) -> usize {
        self.visible_rows().len()
    }

    pub fn page_count(&self) -> usize {
        view::page_count(self.total_count(), self.query.page_size())
    }

    // -- rows ----------------------------------------------------------------

    /// Columns shown in the new-row form, in registry order.
    pub fn new_row_form(&self) -> Vec<&Column> {
        self.schema.list_editable()
    }

    pub fn validate_row_form(&self, fields: &FieldMap) -> Vec<FieldViolation> {
        validate_row_form(&self.schema, fields)
    }

    /// Validate a new-row form and insert it under a fresh id.
    pub fn create_row(&mut self, fields: FieldMap) -> Result<Row, CoreError> {
        let violations = self.validate_row_form(&fields);
        if !violations.is_empty() {
            let summary: Vec<String> = violations
                .iter()
                .map(|v| format!("{}: {}", v.field, v.message))
                .collect();
            return Err(CoreError::Validation(summary.join("; ")));
        }
        let row = Row::with_random_id(coerce_row_form(&self.schema, fields));
        self.rows.insert(row.clone())?;
        tracing::info!(row_id = %row.id, "Row created");
        Ok(row)
    }

    pub fn update_row(&mut self, row_id: &str, fields: FieldMap) -> Result<(), CoreError> {
        self.rows.update(row_id, fields)
    }

    /// Delete a row together with any pending edit for it.
    pub fn delete_row(&mut self, row_id: &str) -> Result<Row, CoreError> {
        let row = self.rows.delete(row_id, &mut self.edits)?;
        tracing::info!(row_id, "Row deleted");
        Ok(row)
    }

    // -- edits ---------------------------------------------------------------

    pub fn edit_state(&self, row_id: &str) -> EditState {
        self.edits.state(row_id)
    }

    pub fn begin_edit(&mut self, row_id: &str) -> Result<(), CoreError> {
        self.edits.begin(&self.rows, row_id)?;
        tracing::debug!(row_id, "Edit started");
        Ok(())
    }

    pub fn edit_field(&mut self, row_id: &str, column_id: &str, value: CellValue) -> Result<(), CoreError> {
        self.edits.edit_field(row_id, column_id, value)
    }

    pub fn edit_field_input(&mut self, row_id: &str, column_id: &str, raw: &str) -> Result<(), CoreError> {
        self.edits.edit_field_input(&self.schema, row_id, column_id, raw)
    }

    pub fn commit_edit(&mut self, row_id: &str) -> Result<(), CoreError> {
        self.edits.commit(&mut self.rows, row_id)?;
        tracing::info!(row_id, "Edit committed");
        Ok(())
    }

    /// Returns whether the row was being edited.
    pub fn discard_edit(&mut self, row_id: &str) -> bool {
        self.edits.discard(row_id)
    }

    pub fn commit_all(&mut self) -> CommitSummary {
        let summary = self.edits.commit_all(&mut self.rows);
        if !summary.missing.is_empty() {
            tracing::warn!(missing = ?summary.missing, "Dropped edits for rows that no longer exist");
        }
        tracing::info!(committed = summary.committed.len(), "All edits committed");
        summary
    }

    pub fn discard_all(&mut self) -> usize {
        let count = self.edits.discard_all();
        tracing::info!(discarded = count, "All edits discarded");
        count
    }

    /// Pending value while editing, committed value otherwise.
    pub fn cell_value(&self, row_id: &str, column_id: &str) -> Option<&CellValue> {
        self.edits.display_value(&self.rows, row_id, column_id)
    }

    // -- import / export -----------------------------------------------------

    /// Begin an import. The returned schema snapshot is what the file is
    /// validated against; validation can run without the session.
    pub fn start_import(&mut self) -> (ImportTicket, SchemaRegistry) {
        (self.importer.start(), self.schema.clone())
    }

    pub fn finish_import(&mut self, ticket: ImportTicket, batch: ImportBatch) -> Result<ImportOutcome, CoreError> {
        self.importer.finish(ticket, batch, &mut self.rows, &mut self.edits)
    }

    pub fn abandon_import(&mut self, ticket: ImportTicket) {
        self.importer.abandon(ticket);
    }

    pub fn reset_import(&mut self) {
        self.importer.reset();
    }

    /// Parse, validate and apply a CSV file in one call.
    pub fn import_csv(&mut self, bytes: &[u8]) -> Result<ImportOutcome, CoreError> {
        let ticket = self.importer.start();
        let batch = prepare_import(bytes, &self.schema);
        self.finish_import(ticket, batch)
    }

    /// Export the filtered, sorted rows (all pages) and visible columns.
    pub fn export(&self, filename: Option<&str>) -> ExportDocument {
        let rows = self.visible_rows();
        let document = export_document(&rows, &self.schema, filename);
        tracing::info!(row_count = document.row_count, filename = %document.filename, "CSV exported");
        document
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::persist::{FileStore, MemoryStore, COLUMNS_KEY};
    use crate::query::DEFAULT_PAGE_SIZE;
    use crate::schema::DataType;

    fn session() -> TableSession {
        TableSession::load(Box::new(MemoryStore::new()), DEFAULT_PAGE_SIZE).unwrap()
    }

    /// Key-value store whose writes always fail.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, CoreError> {
            Ok(None)
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), CoreError> {
            Err(CoreError::Storage("read-only".into()))
        }
        fn remove(&mut self, _key: &str) -> Result<(), CoreError> {
            Err(CoreError::Storage("read-only".into()))
        }
    }

    #[test]
    fn fresh_session_is_seeded() {
        let s = session();
        assert_eq!(s.schema().columns().len(), 6);
        assert_eq!(s.rows().len(), 12);
        assert_eq!(s.current_page().len(), 10);
        assert_eq!(s.page_count(), 2);
    }

    #[test]
    fn schema_changes_are_persisted_and_restored() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = FileStore::open(dir.path()).unwrap();
            let mut s = TableSession::load(Box::new(storage), 10).unwrap();
            s.add_column(NewColumn::new("Start Date", "Start Date", DataType::Text))
                .unwrap();
            s.toggle_visibility("email").unwrap();
            s.delete_row("1").unwrap();
        }

        let storage = FileStore::open(dir.path()).unwrap();
        assert!(storage.get(COLUMNS_KEY).unwrap().is_some());
        let s = TableSession::load(Box::new(storage), 10).unwrap();
        assert_eq!(s.schema().columns().len(), 7);
        assert_eq!(s.schema().columns()[6].id, "start_date");
        assert!(!s.schema().get("email").unwrap().visible);
        // Rows are never persisted.
        assert_eq!(s.rows().len(), 12);
    }

    #[test]
    fn failed_save_leaves_schema_unchanged() {
        let mut s = TableSession::load(Box::new(ReadOnlyStore), 10).unwrap();
        assert_matches!(s.toggle_visibility("age"), Err(CoreError::Storage(_)));
        assert!(s.schema().get("age").unwrap().visible);
    }

    #[test]
    fn corrupt_storage_falls_back_to_defaults() {
        let mut storage = MemoryStore::new();
        storage.set(COLUMNS_KEY, "garbage").unwrap();
        let s = TableSession::load(Box::new(storage), 10).unwrap();
        assert_eq!(s.schema().columns().len(), 6);
    }

    #[test]
    fn create_row_validates_then_inserts() {
        let mut s = session();
        let bad = FieldMap::from([("name".to_string(), CellValue::text("Solo"))]);
        assert_matches!(s.create_row(bad), Err(CoreError::Validation(_)));

        let good = FieldMap::from([
            ("name".to_string(), CellValue::text("Zed")),
            ("email".to_string(), CellValue::text("zed@example.com")),
            ("age".to_string(), CellValue::text("52")),
            ("role".to_string(), CellValue::text("Advisor")),
        ]);
        let row = s.create_row(good).unwrap();
        assert_eq!(s.rows().len(), 13);
        assert_eq!(s.rows().get(&row.id).unwrap().get("age"), Some(&CellValue::Number(52.0)));
    }

    #[test]
    fn delete_while_editing_drops_session() {
        let mut s = session();
        s.begin_edit("4").unwrap();
        s.delete_row("4").unwrap();
        assert_eq!(s.edit_state("4"), EditState::Clean);
        assert_matches!(s.commit_edit("4"), Err(CoreError::NotInEdit(_)));
    }

    #[test]
    fn cell_value_shows_pending_edit() {
        let mut s = session();
        s.begin_edit("1").unwrap();
        s.edit_field_input("1", "name", "Johnny").unwrap();
        assert_eq!(s.cell_value("1", "name"), Some(&CellValue::text("Johnny")));
        s.discard_edit("1");
        assert_eq!(s.cell_value("1", "name"), Some(&CellValue::text("John Doe")));
    }

    #[test]
    fn export_uses_filtered_sorted_rows_across_pages() {
        let mut s = session();
        s.set_page_size(5).unwrap();
        s.set_search_text("e");
        s.toggle_sort("age").unwrap();
        s.toggle_sort("age").unwrap();
        let doc = s.export(None);
        assert_eq!(doc.row_count, s.total_count());
        assert!(doc.row_count > 5);
        let second = doc.content.lines().nth(1).unwrap();
        assert!(second.starts_with("Chris Lee,"));
    }

    #[test]
    fn staged_import_commits_through_session() {
        let mut s = session();
        let (ticket, schema) = s.start_import();
        let batch = prepare_import(b"name,email,age,role\nAl,al@x.com,9,Kid\n", &schema);
        let outcome = s.finish_import(ticket, batch).unwrap();
        assert_eq!(outcome, ImportOutcome::Committed { row_count: 1 });
        assert_eq!(s.rows().len(), 1);
    }
}
