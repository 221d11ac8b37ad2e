//! Query state: search text, sort spec and page spec.
//!
//! Query state is never persisted. Changing the search text or the page size
//! moves back to the first page.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::schema::SchemaRegistry;

/// Rows per page on a fresh load.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page sizes offered to the presentation layer. Any positive size is accepted.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [5, 10, 25, 50];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryState {
    search_text: String,
    sort_column_id: Option<String>,
    sort_direction: SortDirection,
    page_index: usize,
    page_size: usize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            sort_column_id: None,
            sort_direction: SortDirection::Asc,
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh state with a custom page size.
    pub fn with_page_size(page_size: usize) -> Result<Self, CoreError> {
        let mut state = Self::default();
        state.set_page_size(page_size)?;
        Ok(state)
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn sort_column_id(&self) -> Option<&str> {
        self.sort_column_id.as_deref()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
        self.page_index = 0;
    }

    pub fn set_page_index(&mut self, page_index: usize) {
        self.page_index = page_index;
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), CoreError> {
        if page_size == 0 {
            return Err(CoreError::Validation("page size must be greater than 0".into()));
        }
        self.page_size = page_size;
        self.page_index = 0;
        Ok(())
    }

    /// Set or clear the sort column. The column must exist and be sortable.
    pub fn set_sort(
        &mut self,
        schema: &SchemaRegistry,
        column_id: Option<&str>,
        direction: SortDirection,
    ) -> Result<(), CoreError> {
        if let Some(id) = column_id {
            ensure_sortable(schema, id)?;
        }
        self.sort_column_id = column_id.map(str::to_string);
        self.sort_direction = direction;
        Ok(())
    }

    /// Ascending on first click, descending on the second, then ascending again.
    pub fn toggle_sort(&mut self, schema: &SchemaRegistry, column_id: &str) -> Result<(), CoreError> {
        ensure_sortable(schema, column_id)?;
        let direction = match (self.sort_column_id.as_deref(), self.sort_direction) {
            (Some(current), SortDirection::Asc) if current == column_id => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        self.sort_column_id = Some(column_id.to_string());
        self.sort_direction = direction;
        Ok(())
    }
}

fn ensure_sortable(schema: &SchemaRegistry, column_id: &str) -> Result<(), CoreError> {
    let column = schema
        .get(column_id)
        .ok_or_else(|| CoreError::column_not_found(column_id))?;
    if !column.sortable {
        return Err(CoreError::Validation(format!(
            "column '{column_id}' is not sortable"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
