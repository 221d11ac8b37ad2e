//! View pipeline: filter, then sort, then paginate.
//!
//! Every function here is pure and re-derives its output from the row store,
//! the schema and the query state. Nothing is cached between calls.

use std::cmp::Ordering;

use serde::Serialize;

use crate::query::{QueryState, SortDirection};
use crate::rows::{Row, RowStore};
use crate::schema::SchemaRegistry;
use crate::types::CellValue;

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Keep rows where any visible column's value contains `search_text`,
/// case-insensitively. An empty search keeps every row in store order.
pub fn filter_rows<'a>(rows: &'a [Row], schema: &SchemaRegistry, search_text: &str) -> Vec<&'a Row> {
    if search_text.is_empty() {
        return rows.iter().collect();
    }

    let needle = search_text.to_lowercase();
    let visible = schema.list_visible();

    rows.iter()
        .filter(|row| {
            visible.iter().any(|column| match row.get(&column.id) {
                Some(value) if !value.is_empty() => {
                    value.to_string().to_lowercase().contains(&needle)
                }
                _ => false,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sort
// ---------------------------------------------------------------------------

/// Compare two defined values in ascending order.
///
/// Two numbers compare numerically and two texts compare lexicographically.
/// A number against a text always orders the number first so the relation
/// stays transitive.
pub fn compare_values(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.total_cmp(y),
        (CellValue::Text(x), CellValue::Text(y)) => x.cmp(y),
        (CellValue::Number(_), CellValue::Text(_)) => Ordering::Less,
        (CellValue::Text(_), CellValue::Number(_)) => Ordering::Greater,
    }
}

/// Compare two rows on one column. Undefined values sort last in both
/// directions; the direction only flips the order of defined values.
pub fn compare_rows(a: &Row, b: &Row, column_id: &str, direction: SortDirection) -> Ordering {
    match (a.get(column_id), b.get(column_id)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ordering = compare_values(x, y);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}

/// Stable sort: rows that compare equal keep their filter order.
pub fn sort_rows(rows: &mut [&Row], column_id: Option<&str>, direction: SortDirection) {
    if let Some(column_id) = column_id {
        rows.sort_by(|a, b| compare_rows(a, b, column_id, direction));
    }
}

// ---------------------------------------------------------------------------
// Paginate
// ---------------------------------------------------------------------------

/// The slice `[page_index * page_size, page_index * page_size + page_size)`,
/// clipped to the input. Out-of-range pages are empty.
pub fn paginate<'a, T>(items: &'a [T], page_index: usize, page_size: usize) -> &'a [T] {
    let start = page_index.saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `total` rows. Never less than one.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    total.div_ceil(page_size).max(1)
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Filtered and sorted rows, full length. Export and total counts use this.
pub fn visible_rows<'a>(
    store: &'a RowStore,
    schema: &SchemaRegistry,
    query: &QueryState,
) -> Vec<&'a Row> {
    let mut rows = filter_rows(store.rows(), schema, query.search_text());
    sort_rows(&mut rows, query.sort_column_id(), query.sort_direction());
    rows
}

/// The rows on the current page.
pub fn current_page<'a>(
    store: &'a RowStore,
    schema: &SchemaRegistry,
    query: &QueryState,
) -> Vec<&'a Row> {
    let rows = visible_rows(store, schema, query);
    paginate(&rows, query.page_index(), query.page_size()).to_vec()
}

/// A rendered page with the counts the presentation layer needs.
#[derive(Debug, Clone, Serialize)]
pub struct PageView<'a> {
    pub rows: Vec<&'a Row>,
    pub total_count: usize,
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
}

pub fn page_view<'a>(
    store: &'a RowStore,
    schema: &SchemaRegistry,
    query: &QueryState,
) -> PageView<'a> {
    let all = visible_rows(store, schema, query);
    let total_count = all.len();
    PageView {
        rows: paginate(&all, query.page_index(), query.page_size()).to_vec(),
        total_count,
        page_index: query.page_index(),
        page_size: query.page_size(),
        page_count: page_count(total_count, query.page_size()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldMap;

    fn row(id: &str, pairs: &[(&str, CellValue)]) -> Row {
        let fields: FieldMap = pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        Row::new(id, fields)
    }

    fn ids(rows: &[&Row]) -> Vec<String> {
        rows.iter().map(|r| r.id.clone()).collect()
    }

    // -- filter --------------------------------------------------------------

    #[test]
    fn empty_search_keeps_everything_in_order() {
        let store = RowStore::seeded();
        let schema = SchemaRegistry::with_defaults();
        let rows = filter_rows(store.rows(), &schema, "");
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].id, "1");
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let store = RowStore::seeded();
        let schema = SchemaRegistry::with_defaults();
        let rows = filter_rows(store.rows(), &schema, "DESIGN");
        assert_eq!(ids(&rows), ["2", "6", "10"]);
    }

    #[test]
    fn search_matches_number_string_form() {
        let store = RowStore::seeded();
        let schema = SchemaRegistry::with_defaults();
        let rows = filter_rows(store.rows(), &schema, "35");
        assert_eq!(ids(&rows), ["3"]);
    }

    #[test]
    fn hidden_columns_do_not_match() {
        let store = RowStore::seeded();
        let mut schema = SchemaRegistry::with_defaults();
        schema.toggle_visibility("location").unwrap();
        assert!(filter_rows(store.rows(), &schema, "Seattle").is_empty());
    }

    #[test]
    fn fields_outside_schema_do_not_match() {
        let rows = vec![row("a", &[("nickname", CellValue::text("Ace"))])];
        let schema = SchemaRegistry::with_defaults();
        assert!(filter_rows(&rows, &schema, "ace").is_empty());
    }

    // -- sort ----------------------------------------------------------------

    #[test]
    fn numbers_sort_numerically() {
        let rows = vec![
            row("a", &[("age", CellValue::Number(10.0))]),
            row("b", &[("age", CellValue::Number(9.0))]),
            row("c", &[("age", CellValue::Number(100.0))]),
        ];
        let mut refs: Vec<&Row> = rows.iter().collect();
        sort_rows(&mut refs, Some("age"), SortDirection::Asc);
        assert_eq!(ids(&refs), ["b", "a", "c"]);
        sort_rows(&mut refs, Some("age"), SortDirection::Desc);
        assert_eq!(ids(&refs), ["c", "a", "b"]);
    }

    #[test]
    fn undefined_sorts_last_in_both_directions() {
        let rows = vec![
            row("missing", &[]),
            row("b", &[("name", CellValue::text("Bea"))]),
            row("a", &[("name", CellValue::text("Abe"))]),
        ];
        let mut refs: Vec<&Row> = rows.iter().collect();
        sort_rows(&mut refs, Some("name"), SortDirection::Asc);
        assert_eq!(ids(&refs), ["a", "b", "missing"]);
        sort_rows(&mut refs, Some("name"), SortDirection::Desc);
        assert_eq!(ids(&refs), ["b", "a", "missing"]);
    }

    #[test]
    fn ties_keep_filter_order() {
        let rows = vec![
            row("first", &[("role", CellValue::text("Dev"))]),
            row("second", &[("role", CellValue::text("Dev"))]),
            row("third", &[("role", CellValue::text("Dev"))]),
        ];
        let mut refs: Vec<&Row> = rows.iter().collect();
        sort_rows(&mut refs, Some("role"), SortDirection::Desc);
        assert_eq!(ids(&refs), ["first", "second", "third"]);
    }

    #[test]
    fn no_sort_column_keeps_order() {
        let store = RowStore::seeded();
        let mut refs: Vec<&Row> = store.rows().iter().rev().collect();
        sort_rows(&mut refs, None, SortDirection::Desc);
        assert_eq!(refs[0].id, "12");
    }

    #[test]
    fn mixed_kinds_put_numbers_first() {
        assert_eq!(
            compare_values(&CellValue::Number(10.0), &CellValue::text("5")),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&CellValue::text("10"), &CellValue::text("9")),
            Ordering::Less
        );
    }

    // -- paginate ------------------------------------------------------------

    #[test]
    fn paginate_slices_and_clips() {
        let items: Vec<u32> = (0..12).collect();
        assert_eq!(paginate(&items, 0, 5), &[0, 1, 2, 3, 4]);
        assert_eq!(paginate(&items, 2, 5), &[10, 11]);
        assert!(paginate(&items, 3, 5).is_empty());
        assert!(paginate(&items, usize::MAX, 5).is_empty());
    }

    #[test]
    fn page_count_is_at_least_one() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(12, 10), 2);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 5), 3);
    }

    // -- pipeline ------------------------------------------------------------

    #[test]
    fn current_page_applies_filter_sort_and_page() {
        let store = RowStore::seeded();
        let schema = SchemaRegistry::with_defaults();
        let mut query = QueryState::new();
        query.set_search_text("engineering");
        query.toggle_sort(&schema, "age").unwrap();
        query.set_page_size(2).unwrap();

        let view = page_view(&store, &schema, &query);
        assert_eq!(view.total_count, 3);
        assert_eq!(view.page_count, 2);
        assert_eq!(ids(&view.rows), ["8", "5"]);

        query.set_page_index(1);
        assert_eq!(ids(&current_page(&store, &schema, &query)), ["1"]);
    }
}
