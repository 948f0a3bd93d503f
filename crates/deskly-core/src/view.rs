// ── View derivation ──
//
// Pure function of (records, schema, query): search, then filter, then a
// stable sort, then slice the requested page. Nothing here mutates state,
// so deriving twice from the same inputs yields the same view.

use deskly_api::{Pagination, Record};
use serde::Serialize;

use crate::query::{QueryState, SortDirection};
use crate::schema::EntitySchema;

/// One page of display rows plus pagination metadata over the filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View<'a> {
    pub items: Vec<&'a Record>,
    pub pagination: Pagination,
}

impl View<'_> {
    /// Number of records matching search and filters, across all pages.
    pub fn total(&self) -> u64 {
        self.pagination.total
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Records passing search and every active filter, sorted. Unpaginated.
pub fn filter_and_sort<'a>(
    records: &'a [Record],
    schema: &EntitySchema,
    query: &QueryState,
) -> Vec<&'a Record> {
    let needle = query.search_term().to_lowercase();
    let rules: Vec<_> = query
        .active_filters()
        .map(|(key, value)| (schema.filter_rule(key), value))
        .collect();

    let mut rows: Vec<&Record> = records
        .iter()
        .filter(|r| schema.matches_search(r, &needle))
        .filter(|r| rules.iter().all(|(rule, value)| rule.matches(r, value)))
        .collect();

    if let Some(key) = query.sort_key() {
        let key = schema.sort_key(key);
        // `sort_by` is stable; descending flips the comparator so ties
        // keep their original relative order either way.
        match query.sort_direction() {
            SortDirection::Ascending => rows.sort_by(|a, b| key.compare(a, b)),
            SortDirection::Descending => rows.sort_by(|a, b| key.compare(b, a)),
        }
    }
    rows
}

pub fn derive_view<'a>(
    records: &'a [Record],
    schema: &EntitySchema,
    query: &QueryState,
) -> View<'a> {
    let rows = filter_and_sort(records, schema, query);
    let total = u64::try_from(rows.len()).unwrap_or(u64::MAX);
    let page = query.page();
    let size = query.page_size();

    let take = usize::try_from(size).unwrap_or(usize::MAX);
    let start = usize::try_from(page.saturating_sub(1))
        .unwrap_or(usize::MAX)
        .saturating_mul(take);
    let items: Vec<&Record> = rows.into_iter().skip(start).take(take).collect();

    View {
        items,
        pagination: Pagination::compute(total, page, size),
    }
}
