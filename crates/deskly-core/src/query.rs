// ── Query State ──
//
// User-controlled parameters that drive view derivation. Held in memory
// by a list controller, never persisted. Setters keep the invariants
// `page >= 1` and `page_size > 0`, and reset to the first page whenever
// the result set can change shape (search, filters, page size).

use std::collections::BTreeMap;

use deskly_api::SortOrder;
use serde::{Deserialize, Serialize};

/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Filter value meaning "no filter".
pub const FILTER_ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

impl From<SortDirection> for SortOrder {
    fn from(d: SortDirection) -> Self {
        match d {
            SortDirection::Ascending => Self::Asc,
            SortDirection::Descending => Self::Desc,
        }
    }
}

impl From<SortOrder> for SortDirection {
    fn from(o: SortOrder) -> Self {
        match o {
            SortOrder::Asc => Self::Ascending,
            SortOrder::Desc => Self::Descending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryState {
    search_term: String,
    filters: BTreeMap<String, Option<String>>,
    sort_key: Option<String>,
    sort_direction: SortDirection,
    page: u32,
    page_size: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            filters: BTreeMap::new(),
            sort_key: None,
            sort_direction: SortDirection::Ascending,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QueryState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Start sorted on `key`.
    pub fn with_sort(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_key = Some(key.into());
        self.sort_direction = direction;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn filters(&self) -> &BTreeMap<String, Option<String>> {
        &self.filters
    }

    /// Filters that actually constrain the result: set, non-empty, not `"all"`.
    pub fn active_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters.iter().filter_map(|(k, v)| match v.as_deref() {
            Some(v) if !v.is_empty() && v != FILTER_ALL => Some((k.as_str(), v)),
            _ => None,
        })
    }

    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key.as_deref()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term != self.search_term {
            self.search_term = term;
            self.page = 1;
        }
    }

    /// Set or clear one filter. `None` and `"all"` both mean unfiltered.
    pub fn set_filter(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        if self.filters.get(&key) != Some(&value) {
            self.filters.insert(key, value);
            self.page = 1;
        }
    }

    pub fn clear_filters(&mut self) {
        if !self.filters.is_empty() {
            self.filters.clear();
            self.page = 1;
        }
    }

    /// Column-header semantics: the active key flips direction, any other
    /// key becomes active in ascending order.
    pub fn sort_by(&mut self, key: impl Into<String>) {
        let key = key.into();
        if self.sort_key.as_deref() == Some(key.as_str()) {
            self.sort_direction = self.sort_direction.reversed();
        } else {
            self.sort_key = Some(key);
            self.sort_direction = SortDirection::Ascending;
        }
    }

    pub fn set_sort(&mut self, key: Option<String>, direction: SortDirection) {
        self.sort_key = key;
        self.sort_direction = direction;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        let page_size = page_size.max(1);
        if page_size != self.page_size {
            self.page_size = page_size;
            self.page = 1;
        }
    }
}
