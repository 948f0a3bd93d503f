// ── List query parameters ──
//
// Serialized onto the query string of `GET /{entity}` as
// `page`, `limit`, `search`, `sortBy`, `sortOrder`, plus one pair per filter.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Page size used when the caller does not set one.
pub const DEFAULT_LIMIT: u32 = 10;

/// Sort direction as the backend spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for a list request. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub filters: BTreeMap<String, String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: None,
            search: None,
            sort_by: None,
            sort_order: None,
            filters: BTreeMap::new(),
        }
    }
}

impl ListParams {
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn sort(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(key.into());
        self.sort_order = Some(order);
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// The limit actually sent, after defaulting.
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// Check `page >= 1` and `limit > 0`.
    pub fn validate(&self) -> Result<(), Error> {
        if self.page == 0 {
            return Err(Error::InvalidRequest {
                message: "page must be >= 1".into(),
            });
        }
        if self.limit == Some(0) {
            return Err(Error::InvalidRequest {
                message: "limit must be > 0".into(),
            });
        }
        Ok(())
    }

    /// Query-string pairs. Empty search terms, and filter values of
    /// `"all"` or empty, are left off.
    pub fn to_query(&self) -> Result<Vec<(String, String)>, Error> {
        self.validate()?;

        let mut pairs = vec![
            ("page".to_owned(), self.page.to_string()),
            ("limit".to_owned(), self.effective_limit().to_string()),
        ];
        if let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) {
            pairs.push(("search".to_owned(), term.to_owned()));
        }
        if let Some(ref key) = self.sort_by {
            pairs.push(("sortBy".to_owned(), key.clone()));
            pairs.push((
                "sortOrder".to_owned(),
                self.sort_order.unwrap_or_default().to_string(),
            ));
        }
        for (k, v) in &self.filters {
            if v.is_empty() || v == "all" {
                continue;
            }
            pairs.push((k.clone(), v.clone()));
        }
        Ok(pairs)
    }
}
