// ── Response envelope reconciliation ──
//
// List endpoints answer either with a paginated envelope
// `{ success, data: [...], total, page, limit, totalPages, hasNextPage, hasPrevPage }`
// or with a bare JSON array. Both are turned into a `ListPage` here.
// Single-record endpoints may wrap the record as `{ success, data: {...} }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::record::Record;

/// Pagination metadata, always fully populated after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    /// Derive page counts and neighbours from `total`, `page` and `limit`.
    ///
    /// `total_pages = ceil(total / limit)`; `total == 0` gives zero pages.
    pub fn compute(total: u64, page: u32, limit: u32) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages = u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);
        Self {
            total,
            page,
            limit,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

/// Which wire shape a list response arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeShape {
    Paginated,
    /// A bare array: the backend ignored paging and sent everything.
    Bare,
}

/// A normalized page of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage {
    pub records: Vec<Record>,
    pub pagination: Pagination,
    pub shape: EnvelopeShape,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaginatedBody {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Vec<Record>,
    total: Option<u64>,
    page: Option<u32>,
    limit: Option<u32>,
    total_pages: Option<u32>,
    has_next_page: Option<bool>,
    has_prev_page: Option<bool>,
}

/// Parse a list body, filling in any pagination fields the backend omitted.
///
/// `requested_page` / `requested_limit` are used when the backend does not
/// echo them back.
pub fn parse_list(body: &str, requested_page: u32, requested_limit: u32) -> Result<ListPage, Error> {
    let value: Value = serde_json::from_str(body).map_err(|e| deser_error(&e, body))?;

    match value {
        Value::Array(_) => {
            let records: Vec<Record> =
                serde_json::from_value(value).map_err(|e| deser_error(&e, body))?;
            let total = u64::try_from(records.len()).unwrap_or(u64::MAX);
            Ok(ListPage {
                pagination: Pagination::compute(total, 1, requested_limit),
                records,
                shape: EnvelopeShape::Bare,
            })
        }
        Value::Object(_) => {
            let env: PaginatedBody =
                serde_json::from_value(value).map_err(|e| deser_error(&e, body))?;
            if env.success == Some(false) {
                return Err(Error::Api {
                    status: 200,
                    message: env
                        .message
                        .unwrap_or_else(|| "backend reported success: false".into()),
                });
            }

            let total = env
                .total
                .unwrap_or_else(|| u64::try_from(env.data.len()).unwrap_or(u64::MAX));
            let page = env.page.unwrap_or(requested_page);
            let limit = env.limit.filter(|l| *l > 0).unwrap_or(requested_limit);

            let mut pagination = Pagination::compute(total, page, limit);
            if let Some(tp) = env.total_pages {
                pagination.total_pages = tp;
                pagination.has_next_page = pagination.page < tp;
            }
            if let Some(next) = env.has_next_page {
                pagination.has_next_page = next;
            }
            if let Some(prev) = env.has_prev_page {
                pagination.has_prev_page = prev;
            }

            Ok(ListPage {
                records: env.data,
                pagination,
                shape: EnvelopeShape::Paginated,
            })
        }
        other => Err(Error::Deserialization {
            message: format!("expected array or envelope object, got {other}"),
            body: body.to_owned(),
        }),
    }
}

/// Parse a single-record body, unwrapping a `{ data: {...} }` envelope.
pub fn parse_single(body: &str) -> Result<Record, Error> {
    let value: Value = serde_json::from_str(body).map_err(|e| deser_error(&e, body))?;
    let value = unwrap_data(value)?;
    Record::from_value(value).map_err(|message| Error::Deserialization {
        message,
        body: body.to_owned(),
    })
}

/// Strip a `{ success, data }` wrapper if present. A body that carries its
/// own `id`/`_id` is taken as the record itself.
pub(crate) fn unwrap_data(value: Value) -> Result<Value, Error> {
    let Value::Object(mut obj) = value else {
        return Ok(value);
    };
    if obj.get("success") == Some(&Value::Bool(false)) {
        let message = obj
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("backend reported success: false")
            .to_owned();
        return Err(Error::Api {
            status: 200,
            message,
        });
    }
    let has_own_id = obj.contains_key("id") || obj.contains_key("_id");
    if !has_own_id {
        if let Some(inner) = obj.remove("data") {
            return Ok(inner);
        }
    }
    Ok(Value::Object(obj))
}

fn deser_error(e: &serde_json::Error, body: &str) -> Error {
    let preview: String = body.chars().take(200).collect();
    Error::Deserialization {
        message: format!("{e} (body preview: {preview:?})"),
        body: body.to_owned(),
    }
}
