use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
/// Highest page whose offset still fits in an `i64` at [`MAX_LIMIT`].
pub const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

/// Paging placeholder read from `limit` and `page` query parameters.
///
/// Unparseable values fall back to the defaults instead of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pager {
    pub limit: i64,
    pub page: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: i64,
    pub limit: i64,
    pub page: i64,
    pub has_more: bool,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            page: 1,
        }
    }
}

fn parse_i64(value: Option<&String>) -> Option<i64> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok())
}

impl Pager {
    pub fn new(limit: i64, page: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIMIT),
            page: page.clamp(1, MAX_PAGE),
        }
    }

    pub fn from_query(query: &HashMap<String, String>) -> Self {
        Self::new(
            parse_i64(query.get("limit")).unwrap_or(DEFAULT_LIMIT),
            parse_i64(query.get("page")).unwrap_or(1),
        )
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn offset(&self) -> i64 {
        if self.page < 2 {
            0
        } else {
            self.limit.saturating_mul(self.page - 1)
        }
    }

    pub fn meta(&self, total: i64) -> PageMeta {
        PageMeta {
            total,
            limit: self.limit,
            page: self.page,
            has_more: self.offset().saturating_add(self.limit) < total,
        }
    }
}
