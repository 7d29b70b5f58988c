// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Page-number pagination for collections and the matching envelope meta.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::config::Configuration;

/// Pagination state for one page of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// 1-based page number.
    pub current_page: usize,
    /// Items per page.
    pub per_page: usize,
    /// Total number of items.
    pub total_count: usize,
}

impl Pagination {
    /// Creates pagination state. Page 0 is treated as page 1, per-page is
    /// clamped by the configuration.
    pub fn new(page: Option<usize>, per_page: Option<usize>, total_count: usize, config: &Configuration) -> Self {
        Self {
            current_page: page.unwrap_or(1).max(1),
            per_page: config.clamp_per_page(per_page),
            total_count,
        }
    }

    /// Number of pages, at least 1.
    pub fn total_pages(&self) -> usize {
        self.total_count.div_ceil(self.per_page).max(1)
    }

    /// Offset of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.current_page - 1).saturating_mul(self.per_page)
    }

    /// Next page number, if any.
    pub fn next_page(&self) -> Option<usize> {
        (self.current_page < self.total_pages()).then(|| self.current_page + 1)
    }

    /// Previous page number, if any.
    pub fn prev_page(&self) -> Option<usize> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }

    /// Envelope meta for this page.
    pub fn meta(&self) -> JsonValue {
        json!({
            "pagination": {
                "current_page": self.current_page,
                "per_page": self.per_page,
                "total_pages": self.total_pages(),
                "total_count": self.total_count,
                "next_page": self.next_page(),
                "prev_page": self.prev_page(),
            }
        })
    }
}

/// Slices one page out of a collection.
pub fn paginate<'a, T>(
    items: &'a [T],
    page: Option<usize>,
    per_page: Option<usize>,
    config: &Configuration,
) -> (&'a [T], Pagination) {
    let pagination = Pagination::new(page, per_page, items.len(), config);
    let start = pagination.offset().min(items.len());
    let end = (start + pagination.per_page).min(items.len());
    (&items[start..end], pagination)
}

/// Reads `page` and `per_page` from request parameters. Numeric strings are accepted.
pub fn page_params(params: &JsonValue) -> (Option<usize>, Option<usize>) {
    let read = |key: &str| {
        params.get(key).and_then(|v| match v {
            JsonValue::Number(n) => n.as_u64().map(|n| n as usize),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    };
    (read("page"), read("per_page"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_slices() {
        let items: Vec<u32> = (1..=55).collect();
        let config = Configuration::default();
        let (page, pagination) = paginate(&items, Some(3), None, &config);
        assert_eq!(page, &items[50..55]);
        assert_eq!(pagination.total_pages(), 3);
        assert_eq!(pagination.next_page(), None);
        assert_eq!(pagination.prev_page(), Some(2));
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let items = vec![1, 2, 3];
        let (page, _) = paginate(&items, Some(9), Some(2), &Configuration::default());
        assert!(page.is_empty());
    }

    #[test]
    fn test_huge_page_number_is_empty() {
        let items = vec![1, 2, 3];
        let (page, _) = page_params(&json!({ "page": "18446744073709551615" }));
        let (slice, pagination) = paginate(&items, page, None, &Configuration::default());
        assert!(slice.is_empty());
        assert_eq!(pagination.offset(), usize::MAX);
        assert_eq!(pagination.next_page(), None);
        assert_eq!(pagination.prev_page(), Some(usize::MAX - 1));
    }

    #[test]
    fn test_per_page_is_clamped() {
        let config = Configuration {
            max_per_page: 10,
            ..Configuration::default()
        };
        let pagination = Pagination::new(Some(0), Some(500), 42, &config);
        assert_eq!(pagination.current_page, 1);
        assert_eq!(pagination.per_page, 10);
        assert_eq!(pagination.total_pages(), 5);
    }

    #[test]
    fn test_meta() {
        let pagination = Pagination::new(Some(1), Some(10), 0, &Configuration::default());
        assert_eq!(
            pagination.meta(),
            json!({ "pagination": {
                "current_page": 1, "per_page": 10, "total_pages": 1,
                "total_count": 0, "next_page": null, "prev_page": null
            }})
        );
    }

    #[test]
    fn test_page_params() {
        let params = json!({ "page": "2", "per_page": 15 });
        assert_eq!(page_params(&params), (Some(2), Some(15)));
        assert_eq!(page_params(&json!({})), (None, None));
    }
}
