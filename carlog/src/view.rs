//! Derives the visible page of the list from the full collection.

use std::cmp::Reverse;

use strum::{Display, EnumString};

use crate::record::Record;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum SortDirective {
    #[strum(serialize = "date-desc")]
    DateDesc,
    #[strum(serialize = "date-asc")]
    DateAsc,
    #[strum(serialize = "cost-desc")]
    CostDesc,
    #[strum(serialize = "cost-asc")]
    CostAsc,
    #[default]
    #[strum(serialize = "none")]
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub search: String,
    pub sort: SortDirective,
    /// 1-based; not clamped here.
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort: SortDirective::None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewPage<'a> {
    pub records: Vec<&'a Record>,
    pub total_pages: usize,
    /// Size of the working set before pagination.
    pub matched: usize,
}

pub fn matches_search(record: &Record, needle_lower: &str) -> bool {
    record.route().to_lowercase().contains(needle_lower)
        || record.date().to_lowercase().contains(needle_lower)
}

/// Filter, sort and slice `records` for display.
///
/// Sorting is stable, so records with equal keys keep their collection order.
/// Pages outside `1..=total_pages` come back empty.
pub fn reduce<'a>(records: &'a [Record], query: &ViewQuery) -> ViewPage<'a> {
    let needle = query.search.trim().to_lowercase();
    let mut working: Vec<&Record> = if needle.is_empty() {
        records.iter().collect()
    } else {
        records
            .iter()
            .filter(|record| matches_search(record, &needle))
            .collect()
    };

    match query.sort {
        SortDirective::DateDesc => working.sort_by_key(|r| Reverse(r.timestamp())),
        SortDirective::DateAsc => working.sort_by_key(|r| r.timestamp()),
        SortDirective::CostDesc => working.sort_by_key(|r| Reverse(r.total())),
        SortDirective::CostAsc => working.sort_by_key(|r| r.total()),
        SortDirective::None => {}
    }

    let page_size = query.page_size.max(1);
    let matched = working.len();
    let total_pages = matched.div_ceil(page_size).max(1);

    let records = match query.page.checked_sub(1) {
        Some(page_index) => working
            .into_iter()
            .skip(page_index.saturating_mul(page_size))
            .take(page_size)
            .collect(),
        None => Vec::new(),
    };

    ViewPage {
        records,
        total_pages,
        matched,
    }
}
