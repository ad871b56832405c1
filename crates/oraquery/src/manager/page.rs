//! Counted and paginated listing results.

use crate::row::Row;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// An `(offset, limit)` window over a listing.
///
/// Also deserializes from the `{"page_init": .., "page_fin": ..}` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    /// Rows to skip.
    #[serde(alias = "page_init")]
    pub offset: i64,
    /// Rows to return.
    #[serde(alias = "page_fin")]
    pub limit: i64,
}

impl PageRange {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }
}

impl From<(i64, i64)> for PageRange {
    fn from((offset, limit): (i64, i64)) -> Self {
        Self { offset, limit }
    }
}

/// Wall-clock time spent in each phase of a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Timings {
    /// Running the `COUNT(*)` statement.
    pub count: Duration,
    /// Fetching rows and mapping them to records.
    pub fetch: Duration,
    /// Splitting records into pages (`list_paginated` only).
    pub page: Option<Duration>,
    /// The whole operation.
    pub total: Duration,
}

/// Result of a counted listing: mapped records, raw rows, total and timings.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult<T> {
    /// Mapped records (`Vec<Record>`, or pages of them).
    pub result: T,
    /// Rows exactly as the session returned them.
    pub rows: Vec<Row>,
    /// Value of the `COUNTER` column.
    pub count: u64,
    pub timings: Timings,
    pub page_size: usize,
    #[serde(skip)]
    row_page_tab: usize,
}

impl<T> PageResult<T> {
    pub(crate) fn new(
        result: T,
        rows: Vec<Row>,
        count: u64,
        timings: Timings,
        page_size: usize,
        row_page_tab: usize,
    ) -> Self {
        Self {
            result,
            rows,
            count,
            timings,
            page_size,
            row_page_tab,
        }
    }

    /// Number of pages of `page_size` rows needed for `count` rows.
    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        (self.count as usize).div_ceil(self.page_size)
    }

    /// One-based page numbers to show around `current`.
    ///
    /// The window is `row_page_tab` pages wide, centred on `current` where
    /// possible and clamped to `1..=page_count()`. Empty when there are no pages.
    pub fn page_window(&self, current: usize) -> RangeInclusive<usize> {
        page_window(self.page_count(), current, self.row_page_tab)
    }

    /// Replace the mapped result, keeping counts and timings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PageResult<U> {
        PageResult {
            result: f(self.result),
            rows: self.rows,
            count: self.count,
            timings: self.timings,
            page_size: self.page_size,
            row_page_tab: self.row_page_tab,
        }
    }
}

pub(crate) fn page_window(pages: usize, current: usize, width: usize) -> RangeInclusive<usize> {
    if pages == 0 || width == 0 {
        return RangeInclusive::new(1, 0);
    }
    let width = width.min(pages);
    let current = current.clamp(1, pages);
    let start = current.saturating_sub(width / 2).max(1);
    let end = (start + width - 1).min(pages);
    let start = end + 1 - width;
    start..=end
}

/// Split `items` into consecutive chunks of `size`; the last may be shorter.
pub(crate) fn into_chunks<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let mut chunks = Vec::with_capacity(items.len().div_ceil(size.max(1)));
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        chunks.push(iter.by_ref().take(size.max(1)).collect());
    }
    chunks
}
