//! Manager configuration.

use crate::monitor::MonitorConfig;
use serde::{Deserialize, Serialize};

/// Default page size for paginated listings.
pub const DEFAULT_ROWS_PAGE: usize = 20;

/// Default width of the page-number window shown by list UIs.
pub const DEFAULT_ROW_PAGE_TAB: usize = 5;

/// Settings shared by every operation of a manager.
///
/// Deserializable with every field optional, so it can be embedded in an
/// application's own TOML/JSON configuration:
///
/// ```
/// use oraquery::ManagerConfig;
///
/// let config: ManagerConfig = serde_json::from_str(r#"{"rows_page": 50}"#)?;
/// assert_eq!(config.rows_page, 50);
/// assert_eq!(config.row_page_tab, 5);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Default page size of `list_paginated` and `list_page`.
    pub rows_page: usize,
    /// Width of [`PageResult::page_window`](crate::PageResult::page_window).
    pub row_page_tab: usize,
    /// Statement monitoring.
    pub monitor: MonitorConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            rows_page: DEFAULT_ROWS_PAGE,
            row_page_tab: DEFAULT_ROW_PAGE_TAB,
            monitor: MonitorConfig::default(),
        }
    }
}

impl ManagerConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default page size.
    pub fn rows_page(mut self, rows_page: usize) -> Self {
        self.rows_page = rows_page;
        self
    }

    /// Set the page-number window width.
    pub fn row_page_tab(mut self, row_page_tab: usize) -> Self {
        self.row_page_tab = row_page_tab;
        self
    }

    /// Set the monitor configuration.
    pub fn monitor(mut self, monitor: MonitorConfig) -> Self {
        self.monitor = monitor;
        self
    }
}
