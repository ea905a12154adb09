//! Query-engine configuration.
//!
//! Configuration is policy-owned and passed down by value; evaluation never reads
//! global state.

use serde::Deserialize;

///
/// CONSTANTS
///

/// Default character separating the segments of an embedded field path.
pub const DEFAULT_FIELD_SEPARATOR: char = '.';

/// Default compiled-program size limit for regex filters (1 MiB).
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 1 << 20;

///
/// QueryConfig
///
/// Knobs shared by the filter evaluator, the planner, and the executor.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    /// Separator used to address nested documents and list elements.
    pub field_separator: char,

    /// Upper bound on the compiled size of one regex filter pattern.
    pub regex_size_limit: usize,

    /// When false every query runs as a collection scan through the
    /// per-leaf index protocol; no index scans are planned.
    pub planner_enabled: bool,
}

impl QueryConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            field_separator: DEFAULT_FIELD_SEPARATOR,
            regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
            planner_enabled: true,
        }
    }

    #[must_use]
    pub const fn with_field_separator(mut self, separator: char) -> Self {
        self.field_separator = separator;
        self
    }

    #[must_use]
    pub const fn with_regex_size_limit(mut self, limit: usize) -> Self {
        self.regex_size_limit = limit;
        self
    }

    #[must_use]
    pub const fn with_planner(mut self, enabled: bool) -> Self {
        self.planner_enabled = enabled;
        self
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self::new()
    }
}
