//! Options controlling a configuration read.

/// Limits and naming for [`Config::read_with`](crate::Config::read_with).
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// How deep `include` statements may nest before they are refused.
    pub max_include_depth: usize,
    /// How deep `[...]` arrays may nest before they are skipped.
    pub max_nesting_depth: usize,
    /// File name used in diagnostics and for resolving relative includes.
    pub source_name: String,
}

impl ReadOptions {
    /// Creates read options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the include depth limit.
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Sets the array nesting limit.
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Sets the source name.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            max_include_depth: 16,
            max_nesting_depth: 256,
            source_name: "-".to_string(),
        }
    }
}
