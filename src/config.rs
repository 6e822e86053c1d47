//! Options for reading and writing datasets.

use serde::{Deserialize, Serialize};

/// Configuration for [`DatasetJsonWriter`](crate::io::json::DatasetJsonWriter).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonConfig {
    /// Indent the output for humans. Compact by default.
    pub pretty: bool,
}

impl JsonConfig {
    /// Compact output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set pretty printing.
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}
