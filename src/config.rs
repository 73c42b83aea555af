//! Parser configuration.

use serde::Deserialize;

/// Options shared by every parser implementation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// `REALTIME - BOOTTIME` in nanoseconds. Overrides whatever the trace's
    /// own clock snapshots say.
    pub real_to_elapsed_offset_ns: Option<i64>,

    /// Report timestamps on the REALTIME clock when an offset is known.
    /// Without an offset timestamps stay ELAPSED regardless.
    pub prefer_real_time: bool,

    /// Skip records that fail to frame during indexing instead of failing
    /// the whole open.
    pub skip_malformed_records: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            real_to_elapsed_offset_ns: None,
            prefer_real_time: true,
            skip_malformed_records: true,
        }
    }
}

impl ParserConfig {
    /// Parse a config from JSON. Missing keys take their default.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn with_real_to_elapsed_offset_ns(mut self, offset_ns: i64) -> Self {
        self.real_to_elapsed_offset_ns = Some(offset_ns);
        self
    }

    #[must_use]
    pub fn strict(mut self) -> Self {
        self.skip_malformed_records = false;
        self
    }
}
