//! Trace type and format revision tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TraceError;
use crate::schema::android_input::{KEY_EVENT, MOTION_EVENT};

/// Kind of trace a parser produces entries for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceType {
    InputMotionEvent,
    InputKeyEvent,
}

impl TraceType {
    pub const ALL: [TraceType; 2] = [TraceType::InputMotionEvent, TraceType::InputKeyEvent];

    /// Message name of the primary record, used for entry ids.
    pub fn message_name(&self) -> &'static str {
        match self {
            TraceType::InputMotionEvent => MOTION_EVENT,
            TraceType::InputKeyEvent => KEY_EVENT,
        }
    }

    /// Child of the entry root holding the primary record's tree.
    pub fn primary_field(&self) -> &'static str {
        match self {
            TraceType::InputMotionEvent => "motionEvent",
            TraceType::InputKeyEvent => "keyEvent",
        }
    }
}

impl fmt::Display for TraceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceType::InputMotionEvent => write!(f, "INPUT_MOTION_EVENT"),
            TraceType::InputKeyEvent => write!(f, "INPUT_KEY_EVENT"),
        }
    }
}

impl FromStr for TraceType {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TraceType::ALL
            .into_iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| TraceError::UnsupportedTraceType(s.to_string()))
    }
}

/// Schema/format revision tier of a trace source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoarseVersion {
    /// Pre-Perfetto, tool-specific proto dumps.
    Legacy,
    /// Perfetto-based traces.
    Latest,
}

impl fmt::Display for CoarseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoarseVersion::Legacy => write!(f, "LEGACY"),
            CoarseVersion::Latest => write!(f, "LATEST"),
        }
    }
}
