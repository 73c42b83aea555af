//! Timestamps tagged with the clock they were captured on.
//!
//! Android traces mix wall-clock (`REALTIME`) and boot-relative (`BOOTTIME`)
//! instants. A [`Timestamp`] is only ordered against timestamps of the same
//! [`ClockKind`]; crossing clocks goes through a [`TimestampConverter`] that
//! carries the per-trace real-to-elapsed offset.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceError};

const NS_PER_MS: i64 = 1_000_000;
const NS_PER_S: i64 = 1_000 * NS_PER_MS;
const NS_PER_MIN: i64 = 60 * NS_PER_S;
const NS_PER_H: i64 = 60 * NS_PER_MIN;
const NS_PER_D: i64 = 24 * NS_PER_H;

/// Time domain a timestamp belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClockKind {
    /// Wall clock (`CLOCK_REALTIME`).
    Real,
    /// Monotonic time since boot, including suspend (`CLOCK_BOOTTIME`).
    Elapsed,
    /// A clock with no known relation to the others.
    Agnostic,
}

impl fmt::Display for ClockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockKind::Real => write!(f, "REAL"),
            ClockKind::Elapsed => write!(f, "ELAPSED"),
            ClockKind::Agnostic => write!(f, "AGNOSTIC"),
        }
    }
}

/// An immutable nanosecond instant on a specific clock.
///
/// Zero is a valid instant. Use `Option<Timestamp>` for "unset".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    kind: ClockKind,
    value_ns: i64,
}

impl Timestamp {
    pub const fn new(kind: ClockKind, value_ns: i64) -> Self {
        Self { kind, value_ns }
    }

    pub const fn real(value_ns: i64) -> Self {
        Self::new(ClockKind::Real, value_ns)
    }

    pub const fn elapsed(value_ns: i64) -> Self {
        Self::new(ClockKind::Elapsed, value_ns)
    }

    pub const fn kind(&self) -> ClockKind {
        self.kind
    }

    pub const fn value_ns(&self) -> i64 {
        self.value_ns
    }

    /// Shift by `offset_ns` and retag as `target`. Pure and total.
    #[must_use]
    pub const fn convert(self, target: ClockKind, offset_ns: i64) -> Self {
        Self::new(target, self.value_ns.wrapping_add(offset_ns))
    }

    /// Human-readable rendering appropriate for the clock kind.
    pub fn format(&self) -> String {
        match self.kind {
            ClockKind::Real => format_real_ns(self.value_ns),
            ClockKind::Elapsed => format_duration_ns(self.value_ns),
            ClockKind::Agnostic => format!("{}ns", self.value_ns),
        }
    }
}

impl PartialOrd for Timestamp {
    /// Same-clock timestamps compare by value; different clocks are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.kind == other.kind {
            Some(self.value_ns.cmp(&other.value_ns))
        } else {
            None
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Format a `CLOCK_REALTIME` nanosecond value as a UTC wall-clock string.
pub fn format_real_ns(value_ns: i64) -> String {
    let secs = value_ns.div_euclid(NS_PER_S);
    let nanos = value_ns.rem_euclid(NS_PER_S) as u32;
    match DateTime::<Utc>::from_timestamp(secs, nanos) {
        Some(dt) => dt.format("%Y-%m-%d, %H:%M:%S%.9f").to_string(),
        None => format!("{value_ns}ns"),
    }
}

/// Format a nanosecond duration as `1d2h3m4s5ms6ns`, skipping zero units.
pub fn format_duration_ns(value_ns: i64) -> String {
    if value_ns == 0 {
        return "0ns".to_string();
    }

    let mut out = String::new();
    if value_ns < 0 {
        out.push('-');
    }
    let mut remaining = value_ns.unsigned_abs();
    for (unit, suffix) in [
        (NS_PER_D, "d"),
        (NS_PER_H, "h"),
        (NS_PER_MIN, "m"),
        (NS_PER_S, "s"),
        (NS_PER_MS, "ms"),
        (1, "ns"),
    ] {
        let unit = unit as u64;
        let count = remaining / unit;
        if count > 0 {
            out.push_str(&format!("{count}{suffix}"));
            remaining %= unit;
        }
    }
    out
}

/// Converts timestamps between clocks using a per-trace offset.
///
/// The offset is `REALTIME - BOOTTIME`, so `real = elapsed + offset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampConverter {
    real_to_elapsed_offset_ns: Option<i64>,
}

impl TimestampConverter {
    pub fn new(real_to_elapsed_offset_ns: Option<i64>) -> Self {
        Self {
            real_to_elapsed_offset_ns,
        }
    }

    pub fn real_to_elapsed_offset_ns(&self) -> Option<i64> {
        self.real_to_elapsed_offset_ns
    }

    /// True if elapsed timestamps can be converted to real ones.
    pub fn has_real_offset(&self) -> bool {
        self.real_to_elapsed_offset_ns.is_some()
    }

    /// Offset to add when converting from `from` to `to`, if one is known.
    fn offset_between(&self, from: ClockKind, to: ClockKind) -> Option<i64> {
        match (from, to) {
            (a, b) if a == b => Some(0),
            (ClockKind::Elapsed, ClockKind::Real) => self.real_to_elapsed_offset_ns,
            (ClockKind::Real, ClockKind::Elapsed) => {
                self.real_to_elapsed_offset_ns.map(i64::wrapping_neg)
            }
            _ => None,
        }
    }

    pub fn convert(&self, ts: Timestamp, target: ClockKind) -> Result<Timestamp> {
        let offset = self
            .offset_between(ts.kind(), target)
            .ok_or(TraceError::IncomparableClocks {
                left: ts.kind(),
                right: target,
            })?;
        Ok(ts.convert(target, offset))
    }

    pub fn to_real(&self, ts: Timestamp) -> Result<Timestamp> {
        self.convert(ts, ClockKind::Real)
    }

    pub fn to_elapsed(&self, ts: Timestamp) -> Result<Timestamp> {
        self.convert(ts, ClockKind::Elapsed)
    }

    /// Order two timestamps, converting `b` onto `a`'s clock when needed.
    pub fn compare(&self, a: Timestamp, b: Timestamp) -> Result<Ordering> {
        let b = self.convert(b, a.kind()).map_err(|_| TraceError::IncomparableClocks {
            left: a.kind(),
            right: b.kind(),
        })?;
        Ok(a.value_ns().cmp(&b.value_ns()))
    }
}
