//! Value formatters attached to terminal nodes.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::timestamp::{ClockKind, Timestamp};

use super::value::PropertyValue;

/// Numeric code to symbolic name mapping for one enum or flag type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    name: String,
    symbols: BTreeMap<i64, String>,
}

impl SymbolTable {
    pub fn new(name: &str, symbols: &[(i64, &str)]) -> Self {
        Self {
            name: name.to_string(),
            symbols: symbols
                .iter()
                .map(|(code, symbol)| (*code, symbol.to_string()))
                .collect(),
        }
    }

    /// Type name of the table, e.g. `MotionEventAction`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self, code: i64) -> Option<&str> {
        self.symbols.get(&code).map(String::as_str)
    }

    pub fn code(&self, symbol: &str) -> Option<i64> {
        self.symbols
            .iter()
            .find(|(_, s)| s.as_str() == symbol)
            .map(|(code, _)| *code)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// How a terminal's raw value is rendered by `formatted_value()`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Formatter {
    #[default]
    Default,
    /// Render the symbolic name of the code, or the decimal code if unknown.
    Enum(Arc<SymbolTable>),
    /// Render the name only when one symbol matches the whole mask.
    Flags(Arc<SymbolTable>),
    /// Render a nanosecond value as a timestamp on the given clock.
    Timestamp(ClockKind),
}

impl Formatter {
    /// Render `value`. Never mutates anything.
    pub fn format(&self, value: &PropertyValue) -> String {
        let code = match value {
            PropertyValue::Int(v) => Some(*v),
            PropertyValue::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        };

        match (self, code) {
            (Formatter::Enum(table), Some(code)) | (Formatter::Flags(table), Some(code)) => table
                .symbol(code)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
            (Formatter::Timestamp(kind), Some(code)) => Timestamp::new(*kind, code).format(),
            _ => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_state() -> Arc<SymbolTable> {
        Arc::new(SymbolTable::new(
            "MetaState",
            &[(0x1, "META_SHIFT_ON"), (0x2, "META_ALT_ON"), (0x1000, "META_CTRL_ON")],
        ))
    }

    #[test]
    fn test_enum_known_and_unknown_codes() {
        let table = Arc::new(SymbolTable::new("Action", &[(0, "ACTION_DOWN"), (1, "ACTION_UP")]));
        let formatter = Formatter::Enum(table);
        assert_eq!(formatter.format(&PropertyValue::Int(0)), "ACTION_DOWN");
        assert_eq!(formatter.format(&PropertyValue::Int(77)), "77");
        assert_eq!(formatter.format(&PropertyValue::Null), "null");
    }

    #[test]
    fn test_flags_require_full_mask_match() {
        let formatter = Formatter::Flags(meta_state());
        assert_eq!(formatter.format(&PropertyValue::Int(0x1000)), "META_CTRL_ON");
        assert_eq!(formatter.format(&PropertyValue::Int(0x3)), "3");
        assert_eq!(formatter.format(&PropertyValue::Int(0)), "0");
        assert_eq!(formatter.format(&PropertyValue::UInt(128)), "128");
    }

    #[test]
    fn test_timestamp_formatter() {
        let formatter = Formatter::Timestamp(ClockKind::Elapsed);
        assert_eq!(formatter.format(&PropertyValue::Int(1_000_000_001)), "1s1ns");
    }

    #[test]
    fn test_symbol_table_reverse_lookup() {
        let table = meta_state();
        assert_eq!(table.code("META_ALT_ON"), Some(0x2));
        assert_eq!(table.code("META_NOPE"), None);
        assert_eq!(table.len(), 3);
    }
}
