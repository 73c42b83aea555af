//! Message schemas that drive tree construction.
//!
//! A [`MessageSchema`] lists the fields of one protobuf message: their
//! declared names, field numbers, wire types and formatters. Decoders are
//! handed a [`SchemaRegistry`] at construction instead of consulting global
//! tables, so symbolic names for enum and flag fields are explicit
//! configuration.

pub mod android_input;

use std::collections::HashMap;
use std::sync::Arc;

use crate::trace_type::TraceType;
use crate::tree::{Formatter, SymbolTable};

/// Protobuf wire encoding of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    Fixed32,
}

impl WireType {
    pub fn from_tag(tag: u64) -> Option<Self> {
        match tag & 0x07 {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Int32,
    Int64,
    UInt32,
    UInt64,
    SInt32,
    SInt64,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Float,
    Double,
    Bool,
    Enum,
    String,
    Bytes,
    Message(Arc<MessageSchema>),
}

impl FieldType {
    /// Wire type used for a single, unpacked value of this type.
    pub fn wire_type(&self) -> WireType {
        match self {
            FieldType::Int32
            | FieldType::Int64
            | FieldType::UInt32
            | FieldType::UInt64
            | FieldType::SInt32
            | FieldType::SInt64
            | FieldType::Bool
            | FieldType::Enum => WireType::Varint,
            FieldType::Fixed64 | FieldType::SFixed64 | FieldType::Double => WireType::Fixed64,
            FieldType::Fixed32 | FieldType::SFixed32 | FieldType::Float => WireType::Fixed32,
            FieldType::String | FieldType::Bytes | FieldType::Message(_) => {
                WireType::LengthDelimited
            }
        }
    }

    /// Scalars with a non length-delimited encoding may appear packed.
    pub fn is_packable(&self) -> bool {
        self.wire_type() != WireType::LengthDelimited
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            FieldType::UInt32 | FieldType::UInt64 | FieldType::Fixed32 | FieldType::Fixed64
        )
    }
}

/// One field of a message.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// Declared (snake_case) proto name.
    pub name: String,
    pub number: u32,
    pub ty: FieldType,
    pub repeated: bool,
    pub formatter: Formatter,
}

impl FieldSchema {
    pub fn scalar(name: &str, number: u32, ty: FieldType) -> Self {
        Self {
            name: name.to_string(),
            number,
            ty,
            repeated: false,
            formatter: Formatter::Default,
        }
    }

    pub fn enumeration(name: &str, number: u32, table: &Arc<SymbolTable>) -> Self {
        Self::scalar(name, number, FieldType::Enum).with_formatter(Formatter::Enum(table.clone()))
    }

    pub fn message(name: &str, number: u32, schema: &Arc<MessageSchema>) -> Self {
        Self::scalar(name, number, FieldType::Message(schema.clone()))
    }

    #[must_use]
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Name used in property trees: the lowerCamelCase JSON name.
    pub fn tree_name(&self) -> String {
        json_name(&self.name)
    }
}

/// Field list of one message type.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSchema {
    name: String,
    fields: Vec<FieldSchema>,
    by_number: HashMap<u32, usize>,
}

impl MessageSchema {
    pub fn new(name: &str, fields: Vec<FieldSchema>) -> Self {
        let by_number = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.number, i))
            .collect();
        Self {
            name: name.to_string(),
            fields,
            by_number,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldSchema> {
        self.field_index(number).map(|i| &self.fields[i])
    }

    /// Position of field `number` in declaration order.
    pub fn field_index(&self, number: u32) -> Option<usize> {
        self.by_number.get(&number).copied()
    }

    /// Lookup by declared (snake_case) name.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Convert a declared proto field name to its lowerCamelCase JSON name.
pub fn json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Schemas for the primary and dependent messages of each trace type.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    motion_event: Arc<MessageSchema>,
    key_event: Arc<MessageSchema>,
    window_dispatch_event: Arc<MessageSchema>,
}

impl SchemaRegistry {
    pub fn new(
        motion_event: Arc<MessageSchema>,
        key_event: Arc<MessageSchema>,
        window_dispatch_event: Arc<MessageSchema>,
    ) -> Self {
        Self {
            motion_event,
            key_event,
            window_dispatch_event,
        }
    }

    /// Android input event schemas as recorded by the input dispatcher.
    pub fn android_input() -> Self {
        let motion_event = android_input::motion_event_schema();
        let key_event = android_input::key_event_schema();
        let window_dispatch_event = android_input::window_dispatch_event_schema();
        Self::new(motion_event, key_event, window_dispatch_event)
    }

    /// Schema of the record that produces one entry for `trace_type`.
    pub fn primary(&self, trace_type: TraceType) -> &Arc<MessageSchema> {
        match trace_type {
            TraceType::InputMotionEvent => &self.motion_event,
            TraceType::InputKeyEvent => &self.key_event,
        }
    }

    /// Schema of the records merged into a primary entry.
    pub fn dependent(&self) -> &Arc<MessageSchema> {
        &self.window_dispatch_event
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::android_input()
    }
}
