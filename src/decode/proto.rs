//! Schema-driven protobuf message decoding.

use std::fmt::Write as _;
use std::ops::Range;
use std::sync::Arc;

use crate::schema::{FieldSchema, FieldType, MessageSchema, SchemaRegistry, WireType};
use crate::trace_type::TraceType;
use crate::tree::{PropertyTreeNode, PropertyValue};

use super::merge::merge_entry;
use super::wire::{zigzag_decode, WireReader, WireValue};
use super::{DecodeError, RecordDecoder};

/// A primary message and its dependents, located in a shared trace buffer.
#[derive(Debug, Clone)]
pub struct ProtoRecord {
    pub buf: Arc<[u8]>,
    pub primary: Range<usize>,
    pub dependents: Vec<Range<usize>>,
}

impl ProtoRecord {
    fn slice(&self, range: &Range<usize>) -> Result<&[u8], DecodeError> {
        self.buf.get(range.clone()).ok_or(DecodeError::OutOfBounds {
            start: range.start,
            end: range.end,
            len: self.buf.len(),
        })
    }
}

/// Decodes serialized input event messages into entry trees.
#[derive(Debug, Clone)]
pub struct ProtoDecoder {
    trace_type: TraceType,
    schemas: SchemaRegistry,
}

impl ProtoDecoder {
    pub fn new(trace_type: TraceType, schemas: SchemaRegistry) -> Self {
        Self {
            trace_type,
            schemas,
        }
    }
}

impl RecordDecoder for ProtoDecoder {
    type Record = ProtoRecord;

    fn trace_type(&self) -> TraceType {
        self.trace_type
    }

    fn decode(&self, record: &ProtoRecord) -> Result<PropertyTreeNode, DecodeError> {
        let primary = decode_message(
            self.trace_type.primary_field(),
            record.slice(&record.primary)?,
            self.schemas.primary(self.trace_type),
        )?;
        let dependents = record
            .dependents
            .iter()
            .map(|range| decode_message("", record.slice(range)?, self.schemas.dependent()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(merge_entry(self.trace_type, primary, dependents))
    }
}

/// Decode one serialized message into an object node named `name`.
///
/// Every schema field appears in the result: absent singular fields as null
/// terminals, absent repeated fields as empty arrays. Unknown fields are
/// skipped.
pub fn decode_message(
    name: &str,
    bytes: &[u8],
    schema: &MessageSchema,
) -> Result<PropertyTreeNode, DecodeError> {
    let mut slots: Vec<Vec<PropertyTreeNode>> = vec![Vec::new(); schema.fields().len()];

    for field in WireReader::new(bytes) {
        let field = field?;
        let Some(slot) = schema.field_index(field.number) else {
            continue;
        };
        let field_schema = &schema.fields()[slot];
        let values = decode_field_values(field_schema, field.value)?;
        if field_schema.repeated {
            slots[slot].extend(values);
        } else if let Some(last) = values.into_iter().last() {
            // last one wins for singular fields
            slots[slot] = vec![last];
        }
    }

    let children = schema
        .fields()
        .iter()
        .zip(slots)
        .map(|(field, values)| {
            let tree_name = field.tree_name();
            if field.repeated {
                PropertyTreeNode::array(tree_name, values)
            } else {
                values
                    .into_iter()
                    .next()
                    .map(|node| node.renamed(tree_name.clone()))
                    .unwrap_or_else(|| PropertyTreeNode::null(tree_name))
            }
        })
        .collect();

    Ok(PropertyTreeNode::object(name, children))
}

/// Decode one wire value; packed repeated scalars may expand to many nodes.
fn decode_field_values(
    field: &FieldSchema,
    value: WireValue<'_>,
) -> Result<Vec<PropertyTreeNode>, DecodeError> {
    let expected = field.ty.wire_type();
    let found = value.wire_type();

    if found == expected {
        return Ok(vec![decode_single(field, value)?]);
    }

    if field.repeated && field.ty.is_packable() {
        if let WireValue::Bytes(packed) = value {
            return decode_packed(field, packed);
        }
    }

    Err(DecodeError::WireTypeMismatch {
        field: field.name.clone(),
        expected,
        found,
    })
}

fn decode_packed(field: &FieldSchema, packed: &[u8]) -> Result<Vec<PropertyTreeNode>, DecodeError> {
    let mut reader = WireReader::new(packed);
    let mut nodes = Vec::new();
    while !reader.is_at_end() {
        let value = match field.ty.wire_type() {
            WireType::Varint => WireValue::Varint(reader.read_varint()?),
            WireType::Fixed32 => WireValue::Fixed32(reader.read_fixed32()?),
            WireType::Fixed64 => WireValue::Fixed64(reader.read_fixed64()?),
            WireType::LengthDelimited => {
                return Err(DecodeError::WireTypeMismatch {
                    field: field.name.clone(),
                    expected: WireType::LengthDelimited,
                    found: WireType::LengthDelimited,
                })
            }
        };
        nodes.push(decode_single(field, value)?);
    }
    Ok(nodes)
}

fn decode_single(field: &FieldSchema, value: WireValue<'_>) -> Result<PropertyTreeNode, DecodeError> {
    if let (FieldType::Message(schema), WireValue::Bytes(bytes)) = (&field.ty, value) {
        return decode_message("", bytes, schema);
    }

    let value = match (&field.ty, value) {
        (FieldType::Int32 | FieldType::Enum, WireValue::Varint(v)) => {
            PropertyValue::Int(i64::from(v as i32))
        }
        (FieldType::Int64, WireValue::Varint(v)) => PropertyValue::Int(v as i64),
        (FieldType::UInt32, WireValue::Varint(v)) => PropertyValue::UInt(u64::from(v as u32)),
        (FieldType::UInt64, WireValue::Varint(v)) => PropertyValue::UInt(v),
        (FieldType::SInt32, WireValue::Varint(v)) => {
            PropertyValue::Int(i64::from(zigzag_decode(v) as i32))
        }
        (FieldType::SInt64, WireValue::Varint(v)) => PropertyValue::Int(zigzag_decode(v)),
        (FieldType::Bool, WireValue::Varint(v)) => PropertyValue::Bool(v != 0),
        (FieldType::Fixed32, WireValue::Fixed32(v)) => PropertyValue::UInt(u64::from(v)),
        (FieldType::SFixed32, WireValue::Fixed32(v)) => PropertyValue::Int(i64::from(v as i32)),
        (FieldType::Float, WireValue::Fixed32(v)) => {
            PropertyValue::Float(f64::from(f32::from_bits(v)))
        }
        (FieldType::Fixed64, WireValue::Fixed64(v)) => PropertyValue::UInt(v),
        (FieldType::SFixed64, WireValue::Fixed64(v)) => PropertyValue::Int(v as i64),
        (FieldType::Double, WireValue::Fixed64(v)) => PropertyValue::Float(f64::from_bits(v)),
        (FieldType::String, WireValue::Bytes(bytes)) => PropertyValue::String(
            std::str::from_utf8(bytes)
                .map_err(|_| DecodeError::InvalidUtf8 {
                    field: field.name.clone(),
                })?
                .to_string(),
        ),
        (FieldType::Bytes, WireValue::Bytes(bytes)) => PropertyValue::String(hex(bytes)),
        (ty, value) => {
            return Err(DecodeError::WireTypeMismatch {
                field: field.name.clone(),
                expected: ty.wire_type(),
                found: value.wire_type(),
            })
        }
    };

    Ok(PropertyTreeNode::terminal_with(
        "",
        value,
        field.formatter.clone(),
    ))
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}
