//! Trace-processor arg set decoding.
//!
//! The trace processor stores each input event as a flat arg set: one row per
//! leaf, keyed by a path such as `pointer[0].axis_value[1].axis`. The decoder
//! rebuilds the nesting from the keys and then applies the message schema, so
//! the tree matches what [`super::proto::ProtoDecoder`] produces for the same
//! event.

use std::sync::LazyLock;

use regex::Regex;

use crate::schema::{FieldSchema, FieldType, MessageSchema, SchemaRegistry};
use crate::trace_type::TraceType;
use crate::tree::{Formatter, PropertyTreeNode, PropertyValue};

use super::merge::merge_entry;
use super::{DecodeError, RecordDecoder};

/// `name` optionally followed by any number of `[index]` suffixes.
static KEY_SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)((?:\[\d+\])*)$").expect("Invalid arg key regex pattern")
});

static KEY_INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("Invalid arg index regex pattern"));

/// Array indices in arg keys above this are rejected rather than allocated.
const MAX_ARG_INDEX: usize = 1 << 16;

/// Value column of one arg row.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Int(i64),
    UInt(u64),
    Real(f64),
    String(String),
    Bool(bool),
}

impl ArgValue {
    /// Pick the value column named by the trace processor's `value_type`.
    pub fn from_columns(
        value_type: Option<&str>,
        int_value: Option<i64>,
        string_value: Option<String>,
        real_value: Option<f64>,
    ) -> Self {
        match (value_type, int_value, string_value, real_value) {
            (Some("bool"), Some(v), _, _) => ArgValue::Bool(v != 0),
            (Some("uint" | "pointer"), Some(v), _, _) => ArgValue::UInt(v as u64),
            (Some("int"), Some(v), _, _) => ArgValue::Int(v),
            (Some("real"), _, _, Some(v)) => ArgValue::Real(v),
            (Some("string" | "json"), _, Some(s), _) => ArgValue::String(s),
            (Some("null"), _, _, _) => ArgValue::Null,
            // untyped rows: first populated column wins
            (_, Some(v), _, _) => ArgValue::Int(v),
            (_, None, Some(s), _) => ArgValue::String(s),
            (_, None, None, Some(v)) => ArgValue::Real(v),
            _ => ArgValue::Null,
        }
    }
}

/// One row of the `args` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub key: String,
    pub value: ArgValue,
}

impl Arg {
    pub fn new(key: impl Into<String>, value: ArgValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// All args sharing one `arg_set_id`, in row order.
pub type ArgSet = Vec<Arg>;

/// A primary event's args plus the args of each dependent, in row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgsRecord {
    pub primary: ArgSet,
    pub dependents: Vec<ArgSet>,
}

/// Decodes trace-processor arg sets into entry trees.
#[derive(Debug, Clone)]
pub struct ArgsDecoder {
    trace_type: TraceType,
    schemas: SchemaRegistry,
}

impl ArgsDecoder {
    pub fn new(trace_type: TraceType, schemas: SchemaRegistry) -> Self {
        Self {
            trace_type,
            schemas,
        }
    }
}

impl RecordDecoder for ArgsDecoder {
    type Record = ArgsRecord;

    fn trace_type(&self) -> TraceType {
        self.trace_type
    }

    fn decode(&self, record: &ArgsRecord) -> Result<PropertyTreeNode, DecodeError> {
        let primary = decode_arg_set(
            self.trace_type.primary_field(),
            &record.primary,
            self.schemas.primary(self.trace_type),
        )?;
        let dependents = record
            .dependents
            .iter()
            .map(|args| decode_arg_set("", args, self.schemas.dependent()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(merge_entry(self.trace_type, primary, dependents))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeySegment {
    Field(String),
    Index(usize),
}

fn parse_key(key: &str) -> Result<Vec<KeySegment>, DecodeError> {
    let mut segments = Vec::new();
    for part in key.split('.') {
        let caps = KEY_SEGMENT_RE
            .captures(part)
            .ok_or_else(|| DecodeError::InvalidArgKey(key.to_string()))?;
        segments.push(KeySegment::Field(caps[1].to_string()));
        for index in KEY_INDEX_RE.captures_iter(&caps[2]) {
            let index = index[1]
                .parse::<usize>()
                .ok()
                .filter(|i| *i < MAX_ARG_INDEX)
                .ok_or_else(|| DecodeError::InvalidArgKey(key.to_string()))?;
            segments.push(KeySegment::Index(index));
        }
    }
    Ok(segments)
}

/// Nesting rebuilt from arg keys, before any schema is applied.
#[derive(Debug, Clone, Default, PartialEq)]
enum ArgNode {
    #[default]
    Empty,
    Leaf(ArgValue),
    Map(Vec<(String, ArgNode)>),
    List(Vec<ArgNode>),
}

impl ArgNode {
    fn insert(&mut self, path: &[KeySegment], value: ArgValue, key: &str) -> Result<(), DecodeError> {
        let Some((head, rest)) = path.split_first() else {
            *self = ArgNode::Leaf(value);
            return Ok(());
        };

        match head {
            KeySegment::Field(name) => {
                if matches!(self, ArgNode::Empty) {
                    *self = ArgNode::Map(Vec::new());
                }
                let ArgNode::Map(entries) = self else {
                    return Err(mismatch(key, "an object"));
                };
                let pos = match entries.iter().position(|(n, _)| n == name) {
                    Some(pos) => pos,
                    None => {
                        entries.push((name.clone(), ArgNode::Empty));
                        entries.len() - 1
                    }
                };
                entries[pos].1.insert(rest, value, key)
            }
            KeySegment::Index(index) => {
                if matches!(self, ArgNode::Empty) {
                    *self = ArgNode::List(Vec::new());
                }
                let ArgNode::List(items) = self else {
                    return Err(mismatch(key, "an array"));
                };
                if items.len() <= *index {
                    items.resize(*index + 1, ArgNode::Empty);
                }
                items[*index].insert(rest, value, key)
            }
        }
    }

    fn field(&self, name: &str) -> Option<&ArgNode> {
        match self {
            ArgNode::Map(entries) => entries.iter().find(|(n, _)| n == name).map(|(_, n)| n),
            _ => None,
        }
    }
}

fn mismatch(key: &str, expected: &'static str) -> DecodeError {
    DecodeError::ArgTypeMismatch {
        key: key.to_string(),
        expected,
    }
}

/// Decode one arg set into an object node named `name`.
pub fn decode_arg_set(
    name: &str,
    args: &[Arg],
    schema: &MessageSchema,
) -> Result<PropertyTreeNode, DecodeError> {
    let mut root = ArgNode::Map(Vec::new());
    for arg in args {
        let path = parse_key(&arg.key)?;
        root.insert(&path, arg.value.clone(), &arg.key)?;
    }
    build_message(name, &root, schema, "")
}

fn build_message(
    name: &str,
    node: &ArgNode,
    schema: &MessageSchema,
    prefix: &str,
) -> Result<PropertyTreeNode, DecodeError> {
    let children = schema
        .fields()
        .iter()
        .map(|field| -> Result<PropertyTreeNode, DecodeError> {
            let key = if prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{prefix}.{}", field.name)
            };
            let child = node.field(&field.name);
            let built = if field.repeated {
                let items = match child {
                    None | Some(ArgNode::Empty) => Vec::new(),
                    Some(ArgNode::List(items)) => items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| build_value(field, item, &format!("{key}[{i}]")))
                        .collect::<Result<Vec<_>, _>>()?,
                    Some(single) => vec![build_value(field, single, &key)?],
                };
                PropertyTreeNode::array("", items)
            } else {
                match child {
                    None => PropertyTreeNode::null(""),
                    Some(child) => build_value(field, child, &key)?,
                }
            };
            Ok(built.renamed(field.tree_name()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PropertyTreeNode::object(name, children))
}

fn build_value(field: &FieldSchema, node: &ArgNode, key: &str) -> Result<PropertyTreeNode, DecodeError> {
    match (&field.ty, node) {
        (_, ArgNode::Empty | ArgNode::Leaf(ArgValue::Null)) => Ok(PropertyTreeNode::null("")),
        (FieldType::Message(schema), ArgNode::Map(_)) => build_message("", node, schema, key),
        (FieldType::Message(_), _) => Err(mismatch(key, "an object")),
        (ty, ArgNode::Leaf(value)) => Ok(PropertyTreeNode::terminal_with(
            "",
            convert_scalar(ty, &field.formatter, value, key)?,
            field.formatter.clone(),
        )),
        (_, _) => Err(mismatch(key, "a scalar")),
    }
}

fn convert_scalar(
    ty: &FieldType,
    formatter: &Formatter,
    value: &ArgValue,
    key: &str,
) -> Result<PropertyValue, DecodeError> {
    let converted = match (ty, value) {
        (FieldType::Bool, ArgValue::Bool(b)) => PropertyValue::Bool(*b),
        (FieldType::Bool, ArgValue::Int(v)) => PropertyValue::Bool(*v != 0),
        (FieldType::Float | FieldType::Double, ArgValue::Real(v)) => PropertyValue::Float(*v),
        (FieldType::Float | FieldType::Double, ArgValue::Int(v)) => PropertyValue::Float(*v as f64),
        (FieldType::String | FieldType::Bytes, ArgValue::String(s)) => PropertyValue::String(s.clone()),
        (FieldType::Enum, ArgValue::String(s)) => match formatter {
            Formatter::Enum(table) => table
                .code(s)
                .map(PropertyValue::Int)
                .unwrap_or_else(|| PropertyValue::String(s.clone())),
            _ => PropertyValue::String(s.clone()),
        },
        (ty, ArgValue::Int(v)) if ty.is_unsigned() => PropertyValue::UInt(*v as u64),
        (ty, ArgValue::UInt(v)) if ty.is_unsigned() => PropertyValue::UInt(*v),
        (ty, ArgValue::Int(v)) if is_signed_integer(ty) => PropertyValue::Int(*v),
        (ty, ArgValue::UInt(v)) if is_signed_integer(ty) => PropertyValue::Int(*v as i64),
        _ => return Err(mismatch(key, type_label(ty))),
    };
    Ok(converted)
}

fn is_signed_integer(ty: &FieldType) -> bool {
    matches!(
        ty,
        FieldType::Int32
            | FieldType::Int64
            | FieldType::SInt32
            | FieldType::SInt64
            | FieldType::SFixed32
            | FieldType::SFixed64
            | FieldType::Enum
    )
}

fn type_label(ty: &FieldType) -> &'static str {
    match ty {
        FieldType::Bool => "a bool",
        FieldType::Float | FieldType::Double => "a number",
        FieldType::String | FieldType::Bytes => "a string",
        FieldType::Message(_) => "an object",
        _ => "an integer",
    }
}
