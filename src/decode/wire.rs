//! Protobuf wire-format reading over byte slices.
//!
//! Yields raw `(field number, value)` pairs without any schema; the schema is
//! applied by [`super::proto::ProtoDecoder`]. Length-delimited payloads are
//! borrowed from the input buffer.

use thiserror::Error;

use crate::schema::WireType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("truncated input at byte {offset}")]
    Truncated { offset: usize },
    #[error("varint too large at byte {offset}")]
    VarintTooLong { offset: usize },
    #[error("unknown wire type {wire_type} at byte {offset}")]
    UnknownWireType { wire_type: u8, offset: usize },
    #[error("invalid field number 0 at byte {offset}")]
    InvalidFieldNumber { offset: usize },
}

/// One raw field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireValue<'a> {
    Varint(u64),
    Fixed64(u64),
    Fixed32(u32),
    Bytes(&'a [u8]),
}

impl WireValue<'_> {
    pub fn wire_type(&self) -> WireType {
        match self {
            WireValue::Varint(_) => WireType::Varint,
            WireValue::Fixed64(_) => WireType::Fixed64,
            WireValue::Fixed32(_) => WireType::Fixed32,
            WireValue::Bytes(_) => WireType::LengthDelimited,
        }
    }

    /// Integer payload of a non length-delimited value.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            WireValue::Varint(v) | WireValue::Fixed64(v) => Some(*v),
            WireValue::Fixed32(v) => Some(u64::from(*v)),
            WireValue::Bytes(_) => None,
        }
    }
}

/// A decoded field: number, value and the byte offset of its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireField<'a> {
    pub number: u32,
    pub value: WireValue<'a>,
    pub offset: usize,
}

/// Cursor over the fields of one serialized message.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            failed: false,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Read a base-128 varint.
    pub fn read_varint(&mut self) -> Result<u64, WireError> {
        let start = self.pos;
        let mut result: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = *self
                .buf
                .get(self.pos)
                .ok_or(WireError::Truncated { offset: start })?;
            self.pos += 1;
            result |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift >= 64 {
                return Err(WireError::VarintTooLong { offset: start });
            }
        }
        Ok(result)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(WireError::Truncated { offset: self.pos })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_fixed32(&mut self) -> Result<u32, WireError> {
        let bytes = self.take(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(raw))
    }

    pub fn read_fixed64(&mut self) -> Result<u64, WireError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], WireError> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| WireError::Truncated { offset: self.pos })?;
        self.take(len)
    }

    /// Read the next tag and its value.
    pub fn read_field(&mut self) -> Result<WireField<'a>, WireError> {
        let offset = self.pos;
        let tag = self.read_varint()?;
        let number = u32::try_from(tag >> 3).unwrap_or(u32::MAX);
        if number == 0 {
            return Err(WireError::InvalidFieldNumber { offset });
        }
        let wire_type = WireType::from_tag(tag).ok_or(WireError::UnknownWireType {
            wire_type: (tag & 0x07) as u8,
            offset,
        })?;
        let value = match wire_type {
            WireType::Varint => WireValue::Varint(self.read_varint()?),
            WireType::Fixed64 => WireValue::Fixed64(self.read_fixed64()?),
            WireType::Fixed32 => WireValue::Fixed32(self.read_fixed32()?),
            WireType::LengthDelimited => WireValue::Bytes(self.read_length_delimited()?),
        };
        Ok(WireField {
            number,
            value,
            offset,
        })
    }
}

impl<'a> Iterator for WireReader<'a> {
    type Item = Result<WireField<'a>, WireError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.is_at_end() {
            return None;
        }
        let field = self.read_field();
        self.failed = field.is_err();
        Some(field)
    }
}

/// Last occurrence of field `number` in `buf`, if any.
pub fn find_field(buf: &[u8], number: u32) -> Result<Option<WireValue<'_>>, WireError> {
    let mut found = None;
    for field in WireReader::new(buf) {
        let field = field?;
        if field.number == number {
            found = Some(field.value);
        }
    }
    Ok(found)
}

/// Undo zigzag encoding of `sint32` / `sint64` values.
pub fn zigzag_decode(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}
