//! Declarative binary layouts for simulator data blocks.
//!
//! A [`Layout`] is an ordered list of [`Field`]s. Decoding walks the fields
//! with a forward-only [`ByteCursor`]; all multi-byte values are
//! little-endian, matching what the simulator writes into client data areas.
//!
//! Short buffers are not an error. Simulator blocks can arrive truncated
//! while an aircraft is loading, so [`Layout::decode`] returns whatever was
//! fully covered and reports the shortfall in [`LayoutDecode::truncated`].

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::screen::ScreenBuffer;

/// Element type of a layout field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ElementType {
    Boolean,
    Char,
    Float32,
    Float64,
    Int16,
    UInt16,
    Int32,
    /// Opaque blob of the given byte count, copied verbatim.
    Custom(usize),
}

impl ElementType {
    /// Byte width of a single element.
    #[inline]
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Boolean | Self::Char => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Float32 | Self::Int32 => 4,
            Self::Float64 => 8,
            Self::Custom(size) => size,
        }
    }
}

/// One named entry in a [`Layout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// Informational only, never used by the decoder.
    pub unit: Option<String>,
    pub element: ElementType,
    pub repeat: usize,
}

impl Field {
    /// A single-element field.
    pub fn new(name: impl Into<String>, element: ElementType) -> Self {
        Self {
            name: name.into(),
            unit: None,
            element,
            repeat: 1,
        }
    }

    /// Set the repeat count. A count other than 1 decodes to an array.
    #[must_use]
    pub fn repeat(mut self, repeat: usize) -> Self {
        self.repeat = repeat;
        self
    }

    #[must_use]
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Bytes this field occupies on the wire.
    ///
    /// Custom blobs occupy their declared size once; the repeat count does
    /// not apply to them.
    #[must_use]
    pub const fn byte_size(&self) -> usize {
        match self.element {
            ElementType::Custom(size) => size,
            element => self.repeat * element.width(),
        }
    }
}

/// One decoded element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Char(u8),
    F32(f32),
    F64(f64),
    I16(i16),
    U16(u16),
    I32(i32),
}

impl Scalar {
    /// Integer view of the element, used for pin levels and event data.
    ///
    /// Floats are truncated toward zero.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Bool(b) => i32::from(b),
            Self::Char(c) => i32::from(c),
            Self::F32(v) => v as i32,
            Self::F64(v) => v as i32,
            Self::I16(v) => i32::from(v),
            Self::U16(v) => i32::from(v),
            Self::I32(v) => v,
        }
    }
}

/// Decoded value of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    Array(Vec<Scalar>),
    Bytes(Vec<u8>),
    Screen(alloc::boxed::Box<ScreenBuffer>),
}

impl FieldValue {
    /// Element at `position` of an array value.
    #[must_use]
    pub fn element(&self, position: usize) -> Option<Scalar> {
        match self {
            Self::Array(items) => items.get(position).copied(),
            _ => None,
        }
    }

    /// Integer view: scalars directly, arrays through their first element.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Scalar(s) => Some(s.as_i32()),
            Self::Array(items) => items.first().map(|s| s.as_i32()),
            Self::Bytes(_) | Self::Screen(_) => None,
        }
    }
}

/// Field name to decoded value.
pub type Decoded = BTreeMap<String, FieldValue>;

/// Forward-only reader over a byte slice.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Take `n` bytes, or nothing if fewer remain.
    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Some(out)
    }

    /// Take everything that is left.
    pub fn take_rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.pos..];
        self.pos = self.buf.len();
        out
    }

    fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Some(out)
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    /// Read one element of a fixed-width type.
    ///
    /// Returns `None` for [`ElementType::Custom`], which is not a scalar.
    pub fn read_scalar(&mut self, element: ElementType) -> Option<Scalar> {
        Some(match element {
            ElementType::Boolean => Scalar::Bool(self.read_u8()? != 0),
            ElementType::Char => Scalar::Char(self.read_u8()?),
            ElementType::Int16 => Scalar::I16(i16::from_le_bytes(self.array()?)),
            ElementType::UInt16 => Scalar::U16(u16::from_le_bytes(self.array()?)),
            ElementType::Int32 => Scalar::I32(i32::from_le_bytes(self.array()?)),
            ElementType::Float32 => Scalar::F32(f32::from_le_bytes(self.array()?)),
            ElementType::Float64 => Scalar::F64(f64::from_le_bytes(self.array()?)),
            ElementType::Custom(_) => return None,
        })
    }
}

/// Where a short buffer ran out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    /// First field that could not be fully decoded.
    pub field: String,
    /// Bytes that field needed.
    pub needed: usize,
    /// Bytes that were left when the field started.
    pub available: usize,
}

/// Result of [`Layout::decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDecode {
    pub fields: Decoded,
    /// Cursor advance. Equals [`Layout::size`] for a complete decode.
    pub consumed: usize,
    pub truncated: Option<Truncation>,
}

impl LayoutDecode {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.truncated.is_none()
    }
}

/// Ordered list of fields describing a binary block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    fields: Vec<Field>,
}

impl Layout {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Total wire size of the layout.
    #[must_use]
    pub fn size(&self) -> usize {
        self.fields.iter().map(Field::byte_size).sum()
    }

    /// Decode `buf` against this layout.
    ///
    /// Every field gets an entry. A field cut short by the end of the buffer
    /// keeps the elements read so far; every later field decodes to an empty
    /// array.
    pub fn decode(&self, buf: &[u8]) -> LayoutDecode {
        let mut cursor = ByteCursor::new(buf);
        let mut fields = Decoded::new();
        let mut truncated: Option<Truncation> = None;

        for field in &self.fields {
            if truncated.is_some() {
                fields.insert(field.name.clone(), FieldValue::Array(Vec::new()));
                continue;
            }

            let available = cursor.remaining();
            let value = match field.element {
                ElementType::Custom(size) => match cursor.take(size) {
                    Some(bytes) => FieldValue::Bytes(bytes.to_vec()),
                    None => FieldValue::Bytes(cursor.take_rest().to_vec()),
                },
                element => {
                    let mut items = Vec::with_capacity(field.repeat);
                    for _ in 0..field.repeat {
                        match cursor.read_scalar(element) {
                            Some(item) => items.push(item),
                            None => break,
                        }
                    }
                    if field.repeat == 1 && items.len() == 1 {
                        FieldValue::Scalar(items[0])
                    } else {
                        FieldValue::Array(items)
                    }
                }
            };

            if available < field.byte_size() {
                truncated = Some(Truncation {
                    field: field.name.clone(),
                    needed: field.byte_size(),
                    available,
                });
            }
            fields.insert(field.name.clone(), value);
        }

        LayoutDecode {
            fields,
            consumed: cursor.position(),
            truncated,
        }
    }
}
