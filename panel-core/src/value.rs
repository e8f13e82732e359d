//! Values flowing through the engine.

use alloc::vec::Vec;

use embassy_time::Instant;
use panel_proto::{Decoded, FieldValue};

/// Observed state of one hardware point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceValue {
    pub value: i32,
    /// `None` on the first observation.
    pub previous: Option<i32>,
    pub changed_at: Instant,
}

impl InterfaceValue {
    pub fn first(value: i32, at: Instant) -> Self {
        Self {
            value,
            previous: None,
            changed_at: at,
        }
    }

    /// The state after a transition to `value`.
    #[must_use]
    pub fn next(&self, value: i32, at: Instant) -> Self {
        Self {
            value,
            previous: Some(self.value),
            changed_at: at,
        }
    }
}

/// Payload handed to sim callbacks and UI listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Event data or an interface level.
    Int(i32),
    /// Raw client data block.
    Bytes(Vec<u8>),
    /// One field extracted from a decoded block.
    Field(FieldValue),
    /// A fully decoded block.
    Record(Decoded),
}

impl Value {
    /// Integer level for actuation. Arrays use their first element.
    #[must_use]
    pub fn level(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Field(field) => field.as_i32(),
            Self::Bytes(_) | Self::Record(_) => None,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<FieldValue> for Value {
    fn from(v: FieldValue) -> Self {
        Value::Field(v)
    }
}
