//! Hardware interfaces: the physical points of a panel.

use alloc::string::String;
use alloc::vec::Vec;

use embassy_time::Instant;
use panel_proto::PinBank;

use crate::value::InterfaceValue;

/// One detent of a multi-position switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchPosition {
    pub name: String,
    /// Input pin that reads high in this position. The position without a
    /// pin is the one reported when no other pin is high.
    pub offset: Option<u16>,
    pub value: i32,
}

impl SwitchPosition {
    pub fn new(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into(),
            offset: None,
            value,
        }
    }

    #[must_use]
    pub fn at(mut self, offset: u16) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Interface kind with its pin geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceKind {
    Button { offset: u16 },
    Switch { positions: Vec<SwitchPosition> },
    Analog { offset: u16 },
    Encoder { offset: u16 },
    Led { offset: u16, inverted: bool },
    Display { offset: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterfaceTag {
    Button,
    Switch,
    Analog,
    Encoder,
    Led,
    Display,
}

/// A physical point on the panel and its last observed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareInterface {
    pub id: String,
    pub kind: InterfaceKind,
    pub value: Option<InterfaceValue>,
}

impl HardwareInterface {
    pub fn new(id: impl Into<String>, kind: InterfaceKind) -> Self {
        Self {
            id: id.into(),
            kind,
            value: None,
        }
    }

    pub fn button(id: impl Into<String>, offset: u16) -> Self {
        Self::new(id, InterfaceKind::Button { offset })
    }

    pub fn led(id: impl Into<String>, offset: u16) -> Self {
        Self::new(
            id,
            InterfaceKind::Led {
                offset,
                inverted: false,
            },
        )
    }

    /// An LED that lights when driven low.
    pub fn inverted_led(id: impl Into<String>, offset: u16) -> Self {
        Self::new(
            id,
            InterfaceKind::Led {
                offset,
                inverted: true,
            },
        )
    }

    pub fn switch(id: impl Into<String>, positions: Vec<SwitchPosition>) -> Self {
        Self::new(id, InterfaceKind::Switch { positions })
    }

    pub fn tag(&self) -> InterfaceTag {
        match self.kind {
            InterfaceKind::Button { .. } => InterfaceTag::Button,
            InterfaceKind::Switch { .. } => InterfaceTag::Switch,
            InterfaceKind::Analog { .. } => InterfaceTag::Analog,
            InterfaceKind::Encoder { .. } => InterfaceTag::Encoder,
            InterfaceKind::Led { .. } => InterfaceTag::Led,
            InterfaceKind::Display { .. } => InterfaceTag::Display,
        }
    }

    pub fn current(&self) -> Option<i32> {
        self.value.map(|v| v.value)
    }

    /// Value of this interface in a masked pin read, if it is an input the
    /// read covers.
    pub fn sample(&self, pins: &PinBank<'_>) -> Option<i32> {
        match &self.kind {
            InterfaceKind::Button { offset } => pins.level(*offset).map(i32::from),
            InterfaceKind::Switch { positions } => {
                let engaged = positions.iter().find(|p| match p.offset {
                    Some(offset) => pins.level(offset) == Some(true),
                    None => false,
                });
                engaged
                    .or_else(|| positions.iter().find(|p| p.offset.is_none()))
                    .map(|p| p.value)
            }
            _ => None,
        }
    }

    /// Record `value`. Returns `true` when it differs from the stored value.
    pub fn observe(&mut self, value: i32, at: Instant) -> bool {
        let next = match self.value {
            Some(current) if current.value == value => return false,
            Some(current) => current.next(value, at),
            None => InterfaceValue::first(value, at),
        };
        self.value = Some(next);
        true
    }
}
