//! Pin command protocol spoken by the panel controller over HID reports.
//!
//! ```text
//! request:  [command, payload...]
//! response: [status, result...]     status != 0 is an error
//! ```
//!
//! | Command            | Code   | Payload          | Result                    |
//! |--------------------|--------|------------------|---------------------------|
//! | `TRIGGER_PIN`      | `0x03` | `offset, on/off` | none                      |
//! | `READ_PINS_MASKED` | `0x05` | none             | one byte per 8 input pins |

use heapless::Vec;

pub const CMD_TRIGGER_PIN: u8 = 0x03;
pub const CMD_READ_PINS_MASKED: u8 = 0x05;

/// Largest request we build; one full-speed HID report.
pub const MAX_REPORT_SIZE: usize = 64;

pub type Report = Vec<u8, MAX_REPORT_SIZE>;

/// A request to the panel controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Drive an output pin high or low.
    TriggerPin { offset: u8, on: bool },
    /// Read every input pin.
    ReadPinsMasked,
}

impl Command {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::TriggerPin { .. } => CMD_TRIGGER_PIN,
            Self::ReadPinsMasked => CMD_READ_PINS_MASKED,
        }
    }

    /// Frame the request.
    #[must_use]
    pub fn encode(self) -> Report {
        let mut out = Report::new();
        // Fits: at most three bytes.
        let _ = out.push(self.code());
        if let Self::TriggerPin { offset, on } = self {
            let _ = out.push(offset);
            let _ = out.push(u8::from(on));
        }
        out
    }
}

/// Error carried in a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseError {
    /// No status byte.
    Empty,
    /// Non-zero status byte.
    Status(u8),
}

impl core::fmt::Display for ResponseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty response"),
            Self::Status(code) => write!(f, "device status {:#04x}", code),
        }
    }
}

/// Check the status byte and return the result bytes.
pub fn parse_response(frame: &[u8]) -> Result<&[u8], ResponseError> {
    match frame.split_first() {
        None => Err(ResponseError::Empty),
        Some((&0, rest)) => Ok(rest),
        Some((&status, _)) => Err(ResponseError::Status(status)),
    }
}

/// Bank of input pin states as returned by `READ_PINS_MASKED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinBank<'a>(pub &'a [u8]);

impl<'a> PinBank<'a> {
    /// Level of pin `offset`, `None` past the end of the bank.
    #[must_use]
    pub fn level(&self, offset: u16) -> Option<bool> {
        let byte = self.0.get(usize::from(offset / 8))?;
        Some((byte >> (offset % 8)) & 1 == 1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len() * 8
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(offset, level)` for every pin in the bank.
    pub fn iter(&self) -> impl Iterator<Item = (u16, bool)> + 'a {
        self.0.iter().enumerate().flat_map(|(block, byte)| {
            (0..8u16).map(move |bit| (block as u16 * 8 + bit, (byte >> bit) & 1 == 1))
        })
    }
}
