//! Error types.
//!
//! Configuration and transport errors are returned to whoever made the
//! call. Callback errors never cross a dispatch boundary; they are logged
//! and reported through [`Dispatch`](crate::registry::Dispatch) instead.

use alloc::string::String;
use core::fmt;

use panel_proto::{DecodeError, ResponseError};

/// Invalid use of ids or descriptor kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Id already registered.
    DuplicateId,
    /// No descriptor, item or interface with that id.
    UnknownId,
    /// The id resolves to the wrong descriptor or interface kind.
    WrongKind,
    /// Item has neither an LED nor a write descriptor.
    NotTriggerable,
    /// A listener is already attached to the item.
    ListenerExists,
    /// Pin offset does not fit the command frame.
    OffsetOutOfRange,
    DuplicateBoard,
    UnknownBoard,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId => write!(f, "id already registered"),
            Self::UnknownId => write!(f, "unknown id"),
            Self::WrongKind => write!(f, "wrong kind for this operation"),
            Self::NotTriggerable => write!(f, "item is not triggerable"),
            Self::ListenerExists => write!(f, "listener already attached"),
            Self::OffsetOutOfRange => write!(f, "pin offset out of range"),
            Self::DuplicateBoard => write!(f, "board already registered"),
            Self::UnknownBoard => write!(f, "unknown board"),
        }
    }
}

/// Failure talking to the simulator or the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Device not open.
    NotOpen,
    /// Simulator not connected.
    NotConnected,
    ConnectFailed,
    /// Vendor or product id is zero.
    InvalidDevice,
    Io,
    /// Response had no status byte.
    EmptyResponse,
    /// Device answered with a non-zero status.
    Status(u8),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOpen => write!(f, "device not open"),
            Self::NotConnected => write!(f, "simulator not connected"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::InvalidDevice => write!(f, "invalid vendor or product id"),
            Self::Io => write!(f, "i/o error"),
            Self::EmptyResponse => write!(f, "empty response"),
            Self::Status(code) => write!(f, "device status {:#04x}", code),
        }
    }
}

impl From<ResponseError> for TransportError {
    fn from(err: ResponseError) -> Self {
        match err {
            ResponseError::Empty => TransportError::EmptyResponse,
            ResponseError::Status(code) => TransportError::Status(code),
        }
    }
}

/// Error raised inside a callback or listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackError {
    message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<DecodeError> for CallbackError {
    fn from(err: DecodeError) -> Self {
        Self::new(alloc::format!("{}", err))
    }
}

/// Any error returned by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Config(ConfigError),
    Transport(TransportError),
    Decode(DecodeError),
    Callback(CallbackError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {}", e),
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Decode(e) => write!(f, "decode error: {}", e),
            Self::Callback(e) => write!(f, "callback error: {}", e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Transport(err)
    }
}

impl From<ResponseError> for Error {
    fn from(err: ResponseError) -> Self {
        Error::Transport(err.into())
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Decode(err)
    }
}

impl From<CallbackError> for Error {
    fn from(err: CallbackError) -> Self {
        Error::Callback(err)
    }
}
