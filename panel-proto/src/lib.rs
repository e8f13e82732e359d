//! Wire-level types for simulator cockpit panels.
//!
//! This crate holds everything that is pure byte handling, with no notion of
//! boards, registries or transports:
//!
//! - [`layout`]: declarative field layouts for simulator data blocks
//!   ([`Layout`], [`Field`], [`ElementType`]) and their partial-tolerant
//!   decoder
//! - [`screen`]: the 24x14 CDU character-cell buffer ([`ScreenBuffer`])
//! - [`glyph`]: translation of raw CDU symbols for a given display
//! - [`hid`]: the pin command protocol spoken by the panel controller
//! - [`pmdg`]: data area and event ids from the PMDG NG3 SDK
//!
//! # Example
//!
//! ```
//! use panel_proto::{ElementType, Field, FieldValue, Layout, Scalar};
//!
//! let layout = Layout::new(vec![
//!     Field::new("annun_exec", ElementType::Boolean).repeat(2),
//!     Field::new("v1", ElementType::Char).unit("kt"),
//! ]);
//! assert_eq!(layout.size(), 3);
//!
//! let out = layout.decode(&[1, 0, 142]);
//! assert_eq!(out.consumed, 3);
//! assert_eq!(out.fields["v1"], FieldValue::Scalar(Scalar::Char(142)));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! `#![no_std]` by default. Decoded records are heap-allocated, so the
//! `alloc` crate is required.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod glyph;
pub mod hid;
pub mod layout;
pub mod pmdg;
pub mod screen;

pub use glyph::{GlyphMap, GlyphTable, PmdgGlyphs};
pub use hid::{parse_response, Command, PinBank, ResponseError};
pub use layout::{ByteCursor, Decoded, ElementType, Field, FieldValue, Layout, LayoutDecode, Scalar, Truncation};
pub use screen::{Cell, CellColor, CellFlags, DecodeError, ScreenBuffer, SCREEN_SIZE};
