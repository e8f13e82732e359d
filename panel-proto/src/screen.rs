//! CDU character-cell screen buffer.
//!
//! Wire format, as broadcast by the simulator's CDU extension:
//!
//! ```text
//! cells[COLUMNS][ROWS] of { symbol: u8, color: u8, flags: u8 }
//! powered: u8
//! ```
//!
//! Cells are stored column-major: the cell at (row `r`, column `c`) starts
//! at byte `(c * ROWS + r) * 3`. Decoding is lossless; symbol codes are kept
//! as raw bytes and translated by a [`GlyphMap`](crate::glyph::GlyphMap).

use core::ops::{BitAnd, BitOr};

use crate::glyph::GlyphMap;

pub const CDU_COLUMNS: usize = 24;
pub const CDU_ROWS: usize = 14;
pub const CELL_SIZE: usize = 3;
pub const CDU_CELLS: usize = CDU_COLUMNS * CDU_ROWS;
/// Cells plus the trailing powered byte.
pub const SCREEN_SIZE: usize = CDU_CELLS * CELL_SIZE + 1;

/// Cell foreground color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CellColor {
    #[default]
    White,
    Cyan,
    Green,
    Magenta,
    Amber,
    Red,
    /// Out-of-range code, kept so decoding stays lossless.
    Other(u8),
}

impl CellColor {
    #[must_use]
    pub const fn from_byte(b: u8) -> Self {
        match b {
            0 => Self::White,
            1 => Self::Cyan,
            2 => Self::Green,
            3 => Self::Magenta,
            4 => Self::Amber,
            5 => Self::Red,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::White => 0,
            Self::Cyan => 1,
            Self::Green => 2,
            Self::Magenta => 3,
            Self::Amber => 4,
            Self::Red => 5,
            Self::Other(b) => b,
        }
    }
}

/// Cell attribute bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CellFlags(pub u8);

impl CellFlags {
    pub const SMALL_FONT: Self = Self(0x01);
    pub const REVERSE: Self = Self(0x02);
    /// Dimmed, unused entry.
    pub const UNUSED: Self = Self(0x04);

    pub const NONE: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn contains(self, flag: CellFlags) -> bool {
        (self.0 & flag.0) == flag.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for CellFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for CellFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// One character cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cell {
    pub symbol: u8,
    pub color: CellColor,
    pub flags: CellFlags,
}

impl Cell {
    pub const BLANK: Self = Self {
        symbol: b' ',
        color: CellColor::White,
        flags: CellFlags::NONE,
    };
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

/// Error decoding a fixed-geometry buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    TooShort { expected: usize, actual: usize },
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooShort { expected, actual } => {
                write!(f, "buffer too short: expected {} bytes, got {}", expected, actual)
            }
        }
    }
}

/// Decoded CDU screen: `CDU_ROWS` x `CDU_COLUMNS` cells and a power flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenBuffer {
    cells: [[Cell; CDU_COLUMNS]; CDU_ROWS],
    pub powered: bool,
}

impl Default for ScreenBuffer {
    fn default() -> Self {
        Self::blank()
    }
}

impl ScreenBuffer {
    /// Unpowered screen of blank cells.
    #[must_use]
    pub const fn blank() -> Self {
        Self {
            cells: [[Cell::BLANK; CDU_COLUMNS]; CDU_ROWS],
            powered: false,
        }
    }

    /// Decode a screen from the start of `buf`.
    ///
    /// Bytes beyond [`SCREEN_SIZE`] are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < SCREEN_SIZE {
            return Err(DecodeError::TooShort {
                expected: SCREEN_SIZE,
                actual: buf.len(),
            });
        }

        let mut screen = Self::blank();
        let mut chunks = buf[..CDU_CELLS * CELL_SIZE].chunks_exact(CELL_SIZE);
        for col in 0..CDU_COLUMNS {
            for row in 0..CDU_ROWS {
                if let Some(raw) = chunks.next() {
                    screen.cells[row][col] = Cell {
                        symbol: raw[0],
                        color: CellColor::from_byte(raw[1]),
                        flags: CellFlags(raw[2]),
                    };
                }
            }
        }
        screen.powered = buf[CDU_CELLS * CELL_SIZE] == 1;
        Ok(screen)
    }

    /// Write the screen back into wire format.
    pub fn encode(&self, out: &mut [u8; SCREEN_SIZE]) {
        for col in 0..CDU_COLUMNS {
            for row in 0..CDU_ROWS {
                let cell = self.cells[row][col];
                let at = (col * CDU_ROWS + row) * CELL_SIZE;
                out[at] = cell.symbol;
                out[at + 1] = cell.color.to_byte();
                out[at + 2] = cell.flags.0;
            }
        }
        out[SCREEN_SIZE - 1] = u8::from(self.powered);
    }

    /// Cell at (`row`, `col`), `None` when out of range.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row)?.get(col)
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.cells.get_mut(row)?.get_mut(col)
    }

    pub fn row(&self, row: usize) -> Option<&[Cell; CDU_COLUMNS]> {
        self.cells.get(row)
    }

    /// Write `text` into `row` starting at `col`, clipping at the edge.
    pub fn put_str(&mut self, row: usize, col: usize, text: &[u8], color: CellColor) {
        let Some(cells) = self.cells.get_mut(row) else {
            return;
        };
        for (cell, &symbol) in cells.iter_mut().skip(col).zip(text) {
            *cell = Cell {
                symbol,
                color,
                flags: CellFlags::NONE,
            };
        }
    }

    /// Render `row` as text through `glyphs`.
    #[must_use]
    pub fn line<G: GlyphMap + ?Sized>(&self, row: usize, glyphs: &G) -> alloc::string::String {
        self.cells
            .get(row)
            .map(|cells| cells.iter().map(|c| glyphs.glyph(c.symbol)).collect())
            .unwrap_or_default()
    }

    /// Render every row.
    pub fn lines<G: GlyphMap + ?Sized>(&self, glyphs: &G) -> alloc::vec::Vec<alloc::string::String> {
        (0..CDU_ROWS).map(|row| self.line(row, glyphs)).collect()
    }
}
