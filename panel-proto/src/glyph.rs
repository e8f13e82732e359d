//! Symbol translation for CDU cells.
//!
//! [`ScreenBuffer`](crate::screen::ScreenBuffer) keeps raw symbol bytes.
//! Turning them into something a display can draw is a separate step, since
//! every consumer (host text rendering, a character LCD with its own font
//! ROM) has different glyph codes for the special symbols.

/// Placeholder box drawn by the CDU for empty entry fields.
pub const SYMBOL_BOX: u8 = 0xEA;
pub const SYMBOL_ARROW_LEFT: u8 = 0xA1;
pub const SYMBOL_ARROW_RIGHT: u8 = 0xA2;
pub const SYMBOL_ARROW_UP: u8 = 0xA3;
pub const SYMBOL_ARROW_DOWN: u8 = 0xA4;

/// Maps a raw cell symbol to a displayable character.
pub trait GlyphMap {
    fn glyph(&self, symbol: u8) -> char;
}

/// Unicode rendering of the CDU character set.
#[derive(Debug, Clone, Copy, Default)]
pub struct PmdgGlyphs;

impl GlyphMap for PmdgGlyphs {
    fn glyph(&self, symbol: u8) -> char {
        match symbol {
            SYMBOL_ARROW_LEFT => '←',
            SYMBOL_ARROW_RIGHT => '→',
            SYMBOL_ARROW_UP => '↑',
            SYMBOL_ARROW_DOWN => '↓',
            SYMBOL_BOX => '□',
            0x20..=0x7E => symbol as char,
            _ => '?',
        }
    }
}

/// Byte-to-byte remap for displays with their own glyph codes.
///
/// Symbols without an entry pass through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct GlyphTable<'a> {
    entries: &'a [(u8, u8)],
}

impl<'a> GlyphTable<'a> {
    pub const fn new(entries: &'a [(u8, u8)]) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn remap(&self, symbol: u8) -> u8 {
        self.entries
            .iter()
            .find(|(from, _)| *from == symbol)
            .map_or(symbol, |(_, to)| *to)
    }
}

impl GlyphMap for GlyphTable<'_> {
    fn glyph(&self, symbol: u8) -> char {
        self.remap(symbol) as char
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pmdg_specials() {
        assert_eq!(PmdgGlyphs.glyph(SYMBOL_ARROW_LEFT), '←');
        assert_eq!(PmdgGlyphs.glyph(SYMBOL_ARROW_DOWN), '↓');
        assert_eq!(PmdgGlyphs.glyph(SYMBOL_BOX), '□');
        assert_eq!(PmdgGlyphs.glyph(b'K'), 'K');
        assert_eq!(PmdgGlyphs.glyph(0x05), '?');
    }

    #[test]
    fn test_table_remap() {
        // HD44780 ROM A00: arrows at 0x7E/0x7F
        const LCD: GlyphTable<'static> =
            GlyphTable::new(&[(SYMBOL_ARROW_RIGHT, 0x7E), (SYMBOL_ARROW_LEFT, 0x7F)]);
        assert_eq!(LCD.remap(SYMBOL_ARROW_RIGHT), 0x7E);
        assert_eq!(LCD.remap(SYMBOL_ARROW_LEFT), 0x7F);
        assert_eq!(LCD.remap(b'A'), b'A');
        assert_eq!(LCD.glyph(b'A'), 'A');
    }
}
