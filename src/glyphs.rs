//! Static character tables for letters outside of the ROM font.
//!
//! The ROM of the common A00 controller variant holds ASCII plus Japanese katakana. Letters of the
//! Russian alphabet that look like a Latin letter are transliterated to it for free, the others
//! are drawn by custom glyphs that are loaded into CGRAM on demand.

use crate::GLYPH_ROWS;

/// Character printed for codepoints that have neither a ROM lookalike nor a glyph.
pub const FALLBACK: u8 = b'?';

/// ROM code of the degree sign on A00 controllers.
const ROM_DEGREE: u8 = 0xdf;

/// 5x8 bitmap of an extended character, one byte per pixel row, bit 4 is the leftmost pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphImage {
    pub codepoint: u32,
    pub rows: [u8; GLYPH_ROWS],
}

const fn g(codepoint: u32, rows: [u8; GLYPH_ROWS]) -> GlyphImage {
    GlyphImage { codepoint, rows }
}

/// Sorted by codepoint.
pub static GLYPHS: &[GlyphImage] = &[
    g(0x0411, [0b11111, 0b10000, 0b10000, 0b11110, 0b10001, 0b10001, 0b11110, 0b00000]), // Б
    g(0x0413, [0b11111, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b00000]), // Г
    g(0x0414, [0b00110, 0b01010, 0b01010, 0b01010, 0b01010, 0b01010, 0b11111, 0b10001]), // Д
    g(0x0416, [0b10101, 0b10101, 0b10101, 0b01110, 0b10101, 0b10101, 0b10101, 0b00000]), // Ж
    g(0x0417, [0b01110, 0b10001, 0b00001, 0b00110, 0b00001, 0b10001, 0b01110, 0b00000]), // З
    g(0x0418, [0b10001, 0b10001, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b00000]), // И
    g(0x0419, [0b10101, 0b10001, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b00000]), // Й
    g(0x041b, [0b00111, 0b01001, 0b01001, 0b01001, 0b01001, 0b01001, 0b10001, 0b00000]), // Л
    g(0x041f, [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b00000]), // П
    g(0x0423, [0b10001, 0b10001, 0b10001, 0b01111, 0b00001, 0b10001, 0b01110, 0b00000]), // У
    g(0x0424, [0b00100, 0b01110, 0b10101, 0b10101, 0b10101, 0b01110, 0b00100, 0b00000]), // Ф
    g(0x0426, [0b10010, 0b10010, 0b10010, 0b10010, 0b10010, 0b10010, 0b11111, 0b00001]), // Ц
    g(0x0427, [0b10001, 0b10001, 0b10001, 0b01111, 0b00001, 0b00001, 0b00001, 0b00000]), // Ч
    g(0x0428, [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b11111, 0b00000]), // Ш
    g(0x0429, [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b11111, 0b00001]), // Щ
    g(0x042a, [0b11000, 0b01000, 0b01000, 0b01110, 0b01001, 0b01001, 0b01110, 0b00000]), // Ъ
    g(0x042b, [0b10001, 0b10001, 0b10001, 0b11101, 0b10011, 0b10011, 0b11101, 0b00000]), // Ы
    g(0x042c, [0b10000, 0b10000, 0b10000, 0b11110, 0b10001, 0b10001, 0b11110, 0b00000]), // Ь
    g(0x042d, [0b01110, 0b10001, 0b00001, 0b00111, 0b00001, 0b10001, 0b01110, 0b00000]), // Э
    g(0x042e, [0b10010, 0b10101, 0b10101, 0b11101, 0b10101, 0b10101, 0b10010, 0b00000]), // Ю
    g(0x042f, [0b01111, 0b10001, 0b10001, 0b01111, 0b00101, 0b01001, 0b10001, 0b00000]), // Я
    g(0x0431, [0b00011, 0b01100, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110, 0b00000]), // б
    g(0x0432, [0b00000, 0b00000, 0b11110, 0b10001, 0b11110, 0b10001, 0b11110, 0b00000]), // в
    g(0x0433, [0b00000, 0b00000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000, 0b00000]), // г
    g(0x0434, [0b00000, 0b00000, 0b00110, 0b01010, 0b01010, 0b01010, 0b11111, 0b10001]), // д
    g(0x0436, [0b00000, 0b00000, 0b10101, 0b10101, 0b01110, 0b10101, 0b10101, 0b00000]), // ж
    g(0x0437, [0b00000, 0b00000, 0b01110, 0b10001, 0b00110, 0b10001, 0b01110, 0b00000]), // з
    g(0x0438, [0b00000, 0b00000, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b00000]), // и
    g(0x0439, [0b01010, 0b00100, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b00000]), // й
    g(0x043a, [0b00000, 0b00000, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b00000]), // к
    g(0x043b, [0b00000, 0b00000, 0b00111, 0b01001, 0b01001, 0b01001, 0b10001, 0b00000]), // л
    g(0x043c, [0b00000, 0b00000, 0b10001, 0b11011, 0b10101, 0b10001, 0b10001, 0b00000]), // м
    g(0x043d, [0b00000, 0b00000, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b00000]), // н
    g(0x043f, [0b00000, 0b00000, 0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b00000]), // п
    g(0x0442, [0b00000, 0b00000, 0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000]), // т
    g(0x0444, [0b00000, 0b00000, 0b00100, 0b01110, 0b10101, 0b01110, 0b00100, 0b00000]), // ф
    g(0x0446, [0b00000, 0b00000, 0b10010, 0b10010, 0b10010, 0b10010, 0b11111, 0b00001]), // ц
    g(0x0447, [0b00000, 0b00000, 0b10001, 0b10001, 0b01111, 0b00001, 0b00001, 0b00000]), // ч
    g(0x0448, [0b00000, 0b00000, 0b10101, 0b10101, 0b10101, 0b10101, 0b11111, 0b00000]), // ш
    g(0x0449, [0b00000, 0b00000, 0b10101, 0b10101, 0b10101, 0b10101, 0b11111, 0b00001]), // щ
    g(0x044a, [0b00000, 0b00000, 0b11000, 0b01000, 0b01110, 0b01001, 0b01110, 0b00000]), // ъ
    g(0x044b, [0b00000, 0b00000, 0b10001, 0b10001, 0b11101, 0b10011, 0b11101, 0b00000]), // ы
    g(0x044c, [0b00000, 0b00000, 0b10000, 0b10000, 0b11110, 0b10001, 0b11110, 0b00000]), // ь
    g(0x044d, [0b00000, 0b00000, 0b01110, 0b10001, 0b00111, 0b10001, 0b01110, 0b00000]), // э
    g(0x044e, [0b00000, 0b00000, 0b10010, 0b10101, 0b11101, 0b10101, 0b10010, 0b00000]), // ю
    g(0x044f, [0b00000, 0b00000, 0b01111, 0b10001, 0b01111, 0b00101, 0b01001, 0b00000]), // я
    g(0x0451, [0b01010, 0b00000, 0b01110, 0b10001, 0b11111, 0b10000, 0b01111, 0b00000]), // ё
];

/// Bitmap for `codepoint`, if the table has one.
pub fn bitmap(codepoint: u32) -> Option<&'static [u8; GLYPH_ROWS]> {
    GLYPHS
        .binary_search_by_key(&codepoint, |image| image.codepoint)
        .ok()
        .map(|idx| &GLYPHS[idx].rows)
}

/// ROM character that looks identical to `codepoint`.
pub fn transliterate(codepoint: u32) -> Option<u8> {
    let rom = match codepoint {
        0x0410 => b'A',
        0x0412 => b'B',
        0x0401 | 0x0415 => b'E',
        0x041a => b'K',
        0x041c => b'M',
        0x041d => b'H',
        0x041e => b'O',
        0x0420 => b'P',
        0x0421 => b'C',
        0x0422 => b'T',
        0x0425 => b'X',
        0x0430 => b'a',
        0x0435 => b'e',
        0x043e => b'o',
        0x0440 => b'p',
        0x0441 => b'c',
        0x0443 => b'y',
        0x0445 => b'x',
        0x00b0 => ROM_DEGREE,
        _ => return None,
    };
    Some(rom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sorted_and_unique() {
        assert!(GLYPHS.windows(2).all(|w| w[0].codepoint < w[1].codepoint));
    }

    #[test]
    fn test_bitmaps_fit_cell_width() {
        for image in GLYPHS {
            assert!(image.rows.iter().all(|row| row & !0x1f == 0));
        }
    }

    #[test]
    fn test_no_overlap_with_transliteration() {
        for image in GLYPHS {
            assert_eq!(transliterate(image.codepoint), None);
        }
    }

    #[test]
    fn test_covers_russian_alphabet() {
        let upper = 0x0410..=0x042f;
        let lower = 0x0430..=0x044f;
        for cp in upper.chain(lower).chain([0x0401, 0x0451]) {
            assert!(
                bitmap(cp).is_some() || transliterate(cp).is_some(),
                "U+{:04X} not renderable",
                cp
            );
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(bitmap('Б' as u32), Some(&GLYPHS[0].rows));
        assert_eq!(bitmap('€' as u32), None);
        assert_eq!(transliterate('°' as u32), Some(0xdf));
        assert_eq!(transliterate('с' as u32), Some(b'c'));
    }
}
