//! Text output.
//!
//! Input is decoded into codepoints. ASCII goes straight to the display, Russian letters that
//! have a Latin twin in the ROM are swapped for it, and everything else is routed through the
//! glyph cache.

use core::fmt::{self, Write};

use heapless::String;
use ufmt_write::uWrite;

use crate::error::Error;
use crate::glyphs::{self, FALLBACK};
use crate::surface::DeviceSurface;
use crate::Lcd;

/// Capacity of the buffer formatted output is rendered into.
pub const FORMAT_BUFFER_LEN: usize = 128;

/// How bytes passed to [`Lcd::print`] are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Encoding {
    /// Every byte is a character code of the display ROM.
    Raw,
    /// Windows-1251, the single byte Cyrillic codepage.
    Cp1251,
    #[default]
    Utf8,
}

/// One decoded character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unit {
    /// Code the ROM can display as is.
    Native(u8),
    /// Codepoint beyond ASCII.
    Extended(u32),
    /// Broken multi-byte sequence.
    Malformed,
}

/// Decode the character at the start of `bytes` (not empty), returns it together with the
/// number of bytes it occupied.
pub(crate) fn decode(encoding: Encoding, bytes: &[u8]) -> (Unit, usize) {
    let lead = bytes[0];
    match encoding {
        Encoding::Raw => (Unit::Native(lead), 1),
        Encoding::Cp1251 => (decode_cp1251(lead), 1),
        Encoding::Utf8 => decode_utf8(bytes),
    }
}

fn decode_cp1251(byte: u8) -> Unit {
    match byte {
        0xc0..=0xff => Unit::Extended(0x0410 + u32::from(byte - 0xc0)),
        0xa8 => Unit::Extended(0x0401),
        0xb8 => Unit::Extended(0x0451),
        0xb0 => Unit::Extended(0x00b0),
        _ => Unit::Native(byte),
    }
}

fn decode_utf8(bytes: &[u8]) -> (Unit, usize) {
    let lead = bytes[0];
    let (len, min, mut codepoint) = match lead {
        0x00..=0x7f => return (Unit::Native(lead), 1),
        0xc2..=0xdf => (2, 0x80, u32::from(lead & 0x1f)),
        0xe0..=0xef => (3, 0x800, u32::from(lead & 0x0f)),
        0xf0..=0xf4 => (4, 0x1_0000, u32::from(lead & 0x07)),
        // Not a lead byte, print it as a ROM code.
        _ => return (Unit::Native(lead), 1),
    };
    for idx in 1..len {
        match bytes.get(idx) {
            Some(&b) if b & 0xc0 == 0x80 => codepoint = (codepoint << 6) | u32::from(b & 0x3f),
            _ => return (Unit::Malformed, idx),
        }
    }
    if codepoint < min || char::from_u32(codepoint).is_none() {
        return (Unit::Malformed, len);
    }
    (Unit::Extended(codepoint), len)
}

/// Leading padding and the part of `text` that fills a field of `width` characters. Text that
/// is too long loses characters at the front.
pub(crate) fn fit_field(text: &str, width: usize) -> (usize, &str) {
    let rendered = text.chars().count();
    if rendered <= width {
        return (width - rendered, text);
    }
    let start = text
        .char_indices()
        .nth(rendered - width)
        .map_or(text.len(), |(idx, _)| idx);
    (0, &text[start..])
}

/// Formats into a fixed buffer, silently dropping what does not fit.
struct Truncating<'a, const N: usize>(&'a mut String<N>);

impl<const N: usize> Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

fn format(args: fmt::Arguments<'_>) -> String<FORMAT_BUFFER_LEN> {
    let mut buf = String::new();
    // Truncating never fails, only a Display impl could.
    let _ = Truncating(&mut buf).write_fmt(args);
    buf
}

impl<S> Lcd<S>
where
    S: DeviceSurface,
{
    fn put(&mut self, unit: Unit) -> Result<(), Error<S::Error>> {
        match unit {
            Unit::Native(code) => self.write_raw(code),
            Unit::Extended(codepoint) => self.put_codepoint(codepoint),
            Unit::Malformed => {
                self.unsupported = self.unsupported.saturating_add(1);
                self.write_raw(FALLBACK)
            }
        }
    }

    fn put_codepoint(&mut self, codepoint: u32) -> Result<(), Error<S::Error>> {
        if let Ok(code) = u8::try_from(codepoint) {
            if code.is_ascii() {
                return self.write_raw(code);
            }
        }
        match glyphs::transliterate(codepoint) {
            Some(code) => self.write_raw(code),
            None => self.emit(codepoint).map(|_| ()),
        }
    }

    /// Write `bytes`, decoded as configured with [`Lcd::with_encoding`], at the cursor.
    ///
    /// Returns the number of bytes consumed, which is all of them.
    pub fn print(&mut self, bytes: &[u8]) -> Result<usize, Error<S::Error>> {
        let mut pos = 0;
        while pos < bytes.len() {
            let (unit, used) = decode(self.encoding, &bytes[pos..]);
            self.put(unit)?;
            pos += used;
        }
        Ok(pos)
    }

    /// Write string to display.
    pub fn print_str(&mut self, text: &str) -> Result<usize, Error<S::Error>> {
        for c in text.chars() {
            self.put_codepoint(c as u32)?;
        }
        Ok(text.len())
    }

    /// [`Lcd::print`] starting at (`col`, `row`).
    pub fn print_at(&mut self, col: u8, row: u8, bytes: &[u8]) -> Result<usize, Error<S::Error>> {
        self.set_cursor(col, row)?;
        self.print(bytes)
    }

    /// Write formatted text, e.g. `lcd.print_fmt(format_args!("{} rpm", rpm))`.
    ///
    /// Output longer than [`FORMAT_BUFFER_LEN`] bytes is cut off. Returns the number of bytes
    /// the formatted text had.
    pub fn print_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<usize, Error<S::Error>> {
        let text = format(args);
        self.print_str(&text)
    }

    /// Write formatted text into a field of `width` characters at (`col`, `row`).
    ///
    /// Shorter text is right-aligned with spaces, longer text keeps its last `width` characters.
    /// Returns the number of characters written.
    pub fn print_field(
        &mut self,
        col: u8,
        row: u8,
        width: u8,
        args: fmt::Arguments<'_>,
    ) -> Result<usize, Error<S::Error>> {
        let text = format(args);
        let (padding, tail) = fit_field(&text, usize::from(width));
        self.set_cursor(col, row)?;
        for _ in 0..padding {
            self.write_raw(b' ')?;
        }
        self.print_str(tail)?;
        Ok(padding + tail.chars().count())
    }
}

impl<S> uWrite for Lcd<S>
where
    S: DeviceSurface,
{
    type Error = Error<S::Error>;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.print_str(s).map(|_| ())
    }
}

impl<S> Write for Lcd<S>
where
    S: DeviceSurface,
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.print_str(s).map(|_| ()).map_err(|_| fmt::Error)
    }
}
