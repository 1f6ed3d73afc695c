#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
//! Driver for HD44780 character LCDs (16x2, 20x4, ...) connected through a PCF8574 I2C backpack
//! like [this one]. Besides the usual text and cursor commands it multiplexes the eight
//! programmable glyph slots (CGRAM) of the controller for two purposes:
//!
//! * a glyph cache that renders letters missing from the ROM font (the Russian alphabet ships
//!   with the crate) by programming slots on demand and evicting the least recently used one,
//! * bar graphs with single pixel resolution, built from a family of partially filled glyphs.
//!
//! Both share the same eight slots, so activating one invalidates the other.
//!
//! It requires an I2C instance implementing [`embedded_hal::i2c::I2c`] and an instance to delay
//! execution with [`embedded_hal::delay::DelayNs`]. Other transports can be plugged in by
//! implementing [`DeviceSurface`].
//!
//! Usage:
//! ```ignore
//! const LCD_ADDRESS: u8 = 0x27; // Address depends on hardware, see link below
//!
//! let mut i2c = /* anything implementing embedded_hal::i2c::I2c */;
//! let mut delay = /* anything implementing embedded_hal::delay::DelayNs */;
//!
//! let surface = hd44780_glyphs::I2cSurface::new(&mut i2c, &mut delay).with_address(LCD_ADDRESS);
//! let mut lcd = hd44780_glyphs::Lcd::new(surface)
//!     .with_cols(20)
//!     .with_rows(4)
//!     .with_cursor_on(false) // no visible cursor
//!     .init()
//!     .unwrap();
//!
//! lcd.print_str("Привет, мир!")?;
//!
//! lcd.init_bargraph(hd44780_glyphs::GraphType::HorizontalBar)?;
//! lcd.draw_horizontal_bar_percent(1, 0, 20, 42)?;
//! ```
//!
//! This [site][lcd address] describes how to find the address of your LCD devices.
//!
//! [this one]: https://funduinoshop.com/elektronische-module/displays/lcd/16x02-i2c-lcd-modul-hintergrundbeleuchtung-blau
//! [lcd address]: https://www.ardumotive.com/i2clcden.html

pub mod bargraph;
pub mod cache;
pub mod error;
pub mod glyphs;
pub mod lcd;
pub mod surface;
pub mod text;

#[cfg(test)]
mod mock;

pub use bargraph::GraphType;
pub use cache::CacheOutcome;
pub use error::Error;
pub use lcd::{Cursor, Lcd};
pub use surface::{DeviceSurface, I2cSurface, ReadableSurface};
pub use text::Encoding;

/// Number of programmable glyph slots in CGRAM.
pub const GLYPH_SLOTS: usize = 8;

/// Rows of a glyph bitmap as stored in CGRAM.
pub const GLYPH_ROWS: usize = 8;

/// Pixel columns of a character cell.
pub const CELL_WIDTH: u8 = 5;

/// Pixel rows of a character cell as used by custom glyphs.
pub const CELL_HEIGHT: u8 = 8;

/// Widest display the controller can address per row.
pub const MAX_COLS: u8 = 40;

/// Most rows the controller can address.
pub const MAX_ROWS: u8 = 4;

#[repr(u8)]
#[derive(Copy, Clone)]
pub enum DisplayControl {
    Off = 0x00,
    CursorBlink = 0x01,
    CursorOn = 0x02,
    DisplayOn = 0x04,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Backlight {
    Off = 0x00,
    On = 0x08,
}

/// Character cell height selected in the function set.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Font {
    Font5x8 = 0x00,
    Font5x10 = 0x04,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum Mode {
    EntrySet = 0x04,
    DisplayControl = 0x08,
    CursorShift = 0x10,
    FunctionSet = 0x20,
    CGRAMAddr = 0x40,
    DDRAMAddr = 0x80,
}

enum Commands {
    Clear = 0x01,
    ReturnHome = 0x02,
}

enum BitMode {
    Bit4 = 0x0 << 4,
    Bit8 = 0x1 << 4,
}

enum Lines {
    One = 0x00,
    Two = 0x08,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum EntryDir {
    RightToLeft = 0x00,
    LeftToRight = 0x02,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum DisplayShift {
    Decrement = 0x00,
    Increment = 0x01,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum ShiftTarget {
    Display = 0x08,
}

#[repr(u8)]
#[derive(Copy, Clone)]
enum ShiftDir {
    Left = 0x00,
    Right = 0x04,
}
