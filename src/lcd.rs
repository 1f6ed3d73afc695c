use core::iter;

use crate::bargraph::GraphState;
use crate::cache::GlyphCache;
use crate::error::Error;
use crate::surface::{DeviceSurface, ReadableSurface};
use crate::text::Encoding;
use crate::{
    BitMode, Commands, DisplayControl, DisplayShift, EntryDir, Font, Lines, Mode, ShiftDir,
    ShiftTarget, GLYPH_ROWS, GLYPH_SLOTS, MAX_COLS, MAX_ROWS,
};

/// Clear and return home need up to 1.52ms.
const SLOW_COMMAND_US: u32 = 2000;

/// Position of the cursor, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cursor {
    pub col: u8,
    pub row: u8,
}

/// API to write to the LCD.
///
/// Owns the transport together with everything the controller cannot tell us: which glyph is
/// loaded in which CGRAM slot, what the bar graphs look like, and where the cursor is.
pub struct Lcd<S>
where
    S: DeviceSurface,
{
    pub(crate) surface: S,
    cols: u8,
    rows: u8,
    font: Font,
    pub(crate) encoding: Encoding,
    display_on: bool,
    cursor_on: bool,
    cursor_blink: bool,
    right_to_left: bool,
    autoscroll: bool,
    pub(crate) cursor: Cursor,
    pub(crate) cache: GlyphCache,
    pub(crate) graph: GraphState,
    pub(crate) unsupported: u32,
    /// Address counter or entry mode of the controller may not match the session, e.g. after a
    /// transfer failed while a glyph slot was selected.
    pointer_dirty: bool,
}

impl<S> Lcd<S>
where
    S: DeviceSurface,
{
    /// Create new instance for a 16x2 display talking through `surface`.
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            cols: 16,
            rows: 2,
            font: Font::Font5x8,
            encoding: Encoding::Utf8,
            display_on: true,
            cursor_on: false,
            cursor_blink: false,
            right_to_left: false,
            autoscroll: false,
            cursor: Cursor::default(),
            cache: GlyphCache::new(),
            graph: GraphState::new(),
            unsupported: 0,
            pointer_dirty: false,
        }
    }

    /// Number of characters per row, 1 to 40.
    pub fn with_cols(mut self, cols: u8) -> Self {
        self.cols = cols.clamp(1, MAX_COLS);
        self
    }

    /// Number of rows, 1 to 4.
    pub fn with_rows(mut self, rows: u8) -> Self {
        self.rows = rows.clamp(1, MAX_ROWS);
        self
    }

    /// Character height. 5x10 dots are only available on single row displays.
    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    /// How byte input to [`Lcd::print`] is decoded.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_cursor_on(mut self, on: bool) -> Self {
        self.cursor_on = on;
        self
    }

    pub fn with_cursor_blink(mut self, blink: bool) -> Self {
        self.cursor_blink = blink;
        self
    }

    /// Initializes the hardware.
    pub fn init(mut self) -> Result<Self, Error<S::Error>> {
        self.surface.power_up()?;

        let lines = if self.rows > 1 {
            Lines::Two as u8
        } else {
            Lines::One as u8
        };
        let font = if self.rows == 1 {
            self.font as u8
        } else {
            Font::Font5x8 as u8
        };
        self.command(Mode::FunctionSet as u8 | BitMode::Bit4 as u8 | lines | font)?;

        self.update_display_control()?;
        self.clear()?;
        self.update_entry_mode()?;
        self.return_home()?;
        Ok(self)
    }

    pub(crate) fn command(&mut self, data: u8) -> Result<(), S::Error> {
        self.surface.send_byte(data, false)
    }

    /// Write a raw character code at the cursor, e.g. `0..=7` for the glyph slots.
    ///
    /// No decoding takes place, the byte goes to the display as is.
    pub fn write_raw(&mut self, value: u8) -> Result<(), Error<S::Error>> {
        if self.pointer_dirty {
            self.resync()?;
        }
        self.surface.send_byte(value, true)?;
        if self.advance_cursor() {
            // The controller does not wrap into the next visible row on its own.
            self.restore_cursor()?;
        }
        Ok(())
    }

    /// Move the shadow cursor like the address counter does after a data write, returns `true`
    /// when it wrapped to another row.
    fn advance_cursor(&mut self) -> bool {
        let Cursor { col, row } = self.cursor;
        if self.right_to_left {
            if col == 0 {
                self.cursor = Cursor {
                    col: self.cols - 1,
                    row: if row == 0 { self.rows - 1 } else { row - 1 },
                };
                return true;
            }
            self.cursor.col = col - 1;
        } else {
            if col + 1 >= self.cols {
                self.cursor = Cursor {
                    col: 0,
                    row: if row + 1 >= self.rows { 0 } else { row + 1 },
                };
                return true;
            }
            self.cursor.col = col + 1;
        }
        false
    }

    fn ddram_address(&self, cursor: Cursor) -> u8 {
        let row_offsets = [0x00, 0x40, self.cols, 0x40 + self.cols];
        row_offsets[cursor.row as usize] + cursor.col
    }

    /// Point the controller's address counter back at the shadow cursor.
    pub(crate) fn restore_cursor(&mut self) -> Result<(), S::Error> {
        let address = self.ddram_address(self.cursor);
        self.command(Mode::DDRAMAddr as u8 | address)
    }

    /// Re-send entry mode and cursor address after the controller was left in an unknown state.
    fn resync(&mut self) -> Result<(), S::Error> {
        self.command(self.entry_mode(self.right_to_left))?;
        self.restore_cursor()?;
        self.pointer_dirty = false;
        Ok(())
    }

    /// Write `cells` from (`col`, `row`) towards the right, also in right-to-left mode.
    pub(crate) fn write_run<I>(
        &mut self,
        col: u8,
        row: u8,
        cells: I,
    ) -> Result<(), Error<S::Error>>
    where
        I: IntoIterator<Item = u8>,
    {
        let right_to_left = self.right_to_left;
        if right_to_left {
            self.right_to_left = false;
            self.pointer_dirty = true;
        }
        let written = self.write_cells(col, row, cells);
        if right_to_left {
            self.right_to_left = true;
            self.pointer_dirty = true;
        }
        written?;
        if self.pointer_dirty {
            self.resync()?;
        }
        Ok(())
    }

    fn write_cells<I>(&mut self, col: u8, row: u8, cells: I) -> Result<(), Error<S::Error>>
    where
        I: IntoIterator<Item = u8>,
    {
        self.set_cursor(col, row)?;
        for cell in cells {
            self.write_raw(cell)?;
        }
        Ok(())
    }

    /// Clear the display
    pub fn clear(&mut self) -> Result<(), Error<S::Error>> {
        self.command(Commands::Clear as u8)?;
        self.surface.wait_us(SLOW_COMMAND_US);
        self.cursor = Cursor::default();
        Ok(())
    }

    /// Blank `count` characters of `row` starting at `col` and leave the cursor at `col`.
    pub fn clear_segment(&mut self, row: u8, col: u8, count: u8) -> Result<(), Error<S::Error>> {
        let row = row.min(self.rows - 1);
        let col = col.min(self.cols - 1);
        let count = count.min(self.cols - col);
        self.write_run(col, row, iter::repeat(b' ').take(count.into()))?;
        self.set_cursor(col, row)
    }

    /// Return cursor to upper left corner, i.e. (0,0).
    pub fn return_home(&mut self) -> Result<(), Error<S::Error>> {
        self.command(Commands::ReturnHome as u8)?;
        self.surface.wait_us(SLOW_COMMAND_US);
        self.cursor = Cursor::default();
        Ok(())
    }

    /// Set the cursor to (col, row). Coordinates are zero-based and clamped to the display.
    pub fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Error<S::Error>> {
        self.cursor = Cursor {
            col: col.min(self.cols - 1),
            row: row.min(self.rows - 1),
        };
        if self.pointer_dirty {
            self.resync()?;
        } else {
            self.restore_cursor()?;
        }
        Ok(())
    }

    /// Where the next character will be written.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn set_display(&mut self, on: bool) -> Result<(), Error<S::Error>> {
        self.display_on = on;
        self.update_display_control()
    }

    pub fn set_cursor_visible(&mut self, on: bool) -> Result<(), Error<S::Error>> {
        self.cursor_on = on;
        self.update_display_control()
    }

    pub fn set_blink(&mut self, blink: bool) -> Result<(), Error<S::Error>> {
        self.cursor_blink = blink;
        self.update_display_control()
    }

    /// Text flows from right to left, the cursor moves left after every character.
    pub fn set_right_to_left(&mut self, enabled: bool) -> Result<(), Error<S::Error>> {
        self.right_to_left = enabled;
        self.update_entry_mode()
    }

    /// Shift the display instead of the cursor, which right-justifies text at the cursor.
    pub fn set_autoscroll(&mut self, enabled: bool) -> Result<(), Error<S::Error>> {
        self.autoscroll = enabled;
        self.update_entry_mode()
    }

    pub fn scroll_display_left(&mut self) -> Result<(), Error<S::Error>> {
        self.command(Mode::CursorShift as u8 | ShiftTarget::Display as u8 | ShiftDir::Left as u8)?;
        Ok(())
    }

    pub fn scroll_display_right(&mut self) -> Result<(), Error<S::Error>> {
        self.command(Mode::CursorShift as u8 | ShiftTarget::Display as u8 | ShiftDir::Right as u8)?;
        Ok(())
    }

    fn update_display_control(&mut self) -> Result<(), Error<S::Error>> {
        let mut display_ctrl = DisplayControl::Off as u8;
        if self.display_on {
            display_ctrl |= DisplayControl::DisplayOn as u8;
        }
        if self.cursor_on {
            display_ctrl |= DisplayControl::CursorOn as u8;
        }
        if self.cursor_blink {
            display_ctrl |= DisplayControl::CursorBlink as u8;
        }
        self.command(Mode::DisplayControl as u8 | display_ctrl)?;
        Ok(())
    }

    fn entry_mode(&self, right_to_left: bool) -> u8 {
        let dir = if right_to_left {
            EntryDir::RightToLeft
        } else {
            EntryDir::LeftToRight
        };
        let shift = if self.autoscroll {
            DisplayShift::Increment
        } else {
            DisplayShift::Decrement
        };
        Mode::EntrySet as u8 | dir as u8 | shift as u8
    }

    fn update_entry_mode(&mut self) -> Result<(), Error<S::Error>> {
        self.command(self.entry_mode(self.right_to_left))?;
        Ok(())
    }

    /// Select glyph slot `slot` in CGRAM with the address counter counting upwards.
    fn select_slot(&mut self, slot: u8) -> Result<(), S::Error> {
        // Cleared once the cursor is back in DDRAM.
        self.pointer_dirty = true;
        if self.right_to_left {
            self.command(self.entry_mode(false))?;
        }
        self.command(Mode::CGRAMAddr as u8 | (slot << 3))
    }

    /// Undo [`Lcd::select_slot`] and go back to the shadow cursor in DDRAM.
    fn deselect_slot(&mut self) -> Result<(), S::Error> {
        if self.right_to_left {
            self.command(self.entry_mode(true))?;
        }
        self.restore_cursor()?;
        self.pointer_dirty = false;
        Ok(())
    }

    /// Write `bitmap` into glyph slot `slot` and return to the shadow cursor.
    pub(crate) fn program_slot(
        &mut self,
        slot: u8,
        bitmap: &[u8; GLYPH_ROWS],
    ) -> Result<(), S::Error> {
        self.select_slot(slot)?;
        for row in bitmap {
            self.surface.send_byte(row & 0x1f, true)?;
        }
        self.deselect_slot()
    }

    /// Load a custom glyph into slot `slot` (0 to 7), print it with [`Lcd::write_raw`].
    ///
    /// The slot is taken away from the glyph cache, and an active bar graph is deactivated since
    /// its glyph set is no longer complete.
    pub fn define_glyph(
        &mut self,
        slot: u8,
        bitmap: &[u8; GLYPH_ROWS],
    ) -> Result<(), Error<S::Error>> {
        if slot as usize >= GLYPH_SLOTS {
            return Err(Error::InvalidSlot);
        }
        self.cache.release(slot);
        self.graph.deactivate();
        self.program_slot(slot, bitmap)?;
        Ok(())
    }

    /// Number of characters replaced by the placeholder since creation.
    pub fn unsupported_count(&self) -> u32 {
        self.unsupported
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Give back the transport.
    pub fn release(self) -> S {
        self.surface
    }
}

impl<S> Lcd<S>
where
    S: ReadableSurface,
{
    /// Read the bitmap of glyph slot `slot` back from CGRAM.
    pub fn read_glyph(&mut self, slot: u8) -> Result<[u8; GLYPH_ROWS], Error<S::Error>> {
        if slot as usize >= GLYPH_SLOTS {
            return Err(Error::InvalidSlot);
        }
        self.select_slot(slot)?;
        let mut bitmap = [0u8; GLYPH_ROWS];
        for row in bitmap.iter_mut() {
            *row = self.surface.read_byte(true)? & 0x1f;
        }
        self.deselect_slot()?;
        Ok(bitmap)
    }
}
