//! Bar graphs with single pixel resolution.
//!
//! A graph type loads a family of partially filled glyphs into the CGRAM slots: five glyphs
//! with one to five lit pixel columns for horizontal bars, five glyphs with a single lit column
//! for horizontal lines, eight glyphs with one to eight lit pixel rows for vertical bars. A bar
//! is then a run of full glyphs capped by one partial glyph.
//!
//! The renderer remembers how far each bar reached, so shrinking a bar only blanks the cells it
//! no longer covers.

use core::iter;

use crate::error::Error;
use crate::surface::DeviceSurface;
use crate::{Lcd, CELL_HEIGHT, CELL_WIDTH, GLYPH_ROWS, MAX_COLS};

/// Extent value of a row or column that has not been drawn since the graph type was set.
pub const UNDRAWN: u8 = 255;

/// Family of glyphs loaded for bar graphs.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GraphType {
    VerticalBar = 1,
    HorizontalBar = 2,
    HorizontalLine = 3,
}

impl TryFrom<u8> for GraphType {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, u8> {
        match code {
            1 => Ok(GraphType::VerticalBar),
            2 => Ok(GraphType::HorizontalBar),
            3 => Ok(GraphType::HorizontalLine),
            other => Err(other),
        }
    }
}

impl GraphType {
    fn is_horizontal(self) -> bool {
        matches!(self, GraphType::HorizontalBar | GraphType::HorizontalLine)
    }

    /// Number of glyph slots the family occupies.
    pub fn glyph_count(self) -> u8 {
        if self.is_horizontal() {
            CELL_WIDTH
        } else {
            CELL_HEIGHT
        }
    }

    /// Bitmap of glyph `idx` of the family.
    pub fn glyph(self, idx: u8) -> [u8; GLYPH_ROWS] {
        match self {
            // Columns are numbered from the left, bit 4 is the leftmost pixel.
            GraphType::HorizontalBar => [0x1f & !(0x1f >> (idx + 1)); GLYPH_ROWS],
            GraphType::HorizontalLine => [0x10 >> idx; GLYPH_ROWS],
            GraphType::VerticalBar => {
                let mut rows = [0u8; GLYPH_ROWS];
                for row in rows.iter_mut().rev().take(idx as usize + 1) {
                    *row = 0x1f;
                }
                rows
            }
        }
    }
}

/// Active graph type plus the last drawn extent per row (horizontal) or column (vertical).
#[derive(Debug, Clone)]
pub struct GraphState {
    kind: Option<GraphType>,
    extents: [u8; MAX_COLS as usize],
}

impl Default for GraphState {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphState {
    pub const fn new() -> Self {
        Self {
            kind: None,
            extents: [UNDRAWN; MAX_COLS as usize],
        }
    }

    pub fn kind(&self) -> Option<GraphType> {
        self.kind
    }

    /// Make `kind` the active graph and forget all extents.
    pub fn activate(&mut self, kind: GraphType) {
        self.kind = Some(kind);
        self.extents = [UNDRAWN; MAX_COLS as usize];
    }

    /// Drop the active graph, returning what it was.
    pub fn deactivate(&mut self) -> Option<GraphType> {
        self.kind.take()
    }

    pub fn extent(&self, idx: u8) -> u8 {
        self.extents.get(idx as usize).copied().unwrap_or(UNDRAWN)
    }
}

/// Last pixel of a bar filled to `percent` of `len` cells with `cell` pixels each, rounded to
/// the nearest pixel.
///
/// `None` if less than one pixel would be lit.
pub fn percent_to_pixels(percent: u16, len: u8, cell: u8) -> Option<u8> {
    let lit = (u32::from(percent.min(100)) * u32::from(len) * u32::from(cell) + 50) / 100;
    lit.checked_sub(1).map(|end| end.min(u32::from(u8::MAX)) as u8)
}

/// Last pixel of a bar filled to `ratio` (0.0 to 1.0) of `len` cells with `cell` pixels each,
/// rounded to the nearest pixel.
///
/// `None` if less than one pixel would be lit.
pub fn ratio_to_pixels(ratio: f32, len: u8, cell: u8) -> Option<u8> {
    let ratio = if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    };
    let lit = (ratio * f32::from(len) * f32::from(cell) + 0.5) as u32;
    lit.checked_sub(1).map(|end| end.min(u32::from(u8::MAX)) as u8)
}

impl<S> Lcd<S>
where
    S: DeviceSurface,
{
    /// Load the glyphs for `kind` and reset all graph extents.
    ///
    /// Takes all glyph slots away from the glyph cache.
    pub fn init_bargraph(&mut self, kind: GraphType) -> Result<(), Error<S::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("bar graph {}", kind);
        self.cache.clear();
        // A half programmed family is of no use.
        self.graph.deactivate();
        for idx in 0..kind.glyph_count() {
            self.program_slot(idx, &kind.glyph(idx))?;
        }
        self.graph.activate(kind);
        Ok(())
    }

    /// [`Lcd::init_bargraph`] from a raw type code: 1 vertical bar, 2 horizontal bar,
    /// 3 horizontal line.
    pub fn init_bargraph_code(&mut self, code: u8) -> Result<(), Error<S::Error>> {
        let kind = GraphType::try_from(code).map_err(|_| Error::UnsupportedGraphType)?;
        self.init_bargraph(kind)
    }

    fn horizontal_kind(&self) -> Result<GraphType, Error<S::Error>> {
        match self.graph.kind() {
            Some(kind) if kind.is_horizontal() => Ok(kind),
            _ => Err(Error::RendererNotInitialized),
        }
    }

    fn vertical_kind(&self) -> Result<GraphType, Error<S::Error>> {
        match self.graph.kind() {
            Some(GraphType::VerticalBar) => Ok(GraphType::VerticalBar),
            _ => Err(Error::RendererNotInitialized),
        }
    }

    /// Clamp a horizontal graph region to the display, `None` if it is empty.
    fn horizontal_region(&self, row: u8, col: u8, len: u8) -> Option<(u8, u8, u8)> {
        let row = row.min(self.rows() - 1);
        let col = col.min(self.cols() - 1);
        let len = len.min(self.cols() - col);
        (len > 0).then_some((row, col, len))
    }

    /// Clamp a vertical graph region to the display, `None` if it is empty.
    fn vertical_region(&self, row: u8, col: u8, len: u8) -> Option<(u8, u8, u8)> {
        let row = row.min(self.rows() - 1);
        let col = col.min(self.cols() - 1);
        let len = len.min(row + 1);
        (len > 0).then_some((row, col, len))
    }

    /// Draw a horizontal graph of `len` cells starting at (`col`, `row`) up to and including
    /// pixel column `pixels`.
    ///
    /// For bars every pixel up to `pixels` is lit, for lines only pixel `pixels` is.
    pub fn draw_horizontal_bar(
        &mut self,
        row: u8,
        col: u8,
        len: u8,
        pixels: u8,
    ) -> Result<(), Error<S::Error>> {
        let kind = self.horizontal_kind()?;
        let Some((row, col, len)) = self.horizontal_region(row, col, len) else {
            return Ok(());
        };
        let max_pixel = u16::from(len) * u16::from(CELL_WIDTH) - 1;
        let pixels = u16::from(pixels).min(max_pixel) as u8;
        let last = col + len - 1;
        let previous = self.graph.extents[row as usize].clamp(col, last);
        let full = pixels / CELL_WIDTH;
        let partial = pixels % CELL_WIDTH;

        if kind == GraphType::HorizontalBar {
            let end = col + full;
            let cells = iter::repeat(CELL_WIDTH - 1)
                .take(full.into())
                .chain(iter::once(partial))
                .chain(iter::repeat(b' ').take(previous.saturating_sub(end).into()));
            self.write_run(col, row, cells)?;
            self.graph.extents[row as usize] = end;
        } else {
            let at = col + full;
            if previous != at {
                self.set_cursor(previous, row)?;
                self.write_raw(b' ')?;
            }
            self.graph.extents[row as usize] = at;
            self.set_cursor(at, row)?;
            self.write_raw(partial)?;
        }
        Ok(())
    }

    /// Blank a whole horizontal graph region.
    pub fn erase_horizontal_bar(&mut self, row: u8, col: u8, len: u8) -> Result<(), Error<S::Error>> {
        self.horizontal_kind()?;
        let Some((row, col, len)) = self.horizontal_region(row, col, len) else {
            return Ok(());
        };
        self.write_run(col, row, iter::repeat(b' ').take(len.into()))?;
        self.graph.extents[row as usize] = UNDRAWN;
        Ok(())
    }

    /// [`Lcd::draw_horizontal_bar`] filled to `percent` (0 to 100) of its length. Nothing lit
    /// erases the region.
    pub fn draw_horizontal_bar_percent(
        &mut self,
        row: u8,
        col: u8,
        len: u8,
        percent: u16,
    ) -> Result<(), Error<S::Error>> {
        match percent_to_pixels(percent, len, CELL_WIDTH) {
            Some(pixels) => self.draw_horizontal_bar(row, col, len, pixels),
            None => self.erase_horizontal_bar(row, col, len),
        }
    }

    /// [`Lcd::draw_horizontal_bar`] filled to `ratio` (0.0 to 1.0) of its length. Nothing lit
    /// erases the region.
    pub fn draw_horizontal_bar_ratio(
        &mut self,
        row: u8,
        col: u8,
        len: u8,
        ratio: f32,
    ) -> Result<(), Error<S::Error>> {
        match ratio_to_pixels(ratio, len, CELL_WIDTH) {
            Some(pixels) => self.draw_horizontal_bar(row, col, len, pixels),
            None => self.erase_horizontal_bar(row, col, len),
        }
    }

    /// Draw a vertical bar of `len` cells whose bottom cell is at (`col`, `row`), lit from the
    /// bottom up to and including pixel row `pixels`.
    pub fn draw_vertical_bar(
        &mut self,
        row: u8,
        col: u8,
        len: u8,
        pixels: u8,
    ) -> Result<(), Error<S::Error>> {
        self.vertical_kind()?;
        let Some((row, col, len)) = self.vertical_region(row, col, len) else {
            return Ok(());
        };
        let pixels = pixels.min(len * CELL_HEIGHT - 1);
        let top_limit = row + 1 - len;
        let previous = match self.graph.extents[col as usize] {
            UNDRAWN => top_limit,
            top => top.clamp(top_limit, row),
        };

        let mut top = row;
        for _ in 0..pixels / CELL_HEIGHT {
            self.set_cursor(col, top)?;
            self.write_raw(CELL_HEIGHT - 1)?;
            top -= 1;
        }
        self.set_cursor(col, top)?;
        self.write_raw(pixels % CELL_HEIGHT)?;
        for stale in previous..top {
            self.set_cursor(col, stale)?;
            self.write_raw(b' ')?;
        }
        self.graph.extents[col as usize] = top;
        Ok(())
    }

    /// Blank a whole vertical graph region.
    pub fn erase_vertical_bar(&mut self, row: u8, col: u8, len: u8) -> Result<(), Error<S::Error>> {
        self.vertical_kind()?;
        let Some((row, col, len)) = self.vertical_region(row, col, len) else {
            return Ok(());
        };
        for cell in row + 1 - len..=row {
            self.set_cursor(col, cell)?;
            self.write_raw(b' ')?;
        }
        self.graph.extents[col as usize] = UNDRAWN;
        Ok(())
    }

    /// [`Lcd::draw_vertical_bar`] filled to `percent` (0 to 100) of its height. Nothing lit
    /// erases the region.
    pub fn draw_vertical_bar_percent(
        &mut self,
        row: u8,
        col: u8,
        len: u8,
        percent: u16,
    ) -> Result<(), Error<S::Error>> {
        match percent_to_pixels(percent, len, CELL_HEIGHT) {
            Some(pixels) => self.draw_vertical_bar(row, col, len, pixels),
            None => self.erase_vertical_bar(row, col, len),
        }
    }

    /// [`Lcd::draw_vertical_bar`] filled to `ratio` (0.0 to 1.0) of its height. Nothing lit
    /// erases the region.
    pub fn draw_vertical_bar_ratio(
        &mut self,
        row: u8,
        col: u8,
        len: u8,
        ratio: f32,
    ) -> Result<(), Error<S::Error>> {
        match ratio_to_pixels(ratio, len, CELL_HEIGHT) {
            Some(pixels) => self.draw_vertical_bar(row, col, len, pixels),
            None => self.erase_vertical_bar(row, col, len),
        }
    }
}
