//! Software model of an HD44780 used by the unit tests.

use crate::surface::{DeviceSurface, ReadableSurface};
use crate::Lcd;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

/// Tracks DDRAM, CGRAM and the address counter the way the controller does.
pub struct EmulatedLcd {
    pub ddram: [u8; 0x80],
    pub cgram: [u8; 0x40],
    pub commands: Vec<u8>,
    /// Number of "set CGRAM address" instructions, i.e. glyph slot (re)programs.
    pub cgram_selects: usize,
    /// Fail every transfer once this many bytes went through.
    pub fail_after: Option<usize>,
    pub powered: bool,
    sent: usize,
    address: u8,
    in_cgram: bool,
    increment: bool,
}

impl EmulatedLcd {
    pub fn new() -> Self {
        Self {
            ddram: [b' '; 0x80],
            cgram: [0; 0x40],
            commands: Vec::new(),
            cgram_selects: 0,
            fail_after: None,
            powered: false,
            sent: 0,
            address: 0,
            in_cgram: false,
            increment: true,
        }
    }

    /// Bytes that went through so far.
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Characters of `row` on a display that is `cols` wide.
    pub fn row_text(&self, row: u8, cols: u8) -> Vec<u8> {
        let offsets = [0x00, 0x40, cols, 0x40 + cols];
        let start = offsets[row as usize] as usize;
        self.ddram[start..start + cols as usize].to_vec()
    }

    /// Character at (col, row).
    pub fn at(&self, col: u8, row: u8, cols: u8) -> u8 {
        self.row_text(row, cols)[col as usize]
    }

    pub fn glyph(&self, slot: u8) -> [u8; 8] {
        let start = slot as usize * 8;
        let mut out = [0; 8];
        out.copy_from_slice(&self.cgram[start..start + 8]);
        out
    }

    fn step(&mut self) {
        let mask = if self.in_cgram { 0x3f } else { 0x7f };
        self.address = if self.increment {
            self.address.wrapping_add(1)
        } else {
            self.address.wrapping_sub(1)
        } & mask;
    }

    fn execute(&mut self, value: u8) {
        self.commands.push(value);
        if value & 0x80 != 0 {
            self.in_cgram = false;
            self.address = value & 0x7f;
        } else if value & 0x40 != 0 {
            self.in_cgram = true;
            self.address = value & 0x3f;
            self.cgram_selects += 1;
        } else if value & 0x20 != 0 || value & 0x10 != 0 || value & 0x08 != 0 {
            // Function set, shifts and display control keep RAM untouched.
        } else if value & 0x04 != 0 {
            self.increment = value & 0x02 != 0;
        } else if value & 0x02 != 0 {
            self.in_cgram = false;
            self.address = 0;
        } else if value & 0x01 != 0 {
            self.ddram = [b' '; 0x80];
            self.in_cgram = false;
            self.address = 0;
            self.increment = true;
        }
    }
}

impl DeviceSurface for EmulatedLcd {
    type Error = BusFault;

    fn send_byte(&mut self, value: u8, is_data: bool) -> Result<(), BusFault> {
        if self.fail_after.is_some_and(|n| self.sent >= n) {
            return Err(BusFault);
        }
        self.sent += 1;
        if !is_data {
            self.execute(value);
        } else if self.in_cgram {
            self.cgram[self.address as usize] = value;
            self.step();
        } else {
            self.ddram[self.address as usize] = value;
            self.step();
        }
        Ok(())
    }

    fn power_up(&mut self) -> Result<(), BusFault> {
        self.powered = true;
        Ok(())
    }

    fn wait_us(&mut self, _us: u32) {}
}

impl ReadableSurface for EmulatedLcd {
    fn read_byte(&mut self, is_data: bool) -> Result<u8, BusFault> {
        if !is_data {
            return Ok(self.address);
        }
        let value = if self.in_cgram {
            self.cgram[self.address as usize]
        } else {
            self.ddram[self.address as usize]
        };
        self.step();
        Ok(value)
    }
}

/// Initialized session on an emulated `cols` x `rows` display.
pub fn lcd(cols: u8, rows: u8) -> Lcd<EmulatedLcd> {
    Lcd::new(EmulatedLcd::new())
        .with_cols(cols)
        .with_rows(rows)
        .init()
        .unwrap()
}
