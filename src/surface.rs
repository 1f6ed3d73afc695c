//! Byte transport to the controller.
//!
//! The session only ever needs to put a single byte on the bus together with the state of the
//! register select line. [`I2cSurface`] does that for the common PCF8574 backpacks, where each
//! byte travels as two nibbles on D4..D7 strobed by the enable line.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::{Backlight, BitMode, Mode};

/// Transport the display session talks through.
pub trait DeviceSurface {
    type Error;

    /// Send one byte, either to the instruction register (`is_data == false`) or to the data
    /// register. Implementations retry transient failures before returning an error.
    fn send_byte(&mut self, value: u8, is_data: bool) -> Result<(), Self::Error>;

    /// Power-on handshake that brings the controller into a known interface mode.
    fn power_up(&mut self) -> Result<(), Self::Error>;

    /// Block for at least `us` microseconds.
    fn wait_us(&mut self, us: u32);
}

/// Transport that can also read the controller's RAM back.
pub trait ReadableSurface: DeviceSurface {
    /// Read one byte at the current address, from the data register or the busy flag/address
    /// counter (`is_data == false`).
    fn read_byte(&mut self, is_data: bool) -> Result<u8, Self::Error>;
}

// PCF8574 pin mapping of the usual backpacks.
const RS: u8 = 0x01;
const RW: u8 = 0x02;
const EN: u8 = 0x04;
const DATA_PINS: u8 = 0xf0;

/// PCF8574 I2C backpack.
pub struct I2cSurface<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    i2c: &'a mut I,
    delay: &'a mut D,
    address: u8,
    retries: u8,
    backlight_state: Backlight,
}

impl<'a, I, D> I2cSurface<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Create new instance with only the I2C and delay instance.
    pub fn new(i2c: &'a mut I, delay: &'a mut D) -> Self {
        Self {
            i2c,
            delay,
            address: 0x27,
            retries: 1,
            backlight_state: Backlight::On,
        }
    }

    /// Set I2C address, see [lcd address].
    ///
    /// [lcd address]: https://badboi.dev/rust,/microcontrollers/2020/11/09/i2c-hello-world.html
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Number of extra attempts for every expander write before the error is returned.
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_backlight(mut self, backlight: Backlight) -> Self {
        self.backlight_state = backlight;
        self
    }

    pub fn backlight(&self) -> Backlight {
        self.backlight_state
    }

    pub fn set_backlight(&mut self, backlight: Backlight) -> Result<(), I::Error> {
        self.backlight_state = backlight;
        self.expander_write(0)
    }

    fn expander_write(&mut self, data: u8) -> Result<(), I::Error> {
        let frame = [data | self.backlight_state as u8];
        let mut attempt = 0;
        loop {
            match self.i2c.write(self.address, &frame) {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= self.retries => return Err(e),
                Err(_) => {
                    attempt += 1;
                    #[cfg(feature = "defmt")]
                    defmt::warn!("expander write to {=u8:x} failed, retry {}", self.address, attempt);
                }
            }
        }
    }

    fn write4bits(&mut self, data: u8) -> Result<(), I::Error> {
        self.expander_write(data)?;
        self.expander_write(data | EN)?;
        // Enable pulse must be >450ns.
        self.delay.delay_us(1);
        self.expander_write(data & !EN)?;
        // Commands need >37us to settle.
        self.delay.delay_us(50);
        Ok(())
    }

    fn read4bits(&mut self, control: u8) -> Result<u8, I::Error> {
        self.expander_write(control | EN)?;
        self.delay.delay_us(1);
        let mut buf = [0u8];
        let read = self.i2c.read(self.address, &mut buf);
        self.expander_write(control & !EN)?;
        read?;
        Ok(buf[0] & DATA_PINS)
    }
}

impl<'a, I, D> DeviceSurface for I2cSurface<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Error = I::Error;

    fn send_byte(&mut self, value: u8, is_data: bool) -> Result<(), I::Error> {
        let rs = if is_data { RS } else { 0 };
        let high_bits: u8 = value & 0xf0;
        let low_bits: u8 = (value << 4) & 0xf0;
        self.write4bits(high_bits | rs)?;
        self.write4bits(low_bits | rs)?;
        Ok(())
    }

    /// Actual procedure is a bit obscure. This one was compiled from this [blog post],
    /// corresponding [code] and the [datasheet].
    ///
    /// [datasheet]: https://www.openhacks.com/uploadsproductos/eone-1602a1.pdf
    /// [code]: https://github.com/jalhadi/i2c-hello-world/blob/main/src/main.rs
    /// [blog post]: https://badboi.dev/rust,/microcontrollers/2020/11/09/i2c-hello-world.html
    fn power_up(&mut self) -> Result<(), I::Error> {
        // Initial delay to wait for init after power on.
        self.delay.delay_ms(80);

        self.expander_write(0)?;

        // Init with 8 bit mode
        let mode_8bit = Mode::FunctionSet as u8 | BitMode::Bit8 as u8;
        self.write4bits(mode_8bit)?;
        self.delay.delay_ms(5);
        self.write4bits(mode_8bit)?;
        self.delay.delay_ms(5);
        self.write4bits(mode_8bit)?;
        self.delay.delay_ms(5);

        // Switch to 4 bit mode
        let mode_4bit = Mode::FunctionSet as u8 | BitMode::Bit4 as u8;
        self.write4bits(mode_4bit)
    }

    fn wait_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

impl<'a, I, D> ReadableSurface for I2cSurface<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    fn read_byte(&mut self, is_data: bool) -> Result<u8, I::Error> {
        // Data pins must be released (driven high) so the controller can pull them.
        let control = DATA_PINS | RW | if is_data { RS } else { 0 };
        self.expander_write(control)?;
        let high = self.read4bits(control)?;
        let low = self.read4bits(control)?;
        self.expander_write(0)?;
        Ok(high | (low >> 4))
    }
}
