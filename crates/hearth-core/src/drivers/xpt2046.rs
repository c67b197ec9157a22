//! XPT2046 resistive touch controller
//!
//! Blocking driver over an [`embedded_hal::spi::SpiDevice`] plus the
//! controller's active-low `PENIRQ` line. Every conversion is a three byte
//! transfer: the control byte goes out first and the 12-bit result comes
//! back left-aligned in the last two bytes.
//!
//! On the ESP32-2432S028 panel in landscape the `0b001` input runs along the
//! long (screen X) edge and `0b101` along the short one, so [`CMD_X`] and
//! [`CMD_Y`] are named for the screen axes, not the datasheet's X+/Y+ pins.
//! [`TouchCalibration::CYD`](crate::touch::TouchCalibration::CYD) is measured
//! against this assignment.

use embedded_hal::digital::InputPin;
use embedded_hal::spi::SpiDevice;

use crate::touch::RawTouch;

// =============================================================================
// Control Bytes
// =============================================================================

/// Start bit | 12-bit | differential reference | power down between conversions
const CTRL_BASE: u8 = 0x81;

/// Z1 pressure channel
pub const CMD_Z1: u8 = CTRL_BASE | (0b011 << 4);
/// Z2 pressure channel
pub const CMD_Z2: u8 = CTRL_BASE | (0b100 << 4);
/// Screen X position
pub const CMD_X: u8 = CTRL_BASE | (0b001 << 4);
/// Screen Y position
pub const CMD_Y: u8 = CTRL_BASE | (0b101 << 4);
/// Last conversion of a sample; powers down with PENIRQ enabled
pub const CMD_POWER_DOWN: u8 = 0xD0;

/// Largest 12-bit reading
pub const ADC_MAX: u16 = 4095;

/// Pressure below which the panel is treated as untouched
pub const DEFAULT_PRESSURE_THRESHOLD: u16 = 400;

/// Conversions per axis; the closest two are averaged
const SAMPLES_PER_AXIS: usize = 3;

// =============================================================================
// Driver Error Type
// =============================================================================

/// Errors that can occur during XPT2046 operations
#[derive(Debug)]
pub enum Error<S, P> {
    /// SPI communication error
    Spi(S),
    /// PENIRQ pin could not be read
    Irq(P),
}

// =============================================================================
// Driver Implementation
// =============================================================================

pub struct Xpt2046<SPI, IRQ> {
    spi: SPI,
    irq: IRQ,
    pressure_threshold: u16,
}

impl<SPI, IRQ> Xpt2046<SPI, IRQ>
where
    SPI: SpiDevice,
    IRQ: InputPin,
{
    pub fn new(spi: SPI, irq: IRQ) -> Self {
        Self {
            spi,
            irq,
            pressure_threshold: DEFAULT_PRESSURE_THRESHOLD,
        }
    }

    pub fn with_pressure_threshold(mut self, threshold: u16) -> Self {
        self.pressure_threshold = threshold;
        self
    }

    /// Release the bus and pin.
    pub fn release(self) -> (SPI, IRQ) {
        (self.spi, self.irq)
    }

    /// `PENIRQ` is asserted (low) while the panel is pressed.
    ///
    /// Cheap to poll: no SPI traffic.
    pub fn irq_touched(&mut self) -> Result<bool, Error<SPI::Error, IRQ::Error>> {
        self.irq.is_low().map_err(Error::Irq)
    }

    fn read_channel(&mut self, command: u8) -> Result<u16, Error<SPI::Error, IRQ::Error>> {
        let tx = [command, 0, 0];
        let mut rx = [0u8; 3];
        self.spi.transfer(&mut rx, &tx).map_err(Error::Spi)?;
        Ok(decode_conversion(rx[1], rx[2]))
    }

    /// Pressure estimate; larger is firmer.
    pub fn pressure(&mut self) -> Result<u16, Error<SPI::Error, IRQ::Error>> {
        let z1 = self.read_channel(CMD_Z1)?;
        let z2 = self.read_channel(CMD_Z2)?;
        Ok(pressure_from(z1, z2))
    }

    pub fn touched(&mut self) -> Result<bool, Error<SPI::Error, IRQ::Error>> {
        Ok(self.pressure()? >= self.pressure_threshold)
    }

    /// Read the position without checking pressure first.
    pub fn raw_point(&mut self) -> Result<RawTouch, Error<SPI::Error, IRQ::Error>> {
        let z = self.pressure()?;

        let mut xs = [0u16; SAMPLES_PER_AXIS];
        let mut ys = [0u16; SAMPLES_PER_AXIS];
        for (x, y) in xs.iter_mut().zip(ys.iter_mut()) {
            *x = self.read_channel(CMD_X)?;
            *y = self.read_channel(CMD_Y)?;
        }
        self.read_channel(CMD_POWER_DOWN)?;

        Ok(RawTouch {
            x: best_two_average(xs),
            y: best_two_average(ys),
            z,
        })
    }

    /// One touch sample, or `None` when the panel is not pressed firmly
    /// enough.
    pub fn sample(&mut self) -> Result<Option<RawTouch>, Error<SPI::Error, IRQ::Error>> {
        if !self.irq_touched()? {
            return Ok(None);
        }
        let point = self.raw_point()?;
        if point.z < self.pressure_threshold {
            return Ok(None);
        }
        Ok(Some(point))
    }
}

/// The result is 12 bits left-aligned after one leading busy bit.
pub fn decode_conversion(high: u8, low: u8) -> u16 {
    (((high as u16) << 8) | low as u16) >> 3
}

pub fn pressure_from(z1: u16, z2: u16) -> u16 {
    (z1 + ADC_MAX).saturating_sub(z2)
}

/// Average of the two closest readings, discarding the outlier.
pub fn best_two_average(samples: [u16; SAMPLES_PER_AXIS]) -> u16 {
    let [a, b, c] = samples.map(|s| s as i32);
    let (ab, ac, bc) = ((a - b).abs(), (a - c).abs(), (b - c).abs());

    let avg = if ab <= ac && ab <= bc {
        (a + b) / 2
    } else if ac <= bc {
        (a + c) / 2
    } else {
        (b + c) / 2
    };
    avg as u16
}
