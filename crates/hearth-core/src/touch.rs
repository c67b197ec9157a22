//! Raw touch samples and their mapping into screen coordinates
//!
//! Resistive panels report positions in ADC units whose usable range is
//! narrower than 0..4095 and differs per axis. [`TouchCalibration`] maps
//! that range linearly onto `1..=width` and `1..=height`.

use embedded_graphics::prelude::Point;

use crate::config::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

/// One sample in sensor units (12-bit ADC counts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTouch {
    pub x: u16,
    pub y: u16,
    /// Pressure estimate; larger is firmer
    pub z: u16,
}

impl RawTouch {
    pub const fn new(x: u16, y: u16, z: u16) -> Self {
        Self { x, y, z }
    }
}

/// Touch position in screen pixels.
pub type TouchPoint = Point;

/// Linear interpolation of `value` from `in_min..=in_max` onto
/// `out_min..=out_max`, truncating toward zero. Out-of-range input is
/// extrapolated.
pub const fn map_range(value: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchCalibration {
    pub raw_x_min: u16,
    pub raw_x_max: u16,
    pub raw_y_min: u16,
    pub raw_y_max: u16,
    pub width: u16,
    pub height: u16,
}

impl Default for TouchCalibration {
    fn default() -> Self {
        Self::CYD
    }
}

impl TouchCalibration {
    /// 2.8" ESP32-2432S028 panel in landscape
    pub const CYD: TouchCalibration = TouchCalibration {
        raw_x_min: 200,
        raw_x_max: 3700,
        raw_y_min: 240,
        raw_y_max: 3800,
        width: DISPLAY_WIDTH_PX,
        height: DISPLAY_HEIGHT_PX,
    };

    pub const fn map(&self, raw: RawTouch) -> TouchPoint {
        Point::new(
            map_range(
                raw.x as i32,
                self.raw_x_min as i32,
                self.raw_x_max as i32,
                1,
                self.width as i32,
            ),
            map_range(
                raw.y as i32,
                self.raw_y_min as i32,
                self.raw_y_max as i32,
                1,
                self.height as i32,
            ),
        )
    }

    /// Smallest raw sample that maps onto `point`.
    ///
    /// Used by the simulator to feed mouse positions through the same
    /// mapping the hardware uses. Rounds up so `map(unmap(p)) == p` for
    /// every on-screen point.
    pub fn unmap(&self, point: TouchPoint) -> RawTouch {
        RawTouch {
            x: Self::unmap_axis(point.x, self.raw_x_min, self.raw_x_max, self.width),
            y: Self::unmap_axis(point.y, self.raw_y_min, self.raw_y_max, self.height),
            z: u16::MAX,
        }
    }

    fn unmap_axis(value: i32, raw_min: u16, raw_max: u16, size: u16) -> u16 {
        let span_raw = raw_max as i32 - raw_min as i32;
        let span_out = size as i32 - 1;
        let offset = (value - 1).clamp(0, span_out);
        // Round away from raw_min so inverted ranges round-trip too
        let scaled = offset * span_raw;
        let step = if scaled >= 0 {
            (scaled + span_out - 1) / span_out
        } else {
            (scaled - span_out + 1) / span_out
        };
        (raw_min as i32 + step).clamp(0, u16::MAX as i32) as u16
    }
}
