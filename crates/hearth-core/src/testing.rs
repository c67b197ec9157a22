//! In-memory fakes shared by the unit tests.

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PointsIter, Rectangle};

use crate::clock::{LocalTime, WallClock};
use crate::config::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use crate::network::{LinkState, Network};

pub use embassy_futures::block_on;

/// Full-screen framebuffer that records pixels and counts draw calls.
pub struct TestCanvas {
    pixels: Vec<Rgb565>,
    pub draw_calls: usize,
}

impl TestCanvas {
    pub fn new() -> Self {
        Self::filled(Rgb565::BLACK)
    }

    pub fn filled(color: Rgb565) -> Self {
        Self {
            pixels: vec![color; DISPLAY_WIDTH_PX as usize * DISPLAY_HEIGHT_PX as usize],
            draw_calls: 0,
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb565> {
        self.index(Point::new(x, y)).map(|i| self.pixels[i])
    }

    /// Number of pixels inside `area` with exactly `color`.
    pub fn count_in(&self, area: Rectangle, color: Rgb565) -> usize {
        area.points()
            .filter(|&p| self.index(p).is_some_and(|i| self.pixels[i] == color))
            .count()
    }

    pub fn reset_draw_calls(&mut self) {
        self.draw_calls = 0;
    }

    fn index(&self, p: Point) -> Option<usize> {
        let (w, h) = (DISPLAY_WIDTH_PX as i32, DISPLAY_HEIGHT_PX as i32);
        if (0..w).contains(&p.x) && (0..h).contains(&p.y) {
            Some((p.y * w + p.x) as usize)
        } else {
            None
        }
    }
}

impl OriginDimensions for TestCanvas {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX as u32, DISPLAY_HEIGHT_PX as u32)
    }
}

impl DrawTarget for TestCanvas {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.draw_calls += 1;
        for Pixel(point, color) in pixels {
            if let Some(i) = self.index(point) {
                self.pixels[i] = color;
            }
        }
        Ok(())
    }
}

/// Wall clock that returns whatever the test last set.
pub struct FixedClock {
    time: Option<LocalTime>,
}

impl FixedClock {
    pub fn new(time: Option<LocalTime>) -> Self {
        Self { time }
    }

    pub fn set(&mut self, time: Option<LocalTime>) {
        self.time = time;
    }
}

impl WallClock for FixedClock {
    fn local_time(&mut self) -> Option<LocalTime> {
        self.time
    }
}

pub struct StaticNetwork {
    pub state: LinkState,
}

impl StaticNetwork {
    pub fn connected(rssi: i8) -> Self {
        Self {
            state: LinkState::up(rssi),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            state: LinkState::DOWN,
        }
    }
}

impl Network for StaticNetwork {
    fn is_connected(&self) -> bool {
        self.state.connected
    }

    fn rssi(&self) -> Option<i8> {
        self.state.rssi
    }
}

/// Delay that only adds up the time it was asked to wait.
#[derive(Debug, Default)]
pub struct FakeDelay {
    pub total_ms: u64,
}

impl embedded_hal_async::delay::DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ms += (ns / 1_000_000) as u64;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.total_ms += ms as u64;
    }
}
