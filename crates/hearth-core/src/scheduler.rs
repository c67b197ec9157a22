//! Tick timestamps, interval gates and the periodic update scheduler
//!
//! The main loop samples the monotonic millisecond counter once per
//! iteration and hands the resulting [`Tick`] to everything that runs in
//! that iteration. Periodic work is throttled with [`Gate`]s so the clock
//! and the signal indicator are not redrawn every loop (which flickers and
//! burns CPU).

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use log::debug;

use crate::clock::WallClock;
use crate::config::{CLOCK_INTERVAL_MS, SIGNAL_INTERVAL_MS};
use crate::network::Network;
use crate::ui::{RedrawSet, Theme, widgets};

/// Monotonic millisecond timestamp sampled once per main-loop iteration.
///
/// The counter is 32 bits wide and wraps after ~49 days; every comparison
/// goes through [`Tick::elapsed_since`], which uses wrapping subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick(pub u32);

impl Tick {
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Milliseconds from `earlier` to `self`, correct across counter wraparound.
    pub const fn elapsed_since(self, earlier: Tick) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    pub const fn has_elapsed(self, earlier: Tick, interval_ms: u32) -> bool {
        self.elapsed_since(earlier) >= interval_ms
    }

    pub const fn add_millis(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }
}

/// Minimum-interval guard.
///
/// A gate starts armed at tick zero, so its first firing happens one full
/// interval after boot. Anything that must be drawn immediately is drawn
/// explicitly at startup.
#[derive(Debug, Clone, Copy)]
pub struct Gate {
    interval_ms: u32,
    last: Tick,
}

impl Gate {
    pub const fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            last: Tick(0),
        }
    }

    pub const fn last_fired(&self) -> Tick {
        self.last
    }

    pub const fn is_due(&self, now: Tick) -> bool {
        now.has_elapsed(self.last, self.interval_ms)
    }

    /// Re-arm the gate as if it fired at `now`.
    pub fn fire(&mut self, now: Tick) {
        self.last = now;
    }

    /// Fire and re-arm if due. Returns whether the guarded work should run.
    pub fn poll(&mut self, now: Tick) -> bool {
        if self.is_due(now) {
            self.fire(now);
            true
        } else {
            false
        }
    }
}

/// Runs the time-gated system redraws (clock face and signal strength).
pub struct UpdateScheduler {
    clock: Gate,
    signal: Gate,
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateScheduler {
    pub const fn new() -> Self {
        Self::with_intervals(CLOCK_INTERVAL_MS, SIGNAL_INTERVAL_MS)
    }

    pub const fn with_intervals(clock_ms: u32, signal_ms: u32) -> Self {
        Self {
            clock: Gate::new(clock_ms),
            signal: Gate::new(signal_ms),
        }
    }

    /// Treat both tasks as having just run at `now`.
    pub fn arm(&mut self, now: Tick) {
        self.clock.fire(now);
        self.signal.fire(now);
    }

    pub fn clock_gate(&self) -> &Gate {
        &self.clock
    }

    pub fn signal_gate(&self) -> &Gate {
        &self.signal
    }

    /// Run one scheduling step.
    ///
    /// When the wall clock cannot produce a time the clock gate stays due,
    /// so the redraw is retried on the next tick instead of a full interval
    /// later.
    pub fn run<D, C, N>(
        &mut self,
        now: Tick,
        theme: &Theme,
        clock: &mut C,
        network: &N,
        display: &mut D,
    ) -> Result<RedrawSet, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
        C: WallClock + ?Sized,
        N: Network + ?Sized,
    {
        let mut redrawn = RedrawSet::default();

        if self.clock.is_due(now) {
            match clock.local_time() {
                Some(time) => {
                    widgets::draw_clock(display, theme, &time)?;
                    self.clock.fire(now);
                    redrawn.clock = true;
                }
                None => debug!(" Clock redraw deferred, wall-clock time unavailable"),
            }
        }

        if self.signal.poll(now) {
            widgets::draw_signal_strength(display, theme, network.rssi())?;
            redrawn.signal = true;
        }

        Ok(redrawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::LocalTime;
    use crate::testing::{FixedClock, StaticNetwork, TestCanvas};
    use crate::ui::theme::RUST_LIGHT;

    #[test]
    fn test_elapsed_wraps_around() {
        let earlier = Tick(u32::MAX - 4);
        let now = Tick(5);
        assert_eq!(now.elapsed_since(earlier), 10);
        assert!(now.has_elapsed(earlier, 10));
        assert!(!now.has_elapsed(earlier, 11));
    }

    #[test]
    fn test_gate_fires_once_per_interval() {
        let mut gate = Gate::new(10);
        assert!(!gate.poll(Tick(9)));
        assert!(gate.poll(Tick(10)));
        assert!(!gate.poll(Tick(19)));
        assert!(gate.poll(Tick(20)));
        assert_eq!(gate.last_fired(), Tick(20));
    }

    #[test]
    fn test_gate_across_wraparound() {
        let mut gate = Gate::new(100);
        gate.fire(Tick(u32::MAX - 49));
        assert!(!gate.is_due(Tick(49)));
        assert!(gate.is_due(Tick(50)));
    }

    #[test]
    fn test_scheduler_fires_each_task_on_its_own_interval() {
        let mut scheduler = UpdateScheduler::new();
        let mut clock = FixedClock::new(Some(LocalTime::sample()));
        let network = StaticNetwork::connected(-60);
        let mut canvas = TestCanvas::new();

        let r = scheduler
            .run(Tick(4_999), &RUST_LIGHT, &mut clock, &network, &mut canvas)
            .unwrap();
        assert!(!r.clock && !r.signal);

        let r = scheduler
            .run(Tick(5_000), &RUST_LIGHT, &mut clock, &network, &mut canvas)
            .unwrap();
        assert!(r.clock && !r.signal);

        let r = scheduler
            .run(Tick(30_000), &RUST_LIGHT, &mut clock, &network, &mut canvas)
            .unwrap();
        assert!(r.clock && r.signal);

        let r = scheduler
            .run(Tick(30_001), &RUST_LIGHT, &mut clock, &network, &mut canvas)
            .unwrap();
        assert!(r.is_empty());
    }

    #[test]
    fn test_clock_redraw_retried_while_time_unavailable() {
        let mut scheduler = UpdateScheduler::new();
        let mut clock = FixedClock::new(None);
        let network = StaticNetwork::connected(-60);
        let mut canvas = TestCanvas::new();

        let r = scheduler
            .run(Tick(5_000), &RUST_LIGHT, &mut clock, &network, &mut canvas)
            .unwrap();
        assert!(!r.clock);
        assert!(scheduler.clock_gate().is_due(Tick(5_001)));

        clock.set(Some(LocalTime::sample()));
        let r = scheduler
            .run(Tick(5_001), &RUST_LIGHT, &mut clock, &network, &mut canvas)
            .unwrap();
        assert!(r.clock);
        assert_eq!(scheduler.clock_gate().last_fired(), Tick(5_001));
    }
}
