//! Network link status and bounded retry
//!
//! The WiFi connection task is the only writer of link state; the UI loop
//! reads it through the [`Network`] trait once per tick. [`LinkMonitor`] is
//! the shared cell between the two.
//!
//! Reconnection and time sync both go through a [`RetryPolicy`], which caps
//! the number of attempts and hands [`AppError::RetriesExhausted`] back to
//! the caller rather than spinning forever.

use core::cell::Cell;
use core::future::Future;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Duration;
use log::{debug, warn};

use crate::error::AppError;

/// Minimum RSSI (dBm) for one, two and three signal bars
pub const SIGNAL_BAR_THRESHOLDS: [i8; 3] = [-90, -70, -50];

/// Number of signal bars (0-3) for a received signal strength in dBm.
pub fn signal_bars(rssi: i8) -> u8 {
    SIGNAL_BAR_THRESHOLDS
        .iter()
        .filter(|&&threshold| rssi >= threshold)
        .count() as u8
}

/// Read-only view of the network link.
pub trait Network {
    fn is_connected(&self) -> bool;

    /// Received signal strength in dBm, `None` while disconnected.
    fn rssi(&self) -> Option<i8>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkState {
    pub connected: bool,
    pub rssi: Option<i8>,
}

impl LinkState {
    pub const DOWN: LinkState = LinkState {
        connected: false,
        rssi: None,
    };

    pub const fn up(rssi: i8) -> Self {
        Self {
            connected: true,
            rssi: Some(rssi),
        }
    }
}

/// Link snapshot shared between the connection task and the UI loop.
///
/// Meant to live in a `static`; the snapshot is copied in and out whole
/// under a critical section so readers never see a half-updated state.
pub struct LinkMonitor {
    state: Mutex<CriticalSectionRawMutex, Cell<LinkState>>,
}

impl Default for LinkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkMonitor {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(LinkState::DOWN)),
        }
    }

    pub fn publish(&self, state: LinkState) {
        let previous = self.state.lock(|cell| cell.replace(state));
        if previous.connected != state.connected {
            debug!(" Link {}", if state.connected { "up" } else { "down" });
        }
    }

    pub fn snapshot(&self) -> LinkState {
        self.state.lock(|cell| cell.get())
    }
}

impl Network for LinkMonitor {
    fn is_connected(&self) -> bool {
        self.snapshot().connected
    }

    fn rssi(&self) -> Option<i8> {
        let state = self.snapshot();
        if state.connected { state.rssi } else { None }
    }
}

impl<N: Network + ?Sized> Network for &N {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn rssi(&self) -> Option<i8> {
        (**self).rssi()
    }
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// Doubles after every failed attempt, capped at `max`
    Exponential { initial: Duration, max: Duration },
}

/// Bounded retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// WiFi association: 1 s, 2 s, 4 s ... up to 30 s between attempts
    pub const WIFI: RetryPolicy = RetryPolicy {
        max_attempts: 8,
        backoff: Backoff::Exponential {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
        },
    };

    /// SNTP: a few quick retries, the caller rotates servers between rounds
    pub const SNTP: RetryPolicy = RetryPolicy {
        max_attempts: 4,
        backoff: Backoff::Fixed(Duration::from_secs(2)),
    };

    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub const fn exponential(max_attempts: u32, initial: Duration, max: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential { initial, max },
        }
    }

    /// Delay to wait after failed attempt number `attempt` (starting at 0).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                let ticks = initial.as_ticks().saturating_mul(factor);
                Duration::from_ticks(ticks.min(max.as_ticks()))
            }
        }
    }

    /// Delays between consecutive attempts (one fewer than `max_attempts`).
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts.saturating_sub(1)).map(|attempt| self.delay_for(attempt))
    }

    /// Run `op` until it succeeds or the attempt budget is spent, sleeping
    /// between attempts.
    pub async fn retry<T, E, D, F, Fut>(&self, delay: &mut D, mut op: F) -> Result<T, AppError>
    where
        E: core::fmt::Debug,
        D: embedded_hal_async::delay::DelayNs,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        for attempt in 0..self.max_attempts {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(
                        " Attempt {}/{} failed: {:?}",
                        attempt + 1,
                        self.max_attempts,
                        err
                    );
                    if attempt + 1 < self.max_attempts {
                        delay
                            .delay_ms(self.delay_for(attempt).as_millis() as u32)
                            .await;
                    }
                }
            }
        }
        Err(AppError::RetriesExhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDelay, block_on};

    #[test]
    fn test_signal_bar_thresholds() {
        assert_eq!(signal_bars(-100), 0);
        assert_eq!(signal_bars(-91), 0);
        assert_eq!(signal_bars(-90), 1);
        assert_eq!(signal_bars(-71), 1);
        assert_eq!(signal_bars(-70), 2);
        assert_eq!(signal_bars(-50), 3);
        assert_eq!(signal_bars(-20), 3);
    }

    #[test]
    fn test_link_monitor_snapshot() {
        let monitor = LinkMonitor::new();
        assert!(!monitor.is_connected());
        assert_eq!(monitor.rssi(), None);

        monitor.publish(LinkState::up(-61));
        assert!(monitor.is_connected());
        assert_eq!(monitor.rssi(), Some(-61));

        // A stale RSSI is hidden once the link drops
        monitor.publish(LinkState {
            connected: false,
            rssi: Some(-61),
        });
        assert_eq!(monitor.rssi(), None);
    }

    #[test]
    fn test_exponential_backoff_caps() {
        let policy =
            RetryPolicy::exponential(6, Duration::from_millis(100), Duration::from_millis(500));
        let delays: heapless::Vec<u64, 8> = policy.schedule().map(|d| d.as_millis()).collect();
        assert_eq!(delays.as_slice(), &[100, 200, 400, 500, 500]);
        // Large attempt numbers saturate instead of overflowing
        assert_eq!(policy.delay_for(200).as_millis(), 500);
    }

    #[test]
    fn test_fixed_backoff() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(250));
        assert_eq!(policy.schedule().count(), 2);
        assert!(policy.schedule().all(|d| d.as_millis() == 250));
    }

    #[test]
    fn test_retry_async() {
        let policy = RetryPolicy::fixed(4, Duration::from_millis(5));
        let mut delay = FakeDelay::default();
        let result = block_on(policy.retry(&mut delay, |attempt| async move {
            if attempt == 3 { Ok("synced") } else { Err(attempt) }
        }));
        assert_eq!(result, Ok("synced"));
        assert_eq!(delay.total_ms, 15);
    }

    #[test]
    fn test_retry_async_exhausts() {
        let policy = RetryPolicy::exponential(3, Duration::from_millis(10), Duration::from_secs(1));
        let mut delay = FakeDelay::default();
        let mut calls = 0;
        let result: Result<(), _> = block_on(policy.retry(&mut delay, |_| {
            calls += 1;
            async { Err(()) }
        }));
        assert_eq!(result, Err(AppError::RetriesExhausted { attempts: 3 }));
        assert_eq!(calls, 3);
        // No sleep after the final attempt
        assert_eq!(delay.total_ms, 10 + 20);
    }
}
