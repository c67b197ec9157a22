//! State shared between the background tasks and the UI loop

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Instant;
use hearth_core::Tick;
use hearth_core::clock::{LocalTime, SyncedClock, TimeZone, WallClock};
use hearth_core::network::LinkMonitor;

/// Link state, written only by the WiFi connection task.
pub static LINK: LinkMonitor = LinkMonitor::new();

/// Wall clock, anchored by the SNTP task and read by the UI loop.
static CLOCK: Mutex<CriticalSectionRawMutex, RefCell<SyncedClock>> =
    Mutex::new(RefCell::new(SyncedClock::new(TimeZone::UTC)));

/// Monotonic milliseconds since boot.
pub fn uptime_ms() -> u64 {
    Instant::now().as_millis()
}

/// Current loop timestamp. Truncation to 32 bits is the intended wraparound.
pub fn now_tick() -> Tick {
    Tick(uptime_ms() as u32)
}

pub fn set_time_zone(zone: TimeZone) {
    CLOCK.lock(|clock| clock.replace(SyncedClock::new(zone)));
}

/// Anchor the wall clock to a fresh SNTP sample.
pub fn record_sync(unix_secs: u64, mono_ms: u64) {
    CLOCK.lock(|clock| clock.borrow_mut().sync(unix_secs, mono_ms));
}

/// [`WallClock`] view over the shared SNTP-anchored clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetworkClock;

impl WallClock for NetworkClock {
    fn local_time(&mut self) -> Option<LocalTime> {
        let now = uptime_ms();
        CLOCK.lock(|clock| clock.borrow().local_at(now))
    }
}
