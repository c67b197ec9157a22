//! Device configuration: network credentials, time sync and fixed layout constants

use serde::{Deserialize, Serialize};

/// Display width in pixels (landscape)
pub const DISPLAY_WIDTH_PX: u16 = 320;

/// Display height in pixels (landscape)
pub const DISPLAY_HEIGHT_PX: u16 = 240;

/// Redraw cadence of the clock face
pub const CLOCK_INTERVAL_MS: u32 = 5_000;

/// Redraw cadence of the signal strength indicator
pub const SIGNAL_INTERVAL_MS: u32 = 30_000;

/// Minimum time between two evaluations of an app's buttons
pub const PRESS_CHECK_INTERVAL_MS: u32 = 10;

/// How long a pressed menu icon stays highlighted
pub const PRESS_FEEDBACK_MS: u32 = 100;

/// US Eastern with DST, the zone the device was first deployed in
pub const DEFAULT_TIME_ZONE: &str = "EST5EDT,M3.2.0,M11.1.0";

/// NTP servers queried in order until one answers
pub const DEFAULT_NTP_SERVERS: [&str; 2] = ["pool.ntp.org", "time.nist.gov"];

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct Config<'a> {
    pub internet: InternetConfig<'a>,
    pub time: TimeConfig<'a>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct InternetConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TimeConfig<'a> {
    /// POSIX TZ rule, e.g. `EST5EDT,M3.2.0,M11.1.0`
    pub time_zone: &'a str,
    pub ntp_server: &'a str,
    pub fallback_ntp_server: &'a str,
}

impl Default for TimeConfig<'_> {
    fn default() -> Self {
        Self {
            time_zone: DEFAULT_TIME_ZONE,
            ntp_server: DEFAULT_NTP_SERVERS[0],
            fallback_ntp_server: DEFAULT_NTP_SERVERS[1],
        }
    }
}

impl<'a> Config<'a> {
    pub fn new(ssid: &'a str, password: &'a str) -> Self {
        Self {
            internet: InternetConfig { ssid, password },
            time: TimeConfig::default(),
        }
    }

    /// NTP servers in the order they should be tried
    pub fn ntp_servers(&self) -> [&'a str; 2] {
        [self.time.ntp_server, self.time.fallback_ntp_server]
    }
}
