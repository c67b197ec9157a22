//! Build-time network configuration
//!
//! `build.rs` exports these from `.env`; empty values fall back to defaults.

use hearth_core::config::{Config, DEFAULT_TIME_ZONE};

pub const WIFI_SSID: &str = env!("HEARTH_WIFI_SSID");
pub const WIFI_PASSWORD: &str = env!("HEARTH_WIFI_PASSWORD");
const TIME_ZONE: &str = env!("HEARTH_TIME_ZONE");

/// Device configuration assembled from the baked-in values.
pub fn config() -> Config<'static> {
    let time_zone = if TIME_ZONE.is_empty() {
        DEFAULT_TIME_ZONE
    } else {
        TIME_ZONE
    };

    if WIFI_SSID.is_empty() {
        log::warn!(" HEARTH_WIFI_SSID was empty at build time, WiFi will not connect");
    }

    let mut config = Config::new(WIFI_SSID, WIFI_PASSWORD);
    config.time.time_zone = time_zone;
    config
}
