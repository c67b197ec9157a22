//! ESP32 firmware-specific modules for hearth
//!
//! This crate contains the code that only makes sense on the device: the
//! WiFi connection task, SNTP synchronisation over embassy-net, the flash
//! backed settings store and the wall clock shared between tasks.

#![no_std]

extern crate alloc;

pub mod flash_settings;
pub mod shared;
pub mod time_sync;
pub mod wifi;
pub mod wifi_secrets;
