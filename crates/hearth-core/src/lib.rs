//! Hardware-independent core library for hearth
//!
//! This crate contains all platform-agnostic logic for the hearth touchscreen
//! status display: touch mapping and button hit testing, themes, the
//! application registry and the theme selector app, the update scheduler,
//! settings persistence, wall-clock/SNTP helpers and network retry policy.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32) and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod apps;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod drivers;
pub mod error;
pub mod network;
pub mod scheduler;
pub mod settings;
pub mod sntp;
pub mod touch;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

pub use dashboard::Dashboard;
pub use error::AppError;
pub use scheduler::Tick;
