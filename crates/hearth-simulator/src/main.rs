//! Desktop simulator for the hearth touchscreen status display.
//!
//! Runs the hearth-core [`Dashboard`] in an SDL2 window via
//! `embedded-graphics-simulator`, with the host clock standing in for SNTP
//! and a fake WiFi link whose signal strength drifts over time.
//!
//! # Key bindings
//!
//! | Key   | Action                       |
//! |-------|------------------------------|
//! | G     | Toggle the layout grid       |
//! | W     | Toggle the fake WiFi link    |
//! | Q/Esc | Quit                         |
//!
//! Holding the mouse button is a held touch. The pointer position is turned
//! back into raw panel readings so the dashboard sees what the touch
//! controller would report.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{info, warn};

use hearth_core::clock::{LocalTime, TimeZone, WallClock};
use hearth_core::config::{DEFAULT_TIME_ZONE, DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use hearth_core::network::Network;
use hearth_core::settings::MemorySettings;
use hearth_core::touch::{RawTouch, TouchCalibration};
use hearth_core::{Dashboard, Tick};

// ---------------------------------------------------------------------------
// Display constants
// ---------------------------------------------------------------------------

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Target frame duration. Short enough for the 10 ms press gate to matter.
const FRAME_DURATION: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Host stand-ins
// ---------------------------------------------------------------------------

/// Wall clock read from the host, converted with a POSIX zone rule.
struct HostClock {
    zone: TimeZone,
}

impl WallClock for HostClock {
    fn local_time(&mut self) -> Option<LocalTime> {
        let unix = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
        Some(self.zone.to_local(unix as i64))
    }
}

/// Fake WiFi link with a slowly drifting RSSI.
struct MockNetwork {
    started: Instant,
    connected: bool,
}

impl MockNetwork {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            connected: true,
        }
    }
}

impl Network for MockNetwork {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn rssi(&self) -> Option<i8> {
        if !self.connected {
            return None;
        }
        // Sweeps roughly -95..-45 dBm every few minutes, crossing every bar threshold
        let t = self.started.elapsed().as_secs_f64();
        let rssi = -70.0 + 25.0 * (t / 40.0).sin();
        Some(rssi.round() as i8)
    }
}

/// Mouse state turned into touch samples.
#[derive(Default)]
struct MouseTouch {
    held: bool,
    position: Point,
}

impl MouseTouch {
    fn sample(&self, calibration: &TouchCalibration) -> Option<RawTouch> {
        self.held.then(|| calibration.unmap(self.position))
    }
}

fn time_zone() -> TimeZone {
    let rule = std::env::var("HEARTH_TIME_ZONE").unwrap_or_else(|_| DEFAULT_TIME_ZONE.into());
    TimeZone::parse(&rule).unwrap_or_else(|err| {
        warn!("Time zone {:?} rejected ({}), using UTC", rule, err);
        TimeZone::UTC
    })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting hearth simulator");
    info!(
        "Display: {}×{} (scale {}×)",
        DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX, WINDOW_SCALE
    );
    info!("Keys: G=Grid  W=WiFi  Q=Quit");

    // SDL2 display and window
    let mut display = SimulatorDisplay::<Rgb565>::new(Size::new(
        DISPLAY_WIDTH_PX as u32,
        DISPLAY_HEIGHT_PX as u32,
    ));

    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("Hearth Simulator", &output_settings);

    let boot = Instant::now();
    let now_tick = || Tick(boot.elapsed().as_millis() as u32);

    let mut clock = HostClock { zone: time_zone() };
    let mut network = MockNetwork::new();
    let mut mouse = MouseTouch::default();
    let mut dashboard = Dashboard::new(MemorySettings::new(), now_tick());

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    let _ = dashboard.start(now_tick(), &mut clock, &network, &mut display);
    window.update(&display);

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let frame_start = Instant::now();

        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::G => {
                        let show = !dashboard.show_grid();
                        info!("Grid overlay {}", if show { "on" } else { "off" });
                        let _ = dashboard.set_grid(
                            show,
                            now_tick(),
                            &mut clock,
                            &network,
                            &mut display,
                        );
                    }
                    Keycode::W => {
                        network.connected = !network.connected;
                        info!(
                            "Fake WiFi {}",
                            if network.connected { "connected" } else { "disconnected" }
                        );
                    }
                    _ => {}
                },

                SimulatorEvent::MouseButtonDown { point, .. } => {
                    mouse.held = true;
                    mouse.position = point;
                }
                SimulatorEvent::MouseMove { point } => mouse.position = point,
                SimulatorEvent::MouseButtonUp { .. } => mouse.held = false,

                _ => {}
            }
        }

        // --- Dashboard tick -----------------------------------------------
        let touch = mouse.sample(dashboard.calibration());
        let _ = dashboard.tick(now_tick(), touch, &mut clock, &network, &mut display);

        window.update(&display);

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    info!("Simulator exiting");
}
