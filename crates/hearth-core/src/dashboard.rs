//! Top-level UI state and the per-tick control flow
//!
//! [`Dashboard`] owns everything the screen shows: the current theme, the
//! application registry, the update scheduler and the settings store the
//! theme and active app are persisted to. The platform loop samples the
//! monotonic clock and the touch panel, then calls [`Dashboard::tick`] once
//! per iteration:
//!
//! 1. time-gated clock and signal redraws,
//! 2. one tick of every registered application,
//! 3. the applications' actions: activation switches and theme changes,
//!    each persisted, with a single full repaint for a theme change.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use log::{info, warn};

use crate::apps::{Action, AppContext, AppId, AppRegistry};
use crate::clock::WallClock;
use crate::network::Network;
use crate::scheduler::{Tick, UpdateScheduler};
use crate::settings::{self, SettingsStore};
use crate::touch::{RawTouch, TouchCalibration};
use crate::ui::{RedrawSet, Theme, widgets};

pub struct Dashboard<S: SettingsStore> {
    theme: Theme,
    registry: AppRegistry,
    scheduler: UpdateScheduler,
    settings: S,
    calibration: TouchCalibration,
    show_grid: bool,
}

impl<S: SettingsStore> Dashboard<S> {
    /// Restore theme and active application from `settings`, falling back
    /// to defaults for anything missing or unreadable.
    pub fn new(mut settings: S, now: Tick) -> Self {
        let theme = settings::load_theme(&mut settings);
        let app = settings::load_app(&mut settings);

        let mut registry = AppRegistry::with_all_apps();
        if let Err(err) = registry.activate(app) {
            warn!(" Could not restore {}: {}", app.name(), err);
        }

        let mut scheduler = UpdateScheduler::new();
        scheduler.arm(now);

        info!(
            " Dashboard ready: {} theme (dark: {}), app {}",
            theme.class_name(),
            theme.dark,
            app.name()
        );

        Self {
            theme,
            registry,
            scheduler,
            settings,
            calibration: TouchCalibration::default(),
            show_grid: false,
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn active_app(&self) -> Option<AppId> {
        self.registry.active_id()
    }

    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut S {
        &mut self.settings
    }

    pub fn calibration(&self) -> &TouchCalibration {
        &self.calibration
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    /// First paint after boot.
    pub fn start<D, C, N>(
        &mut self,
        now: Tick,
        clock: &mut C,
        network: &N,
        display: &mut D,
    ) -> Result<RedrawSet, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
        C: WallClock + ?Sized,
        N: Network + ?Sized,
    {
        self.repaint(now, clock, network, display)
    }

    /// One main-loop iteration.
    pub fn tick<D, C, N>(
        &mut self,
        now: Tick,
        touch: Option<RawTouch>,
        clock: &mut C,
        network: &N,
        display: &mut D,
    ) -> Result<RedrawSet, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
        C: WallClock + ?Sized,
        N: Network + ?Sized,
    {
        let mut redrawn = self
            .scheduler
            .run(now, &self.theme, clock, network, display)?;

        let ctx = AppContext {
            now,
            touch: touch.map(|raw| self.calibration.map(raw)),
            theme: self.theme,
        };
        let outcome = self.registry.run_tick(&ctx, display)?;
        redrawn.merge(outcome.redrawn);

        let mut theme_switch = None;
        for action in outcome {
            match action {
                Action::Activate(id) => self.activate(id),
                Action::SwitchTheme(theme) => theme_switch = Some(theme),
            }
        }

        if let Some(theme) = theme_switch {
            redrawn.merge(self.switch_theme(theme, now, clock, network, display)?);
        }

        Ok(redrawn)
    }

    /// Show or hide the 10 px layout grid.
    pub fn set_grid<D, C, N>(
        &mut self,
        show: bool,
        now: Tick,
        clock: &mut C,
        network: &N,
        display: &mut D,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
        C: WallClock + ?Sized,
        N: Network + ?Sized,
    {
        if self.show_grid == show {
            return Ok(());
        }
        self.show_grid = show;
        if show {
            widgets::draw_grid(display, &self.theme)
        } else {
            self.repaint(now, clock, network, display).map(|_| ())
        }
    }

    fn activate(&mut self, id: AppId) {
        if self.registry.activate(id).is_err() {
            return;
        }
        if let Err(err) = settings::save_app(&mut self.settings, id) {
            warn!(" Failed to persist active app: {}", err);
        }
    }

    fn switch_theme<D, C, N>(
        &mut self,
        theme: Theme,
        now: Tick,
        clock: &mut C,
        network: &N,
        display: &mut D,
    ) -> Result<RedrawSet, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
        C: WallClock + ?Sized,
        N: Network + ?Sized,
    {
        info!(
            " Switching to {} theme (dark: {})",
            theme.class_name(),
            theme.dark
        );
        self.theme = theme;
        if let Err(err) = settings::save_theme(&mut self.settings, &self.theme) {
            warn!(" Failed to persist theme: {}", err);
        }
        self.repaint(now, clock, network, display)
    }

    /// Redraw the whole screen in the current theme.
    fn repaint<D, C, N>(
        &mut self,
        now: Tick,
        clock: &mut C,
        network: &N,
        display: &mut D,
    ) -> Result<RedrawSet, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
        C: WallClock + ?Sized,
        N: Network + ?Sized,
    {
        let mut redrawn = RedrawSet {
            layout: true,
            signal: true,
            menu_icon: true,
            ..Default::default()
        };

        widgets::draw_menu_layout(display, &self.theme)?;
        widgets::draw_signal_strength(display, &self.theme, network.rssi())?;
        if let Some(time) = clock.local_time() {
            widgets::draw_clock(display, &self.theme, &time)?;
            redrawn.clock = true;
        }
        self.registry.draw_menu_icons(now, &self.theme, display)?;
        redrawn.app_region = self.registry.redraw_active(&self.theme, display)?;

        if self.show_grid {
            widgets::draw_grid(display, &self.theme)?;
        }
        Ok(redrawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::LocalTime;
    use crate::settings::{MemorySettings, SettingsKey};
    use crate::testing::{FixedClock, StaticNetwork, TestCanvas};
    use crate::ui::theme::{INDIGO_DARK, RUST_DARK, RUST_LIGHT};

    const TOGGLE_POINT: Point = Point::new(260, 55);
    const MENU_POINT: Point = Point::new(30, 12);

    fn raw(point: Point) -> Option<RawTouch> {
        Some(TouchCalibration::CYD.unmap(point))
    }

    struct Rig {
        clock: FixedClock,
        network: StaticNetwork,
        canvas: TestCanvas,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                clock: FixedClock::new(Some(LocalTime::sample())),
                network: StaticNetwork::connected(-55),
                canvas: TestCanvas::new(),
            }
        }

        fn tick<S: SettingsStore>(
            &mut self,
            dashboard: &mut Dashboard<S>,
            now: u32,
            touch: Option<RawTouch>,
        ) -> RedrawSet {
            dashboard
                .tick(Tick(now), touch, &mut self.clock, &self.network, &mut self.canvas)
                .unwrap()
        }
    }

    /// Store whose writes always fail.
    struct ReadOnlySettings;

    impl SettingsStore for ReadOnlySettings {
        type Error = &'static str;

        fn get_bytes(&mut self, _: SettingsKey, _: &mut [u8]) -> Result<Option<usize>, Self::Error> {
            Ok(None)
        }

        fn put_bytes(&mut self, _: SettingsKey, _: &[u8]) -> Result<(), Self::Error> {
            Err("flash is read-only")
        }
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let dashboard = Dashboard::new(MemorySettings::new(), Tick(0));
        assert_eq!(*dashboard.theme(), RUST_LIGHT);
        assert_eq!(dashboard.active_app(), Some(AppId::ThemeSelector));
    }

    #[test]
    fn test_restores_stored_theme_and_ignores_unknown_app() {
        let mut store = MemorySettings::new();
        settings::save_theme(&mut store, &INDIGO_DARK).unwrap();
        store.put_string(SettingsKey::App, "unknownApp").unwrap();

        let dashboard = Dashboard::new(store, Tick(0));
        assert_eq!(*dashboard.theme(), INDIGO_DARK);
        assert_eq!(dashboard.active_app(), Some(AppId::ThemeSelector));
    }

    #[test]
    fn test_start_paints_everything() {
        let mut rig = Rig::new();
        let mut dashboard = Dashboard::new(MemorySettings::new(), Tick(0));
        let redrawn = dashboard
            .start(Tick(0), &mut rig.clock, &rig.network, &mut rig.canvas)
            .unwrap();
        assert!(redrawn.layout && redrawn.clock && redrawn.signal);
        assert!(redrawn.menu_icon && redrawn.app_region);
    }

    #[test]
    fn test_start_without_time_skips_clock() {
        let mut rig = Rig::new();
        rig.clock.set(None);
        let mut dashboard = Dashboard::new(MemorySettings::new(), Tick(0));
        let redrawn = dashboard
            .start(Tick(0), &mut rig.clock, &rig.network, &mut rig.canvas)
            .unwrap();
        assert!(redrawn.layout && !redrawn.clock);
    }

    #[test]
    fn test_toggle_switches_theme_persists_and_repaints_once() {
        let mut rig = Rig::new();
        let mut dashboard = Dashboard::new(MemorySettings::new(), Tick(0));
        dashboard
            .start(Tick(0), &mut rig.clock, &rig.network, &mut rig.canvas)
            .unwrap();

        // Activation draw of the restored app
        let redrawn = rig.tick(&mut dashboard, 1, None);
        assert!(redrawn.app_region && !redrawn.layout);

        let writes_before = dashboard.settings().writes;
        let redrawn = rig.tick(&mut dashboard, 20, raw(TOGGLE_POINT));
        assert_eq!(*dashboard.theme(), RUST_DARK);
        assert!(redrawn.layout && redrawn.clock && redrawn.signal);
        assert!(redrawn.menu_icon && redrawn.app_region);
        assert_eq!(dashboard.settings().writes, writes_before + 1);

        assert_eq!(settings::load_theme(dashboard.settings_mut()), RUST_DARK);

        // Holding the toggle does not switch again
        let redrawn = rig.tick(&mut dashboard, 40, raw(TOGGLE_POINT));
        assert!(!redrawn.layout);
        assert_eq!(*dashboard.theme(), RUST_DARK);
    }

    #[test]
    fn test_menu_press_persists_active_app() {
        let mut rig = Rig::new();
        let mut dashboard = Dashboard::new(MemorySettings::new(), Tick(0));
        assert!(!dashboard.settings().contains(SettingsKey::App));

        let redrawn = rig.tick(&mut dashboard, 20, raw(MENU_POINT));
        assert!(redrawn.menu_icon);
        assert_eq!(dashboard.active_app(), Some(AppId::ThemeSelector));
        assert!(dashboard.settings().contains(SettingsKey::App));

        // Activation draw follows on the next tick
        let redrawn = rig.tick(&mut dashboard, 21, raw(MENU_POINT));
        assert!(redrawn.app_region);
    }

    #[test]
    fn test_scheduler_redraws_follow_intervals() {
        let mut rig = Rig::new();
        let mut dashboard = Dashboard::new(MemorySettings::new(), Tick(1_000));
        dashboard
            .start(Tick(1_000), &mut rig.clock, &rig.network, &mut rig.canvas)
            .unwrap();

        assert!(!rig.tick(&mut dashboard, 5_999, None).clock);
        assert!(rig.tick(&mut dashboard, 6_000, None).clock);
        assert!(rig.tick(&mut dashboard, 31_000, None).signal);
    }

    #[test]
    fn test_settings_failures_are_not_fatal() {
        let mut rig = Rig::new();
        let mut dashboard = Dashboard::new(ReadOnlySettings, Tick(0));
        dashboard
            .start(Tick(0), &mut rig.clock, &rig.network, &mut rig.canvas)
            .unwrap();
        rig.tick(&mut dashboard, 1, None);
        rig.tick(&mut dashboard, 20, raw(TOGGLE_POINT));
        assert_eq!(*dashboard.theme(), RUST_DARK);
    }

    #[test]
    fn test_grid_overlay_toggle() {
        let mut rig = Rig::new();
        let mut dashboard = Dashboard::new(MemorySettings::new(), Tick(0));
        dashboard
            .start(Tick(0), &mut rig.clock, &rig.network, &mut rig.canvas)
            .unwrap();

        dashboard
            .set_grid(true, Tick(1), &mut rig.clock, &rig.network, &mut rig.canvas)
            .unwrap();
        assert!(dashboard.show_grid());
        assert_eq!(rig.canvas.pixel(240, 100), Some(RUST_LIGHT.high));

        dashboard
            .set_grid(false, Tick(2), &mut rig.clock, &rig.network, &mut rig.canvas)
            .unwrap();
        assert_eq!(rig.canvas.pixel(240, 100), Some(RUST_LIGHT.back));
    }
}
