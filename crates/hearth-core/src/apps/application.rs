// src/apps/application.rs
//! Core application abstraction and type-erased wrapper.
//!
//! This module defines the [`Application`] trait every interactive screen
//! implements, along with [`AppWrapper`], an enum that lets the
//! [`AppRegistry`](super::registry::AppRegistry) store concrete application
//! types side by side without `dyn`.
//!
//! # Application Trait
//!
//! The registry calls these methods in a fixed order:
//!
//! 1. **`on_activate`** / **`on_deactivate`** when the active application
//!    changes. Only the registry calls these, which is what keeps exactly
//!    one application active.
//! 2. **`run_tick`** once per main-loop iteration, for every registered
//!    application (inactive ones still watch their menu-bar button).
//! 3. **`draw_menu_icon`** and **`redraw`** whenever the whole screen is
//!    repainted, e.g. after a theme change.
//!
//! Applications never reach into shared state. Everything they may change
//! outside themselves comes back from `run_tick` as an [`Action`].

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use log::warn;

use crate::config::PRESS_CHECK_INTERVAL_MS;
use crate::error::{AppError, truncated};
use crate::scheduler::{Gate, Tick};
use crate::touch::TouchPoint;
use crate::ui::{RedrawSet, Theme};

extern crate alloc;
use alloc::boxed::Box;

/// Most actions a single application emits in one tick
pub const MAX_ACTIONS: usize = 4;

/// Known applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppId {
    #[default]
    ThemeSelector,
}

impl AppId {
    pub const ALL: [AppId; 1] = [AppId::ThemeSelector];

    /// Stable identifier, also the value persisted under the `"app"` key.
    pub const fn name(self) -> &'static str {
        match self {
            AppId::ThemeSelector => "themeSelector",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|id| id.name() == name)
            .ok_or_else(|| AppError::UnknownApplication(truncated(name)))
    }
}

/// Request from an application to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Make this application the active one
    Activate(AppId),
    /// Replace the current theme
    SwitchTheme(Theme),
}

/// Everything an application may read during a tick.
#[derive(Debug, Clone, Copy)]
pub struct AppContext {
    pub now: Tick,
    /// Touch position in screen pixels, `None` when the panel is untouched
    pub touch: Option<TouchPoint>,
    pub theme: Theme,
}

/// Result of one application tick: requested actions plus the regions the
/// application already redrew itself.
#[derive(Debug, Default, Clone)]
pub struct AppActions {
    actions: heapless::Vec<Action, MAX_ACTIONS>,
    pub redrawn: RedrawSet,
}

impl AppActions {
    pub fn push(&mut self, action: Action) {
        if self.actions.push(action).is_err() {
            warn!(" Action queue full, dropping {:?}", action);
        }
    }

    /// Append another application's actions and redraws.
    pub fn extend(&mut self, other: AppActions) {
        for action in other.actions {
            self.push(action);
        }
        self.redrawn.merge(other.redrawn);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn theme_switches(&self) -> impl Iterator<Item = Theme> + '_ {
        self.actions.iter().filter_map(|action| match action {
            Action::SwitchTheme(theme) => Some(*theme),
            _ => None,
        })
    }
}

impl IntoIterator for AppActions {
    type Item = Action;
    type IntoIter = <heapless::Vec<Action, MAX_ACTIONS> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}

/// Activation bookkeeping shared by every application.
///
/// `active` is written only through [`AppState::activate`] and
/// [`AppState::deactivate`], which only the registry reaches.
#[derive(Debug, Clone)]
pub struct AppState {
    active: bool,
    /// The activation draw has run since the app last became active
    pub switched_to: bool,
    press_gate: Gate,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub const fn new() -> Self {
        Self {
            active: false,
            switched_to: false,
            press_gate: Gate::new(PRESS_CHECK_INTERVAL_MS),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.switched_to = false;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// True on the first tick after activation.
    pub fn needs_activation_draw(&self) -> bool {
        self.active && !self.switched_to
    }

    /// Press gate: true at most once per check interval.
    pub fn poll_press_gate(&mut self, now: Tick) -> bool {
        self.press_gate.poll(now)
    }

    pub fn check_press_time(&self) -> Tick {
        self.press_gate.last_fired()
    }
}

// ---------------------------------------------------------------------------
// Application trait
// ---------------------------------------------------------------------------

pub trait Application {
    fn id(&self) -> AppId;

    fn is_active(&self) -> bool;

    /// Called by the registry only.
    fn on_activate(&mut self);

    /// Called by the registry only.
    fn on_deactivate(&mut self);

    /// One scheduling step. Must rate-limit its own button evaluation.
    fn run_tick<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        ctx: &AppContext,
        display: &mut D,
    ) -> Result<AppActions, D::Error>;

    /// Menu-bar icon, showing press feedback while it is active.
    fn draw_menu_icon<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        now: Tick,
        theme: &Theme,
        display: &mut D,
    ) -> Result<(), D::Error>;

    /// Repaint the application region. Does nothing while inactive.
    fn redraw<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        theme: &Theme,
        display: &mut D,
    ) -> Result<(), D::Error>;
}

// ---------------------------------------------------------------------------
// Blanket impl: Box<T> where T: Application
// ---------------------------------------------------------------------------

impl<T: Application> Application for Box<T> {
    fn id(&self) -> AppId {
        (**self).id()
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }

    fn on_activate(&mut self) {
        (**self).on_activate()
    }

    fn on_deactivate(&mut self) {
        (**self).on_deactivate()
    }

    fn run_tick<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        ctx: &AppContext,
        display: &mut D,
    ) -> Result<AppActions, D::Error> {
        (**self).run_tick(ctx, display)
    }

    fn draw_menu_icon<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        now: Tick,
        theme: &Theme,
        display: &mut D,
    ) -> Result<(), D::Error> {
        (**self).draw_menu_icon(now, theme, display)
    }

    fn redraw<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        theme: &Theme,
        display: &mut D,
    ) -> Result<(), D::Error> {
        (**self).redraw(theme, display)
    }
}

// ---------------------------------------------------------------------------
// AppWrapper
// ---------------------------------------------------------------------------

/// Enum-based wrapper holding one of the concrete application types.
///
/// Add a variant here (and to [`AppId`]) when adding an application.
pub enum AppWrapper {
    ThemeSelector(Box<super::theme_selector::ThemeSelectorApp>),
}

impl Application for AppWrapper {
    fn id(&self) -> AppId {
        match self {
            AppWrapper::ThemeSelector(app) => app.id(),
        }
    }

    fn is_active(&self) -> bool {
        match self {
            AppWrapper::ThemeSelector(app) => app.is_active(),
        }
    }

    fn on_activate(&mut self) {
        match self {
            AppWrapper::ThemeSelector(app) => app.on_activate(),
        }
    }

    fn on_deactivate(&mut self) {
        match self {
            AppWrapper::ThemeSelector(app) => app.on_deactivate(),
        }
    }

    fn run_tick<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        ctx: &AppContext,
        display: &mut D,
    ) -> Result<AppActions, D::Error> {
        match self {
            AppWrapper::ThemeSelector(app) => app.run_tick(ctx, display),
        }
    }

    fn draw_menu_icon<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        now: Tick,
        theme: &Theme,
        display: &mut D,
    ) -> Result<(), D::Error> {
        match self {
            AppWrapper::ThemeSelector(app) => app.draw_menu_icon(now, theme, display),
        }
    }

    fn redraw<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        theme: &Theme,
        display: &mut D,
    ) -> Result<(), D::Error> {
        match self {
            AppWrapper::ThemeSelector(app) => app.redraw(theme, display),
        }
    }
}

impl AppWrapper {
    /// Construct the application for `id` in its initial, inactive state.
    pub fn create(id: AppId) -> Self {
        match id {
            AppId::ThemeSelector => {
                AppWrapper::ThemeSelector(Box::new(super::theme_selector::ThemeSelectorApp::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::RUST_DARK;

    #[test]
    fn test_app_id_names() {
        assert_eq!(AppId::ThemeSelector.name(), "themeSelector");
        assert_eq!(AppId::from_name("themeSelector"), Ok(AppId::ThemeSelector));
        assert!(matches!(
            AppId::from_name("unknownApp"),
            Err(AppError::UnknownApplication(name)) if name == "unknownApp"
        ));
    }

    #[test]
    fn test_state_activation_resets_switched_to() {
        let mut state = AppState::new();
        assert!(!state.needs_activation_draw());
        state.activate();
        assert!(state.needs_activation_draw());
        state.switched_to = true;
        assert!(!state.needs_activation_draw());
        state.activate();
        assert!(state.needs_activation_draw());
        state.deactivate();
        assert!(!state.is_active());
    }

    #[test]
    fn test_press_gate_interval() {
        let mut state = AppState::new();
        assert!(state.poll_press_gate(Tick(10)));
        assert!(!state.poll_press_gate(Tick(19)));
        assert!(state.poll_press_gate(Tick(20)));
        assert_eq!(state.check_press_time(), Tick(20));
    }

    #[test]
    fn test_actions_extend_merges_redraws() {
        let mut a = AppActions::default();
        a.push(Action::Activate(AppId::ThemeSelector));
        let mut b = AppActions::default();
        b.push(Action::SwitchTheme(RUST_DARK));
        b.redrawn.menu_icon = true;
        a.extend(b);
        assert_eq!(a.len(), 2);
        assert!(a.redrawn.menu_icon);
        assert_eq!(a.theme_switches().collect::<heapless::Vec<_, 2>>(), [RUST_DARK]);
    }
}
