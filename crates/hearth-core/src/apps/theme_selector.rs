// src/apps/theme_selector.rs
//! Theme selector application
//!
//! Two colour tiles pick the theme family and a text toggle flips between
//! light and dark. The menu-bar button "Themes" activates the app.
//!
//! ```text
//!  170        225
//!   +----+     LIGHT / DARK   <- toggle (225, 45, 70x20)
//!   |rust|
//!   +----+
//!   +----+
//!   |indi|
//!   +----+
//!   Theme Selector
//! ```

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::apps::application::{Action, AppActions, AppContext, AppId, AppState, Application};
use crate::scheduler::Tick;
use crate::ui::theme::{INDIGO_LIGHT, RUST_LIGHT};
use crate::ui::widgets::{self, CONTROL_FONT, LABEL_FONT};
use crate::ui::{Button, Theme, ThemeFamily};

const MENU_BUTTON: Rectangle = Rectangle::new(Point::new(0, 0), Size::new(70, 25));
const MENU_LABEL: &str = "Themes";
const MENU_LABEL_ORIGIN: Point = Point::new(15, 7);
/// Divider to the right of the menu icon
const MENU_SEPARATOR: Rectangle = Rectangle::new(Point::new(65, 0), Size::new(5, 25));

const RUST_TILE: Rectangle = Rectangle::new(Point::new(170, 40), Size::new(40, 40));
const INDIGO_TILE: Rectangle = Rectangle::new(Point::new(170, 90), Size::new(40, 40));
const TOGGLE: Rectangle = Rectangle::new(Point::new(225, 45), Size::new(70, 20));

const TITLE: &str = "Theme Selector";
const TITLE_ORIGIN: Point = Point::new(170, 215);

pub struct ThemeSelectorApp {
    state: AppState,
    /// Brightness the next tile press will select
    dark: bool,
    menu_button: Button,
    rust_button: Button,
    indigo_button: Button,
    toggle_button: Button,
}

impl Default for ThemeSelectorApp {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeSelectorApp {
    pub fn new() -> Self {
        Self {
            state: AppState::new(),
            dark: false,
            menu_button: Button::from_rect(MENU_BUTTON),
            rust_button: Button::from_rect(RUST_TILE),
            indigo_button: Button::from_rect(INDIGO_TILE),
            toggle_button: Button::from_rect(TOGGLE),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dark(&self) -> bool {
        self.dark
    }

    pub fn menu_button(&self) -> &Button {
        &self.menu_button
    }

    fn draw_theme_tiles<D>(&self, theme: &Theme, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        widgets::draw_border(display, RUST_TILE, theme.high, RUST_LIGHT.back)?;
        widgets::draw_border(display, INDIGO_TILE, theme.high, INDIGO_LIGHT.back)?;
        widgets::draw_label(
            display,
            TITLE,
            TITLE_ORIGIN,
            LABEL_FONT,
            theme.text,
            theme.back,
        )
    }

    /// Label names the mode the toggle switches to.
    fn draw_dark_mode_toggle<D>(&self, theme: &Theme, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        widgets::fill_rect(display, TOGGLE, theme.back)?;
        let label = if theme.dark { "LIGHT" } else { "DARK" };
        widgets::draw_label(
            display,
            label,
            TOGGLE.top_left,
            CONTROL_FONT,
            theme.text,
            theme.back,
        )
    }

    /// Evaluate the app's own buttons. Returns the theme to switch to, if any.
    fn poll_theme_buttons(&mut self, ctx: &AppContext) -> Option<Theme> {
        let toggle = self.toggle_button.poll(ctx.touch, ctx.now).is_press();
        let rust = self.rust_button.poll(ctx.touch, ctx.now).is_press();
        let indigo = self.indigo_button.poll(ctx.touch, ctx.now).is_press();

        if toggle {
            self.dark = !self.dark;
        }

        let mut selected = ctx.theme;
        let mut switched = false;

        // The family check sees any selection made earlier in this tick, so
        // the toggle re-applies at most one family.
        if rust || (toggle && selected.family == ThemeFamily::Rust) {
            selected = Theme::select(ThemeFamily::Rust, self.dark);
            switched = true;
        }
        if indigo || (toggle && selected.family == ThemeFamily::Indigo) {
            selected = Theme::select(ThemeFamily::Indigo, self.dark);
            switched = true;
        }

        switched.then_some(selected)
    }
}

impl Application for ThemeSelectorApp {
    fn id(&self) -> AppId {
        AppId::ThemeSelector
    }

    fn is_active(&self) -> bool {
        self.state.is_active()
    }

    fn on_activate(&mut self) {
        debug!(" Theme selector activated");
        self.state.activate();
    }

    fn on_deactivate(&mut self) {
        self.state.deactivate();
    }

    fn run_tick<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        ctx: &AppContext,
        display: &mut D,
    ) -> Result<AppActions, D::Error> {
        let mut out = AppActions::default();

        if self.state.needs_activation_draw() {
            self.dark = ctx.theme.dark;
            self.redraw(&ctx.theme, display)?;
            self.state.switched_to = true;
            out.redrawn.app_region = true;
        }

        if self.state.poll_press_gate(ctx.now) {
            if self.menu_button.poll(ctx.touch, ctx.now).is_press() {
                debug!(" Themes menu button pressed");
                out.push(Action::Activate(AppId::ThemeSelector));
                self.state.switched_to = false;
                self.draw_menu_icon(ctx.now, &ctx.theme, display)?;
                out.redrawn.menu_icon = true;
            }

            if self.state.is_active() {
                if let Some(theme) = self.poll_theme_buttons(ctx) {
                    debug!(
                        " Theme switch requested: {} (dark: {})",
                        theme.class_name(),
                        theme.dark
                    );
                    out.push(Action::SwitchTheme(theme));
                }
            }
        }

        if self.menu_button.feedback_stale(ctx.now) {
            self.draw_menu_icon(ctx.now, &ctx.theme, display)?;
            out.redrawn.menu_icon = true;
        }

        Ok(out)
    }

    fn draw_menu_icon<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        now: Tick,
        theme: &Theme,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let pressed = self.menu_button.feedback_active(now);
        let (fg, bg) = if pressed {
            (theme.back, theme.text)
        } else {
            (theme.text, theme.back)
        };
        widgets::draw_label(display, MENU_LABEL, MENU_LABEL_ORIGIN, LABEL_FONT, fg, bg)?;
        widgets::fill_rect(display, MENU_SEPARATOR, theme.fore)?;
        self.menu_button.set_feedback_shown(pressed);
        self.menu_button.expire_feedback(now);
        Ok(())
    }

    fn redraw<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        theme: &Theme,
        display: &mut D,
    ) -> Result<(), D::Error> {
        if !self.state.is_active() {
            return Ok(());
        }
        widgets::clear_app_region(display, theme)?;
        self.draw_theme_tiles(theme, display)?;
        self.draw_dark_mode_toggle(theme, display)
    }
}
