// src/apps/registry.rs
//! Application registry and dispatcher.
//!
//! The registry owns every application and is the only code that flips an
//! application's active flag, so "at most one active application" holds
//! after every call.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use heapless::Vec;
use log::{info, warn};

use crate::apps::application::{AppActions, AppContext, AppId, AppWrapper, Application};
use crate::error::AppError;
use crate::scheduler::Tick;
use crate::ui::Theme;

/// Registry capacity
pub const MAX_APPS: usize = 4;

pub struct AppRegistry {
    apps: Vec<AppWrapper, MAX_APPS>,
}

impl Default for AppRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AppRegistry {
    pub const fn new() -> Self {
        Self { apps: Vec::new() }
    }

    /// Registry holding one instance of every known application, none active.
    pub fn with_all_apps() -> Self {
        let mut registry = Self::new();
        for id in AppId::ALL {
            registry.register(AppWrapper::create(id));
        }
        registry
    }

    /// Register an application. Duplicate ids and overflow are logged and dropped.
    pub fn register(&mut self, app: AppWrapper) {
        let id = app.id();
        if self.get(id).is_some() {
            warn!(" Application {} already registered", id.name());
            return;
        }
        if self.apps.push(app).is_err() {
            warn!(" Application registry full, dropping {}", id.name());
        }
    }

    pub fn get(&self, id: AppId) -> Option<&AppWrapper> {
        self.apps.iter().find(|app| app.id() == id)
    }

    pub fn get_mut(&mut self, id: AppId) -> Option<&mut AppWrapper> {
        self.apps.iter_mut().find(|app| app.id() == id)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub fn active_id(&self) -> Option<AppId> {
        self.apps
            .iter()
            .find(|app| app.is_active())
            .map(|app| app.id())
    }

    pub fn active_count(&self) -> usize {
        self.apps.iter().filter(|app| app.is_active()).count()
    }

    /// Activate the application registered under `name`.
    ///
    /// An unknown name is logged and leaves every application as it was.
    pub fn switch_active(&mut self, name: &str) -> Result<AppId, AppError> {
        let id = AppId::from_name(name).inspect_err(|err| warn!(" {}", err))?;
        self.activate(id)?;
        Ok(id)
    }

    /// Activate `id`, deactivating every other application first.
    ///
    /// Re-activating the active application restarts its activation draw.
    pub fn activate(&mut self, id: AppId) -> Result<(), AppError> {
        if self.get(id).is_none() {
            let err = AppError::UnknownApplication(crate::error::truncated(id.name()));
            warn!(" {}", err);
            return Err(err);
        }

        for app in self.apps.iter_mut() {
            if app.id() != id && app.is_active() {
                app.on_deactivate();
            }
        }
        if let Some(app) = self.get_mut(id) {
            app.on_activate();
        }
        info!(" Active application: {}", id.name());
        Ok(())
    }

    /// Run one tick of every registered application.
    pub fn run_tick<D>(&mut self, ctx: &AppContext, display: &mut D) -> Result<AppActions, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let mut combined = AppActions::default();
        for app in self.apps.iter_mut() {
            combined.extend(app.run_tick(ctx, display)?);
        }
        Ok(combined)
    }

    pub fn draw_menu_icons<D>(&mut self, now: Tick, theme: &Theme, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        for app in self.apps.iter_mut() {
            app.draw_menu_icon(now, theme, display)?;
        }
        Ok(())
    }

    /// Repaint the active application's region. Returns whether anything was active.
    pub fn redraw_active<D>(&mut self, theme: &Theme, display: &mut D) -> Result<bool, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        match self.apps.iter_mut().find(|app| app.is_active()) {
            Some(app) => {
                app.redraw(theme, display)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
