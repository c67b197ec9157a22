//! Persisted settings
//!
//! Two values survive a power cycle: the current theme and the identifier
//! of the active application. Storage itself is behind [`SettingsStore`]
//! (flash on the device, memory in the simulator and tests); this module
//! adds the typed keys and the load/save helpers that fall back to
//! defaults when nothing usable is stored.

use core::fmt::Debug;

use log::{debug, warn};

use crate::apps::AppId;
use crate::error::{AppError, truncated};
use crate::ui::Theme;
use crate::ui::theme::THEME_RECORD_MAX_LEN;

/// Longest value any key stores
pub const MAX_VALUE_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsKey {
    Theme,
    App,
}

impl SettingsKey {
    pub const ALL: [SettingsKey; 2] = [SettingsKey::Theme, SettingsKey::App];

    pub const fn as_str(self) -> &'static str {
        match self {
            SettingsKey::Theme => "theme",
            SettingsKey::App => "app",
        }
    }

    /// Compact numeric key for stores keyed by integers
    pub const fn id(self) -> u8 {
        match self {
            SettingsKey::Theme => 1,
            SettingsKey::App => 2,
        }
    }
}

/// Key/value persistence.
pub trait SettingsStore {
    type Error: Debug;

    /// Copy the value for `key` into `buf`, returning its length, or `None`
    /// when the key has never been written.
    fn get_bytes(&mut self, key: SettingsKey, buf: &mut [u8]) -> Result<Option<usize>, Self::Error>;

    fn put_bytes(&mut self, key: SettingsKey, value: &[u8]) -> Result<(), Self::Error>;

    fn get_string(
        &mut self,
        key: SettingsKey,
    ) -> Result<Option<heapless::String<MAX_VALUE_LEN>>, Self::Error> {
        let mut buf = [0u8; MAX_VALUE_LEN];
        let Some(len) = self.get_bytes(key, &mut buf)? else {
            return Ok(None);
        };
        Ok(core::str::from_utf8(&buf[..len]).ok().map(truncated))
    }

    fn put_string(&mut self, key: SettingsKey, value: &str) -> Result<(), Self::Error> {
        self.put_bytes(key, value.as_bytes())
    }
}

impl<S: SettingsStore + ?Sized> SettingsStore for &mut S {
    type Error = S::Error;

    fn get_bytes(&mut self, key: SettingsKey, buf: &mut [u8]) -> Result<Option<usize>, Self::Error> {
        (**self).get_bytes(key, buf)
    }

    fn put_bytes(&mut self, key: SettingsKey, value: &[u8]) -> Result<(), Self::Error> {
        (**self).put_bytes(key, value)
    }
}

fn store_error(err: impl Debug) -> AppError {
    let mut msg: heapless::String<64> = heapless::String::new();
    core::fmt::write(&mut msg, format_args!("{:?}", err)).ok();
    AppError::Settings(msg)
}

/// Stored theme, or the default when absent or undecodable.
pub fn load_theme<S: SettingsStore + ?Sized>(store: &mut S) -> Theme {
    let mut buf = [0u8; MAX_VALUE_LEN];
    match store.get_bytes(SettingsKey::Theme, &mut buf) {
        Ok(Some(len)) => match Theme::decode(&buf[..len]) {
            Ok(theme) => {
                debug!(" Loaded {} theme (dark: {})", theme.class_name(), theme.dark);
                theme
            }
            Err(err) => {
                warn!(" Stored theme unusable ({}), using default", err);
                Theme::default()
            }
        },
        Ok(None) => {
            debug!(" No stored theme, using default");
            Theme::default()
        }
        Err(err) => {
            warn!(" Failed to read theme: {:?}", err);
            Theme::default()
        }
    }
}

pub fn save_theme<S: SettingsStore + ?Sized>(store: &mut S, theme: &Theme) -> Result<(), AppError> {
    let mut buf = [0u8; THEME_RECORD_MAX_LEN];
    let encoded = theme.encode(&mut buf)?;
    store
        .put_bytes(SettingsKey::Theme, encoded)
        .map_err(store_error)
}

/// Stored active application, or the default when absent or unknown.
pub fn load_app<S: SettingsStore + ?Sized>(store: &mut S) -> AppId {
    match store.get_string(SettingsKey::App) {
        Ok(Some(name)) => match AppId::from_name(&name) {
            Ok(id) => id,
            Err(err) => {
                warn!(" {}, starting {} instead", err, AppId::default().name());
                AppId::default()
            }
        },
        Ok(None) => AppId::default(),
        Err(err) => {
            warn!(" Failed to read active app: {:?}", err);
            AppId::default()
        }
    }
}

pub fn save_app<S: SettingsStore + ?Sized>(store: &mut S, app: AppId) -> Result<(), AppError> {
    store
        .put_string(SettingsKey::App, app.name())
        .map_err(store_error)
}

/// Volatile store for the simulator and tests.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: [Option<heapless::Vec<u8, MAX_VALUE_LEN>>; SettingsKey::ALL.len()],
    pub writes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemorySettingsError {
    /// Value larger than [`MAX_VALUE_LEN`]
    TooLarge,
    /// Caller's buffer cannot hold the stored value
    BufferTooSmall,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(key: SettingsKey) -> usize {
        match key {
            SettingsKey::Theme => 0,
            SettingsKey::App => 1,
        }
    }

    pub fn contains(&self, key: SettingsKey) -> bool {
        self.values[Self::slot(key)].is_some()
    }
}

impl SettingsStore for MemorySettings {
    type Error = MemorySettingsError;

    fn get_bytes(&mut self, key: SettingsKey, buf: &mut [u8]) -> Result<Option<usize>, Self::Error> {
        let Some(value) = &self.values[Self::slot(key)] else {
            return Ok(None);
        };
        let dest = buf
            .get_mut(..value.len())
            .ok_or(MemorySettingsError::BufferTooSmall)?;
        dest.copy_from_slice(value);
        Ok(Some(value.len()))
    }

    fn put_bytes(&mut self, key: SettingsKey, value: &[u8]) -> Result<(), Self::Error> {
        let stored =
            heapless::Vec::from_slice(value).map_err(|_| MemorySettingsError::TooLarge)?;
        self.values[Self::slot(key)] = Some(stored);
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::{INDIGO_DARK, RUST_LIGHT};

    #[test]
    fn test_key_names_and_ids() {
        assert_eq!(SettingsKey::Theme.as_str(), "theme");
        assert_eq!(SettingsKey::App.as_str(), "app");
        assert_ne!(SettingsKey::Theme.id(), SettingsKey::App.id());
        assert!(SettingsKey::ALL.iter().all(|key| key.id() != 0));
    }

    #[test]
    fn test_missing_theme_defaults_to_rust_light() {
        let mut store = MemorySettings::new();
        assert_eq!(load_theme(&mut store), RUST_LIGHT);
    }

    #[test]
    fn test_theme_save_and_load() {
        let mut store = MemorySettings::new();
        save_theme(&mut store, &INDIGO_DARK).unwrap();
        assert!(store.contains(SettingsKey::Theme));
        assert_eq!(load_theme(&mut store), INDIGO_DARK);
    }

    #[test]
    fn test_corrupt_theme_defaults() {
        let mut store = MemorySettings::new();
        store.put_bytes(SettingsKey::Theme, &[0xFF; 5]).unwrap();
        assert_eq!(load_theme(&mut store), RUST_LIGHT);
    }

    #[test]
    fn test_app_round_trip_and_fallback() {
        let mut store = MemorySettings::new();
        assert_eq!(load_app(&mut store), AppId::ThemeSelector);

        save_app(&mut store, AppId::ThemeSelector).unwrap();
        assert_eq!(
            store.get_string(SettingsKey::App).unwrap().as_deref(),
            Some("themeSelector")
        );

        store.put_string(SettingsKey::App, "unknownApp").unwrap();
        assert_eq!(load_app(&mut store), AppId::ThemeSelector);
    }

    #[test]
    fn test_memory_store_limits() {
        let mut store = MemorySettings::new();
        assert_eq!(
            store.put_bytes(SettingsKey::App, &[0; MAX_VALUE_LEN + 1]),
            Err(MemorySettingsError::TooLarge)
        );
        store.put_bytes(SettingsKey::App, &[1, 2, 3]).unwrap();
        let mut small = [0u8; 2];
        assert_eq!(
            store.get_bytes(SettingsKey::App, &mut small),
            Err(MemorySettingsError::BufferTooSmall)
        );
    }
}
