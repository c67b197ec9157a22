// src/ui/theme.rs
//! Colour themes
//!
//! A [`Theme`] is an immutable bundle of four RGB565 colours plus the family
//! it belongs to and whether it is the dark variant. There are exactly four
//! themes (two families, light and dark each) and [`Theme::select`] is the
//! only way to obtain one, so `dark` always agrees with the constant it was
//! taken from.
//!
//! # Persistence
//!
//! Themes are persisted as a postcard-encoded [`ThemeRecord`]. Loading goes
//! through [`Theme::from_record`], which re-derives the canonical constant
//! from `(family, dark)` so a stale or tampered colour set can never reach
//! the screen.

use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Build an [`Rgb565`] from its packed 16-bit representation.
pub const fn rgb565(raw: u16) -> Rgb565 {
    Rgb565::new(
        (raw >> 11) as u8,
        ((raw >> 5) & 0x3f) as u8,
        (raw & 0x1f) as u8,
    )
}

/// Palette group, independent of light/dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThemeFamily {
    Rust,
    Indigo,
}

impl ThemeFamily {
    pub const fn class_name(self) -> &'static str {
        match self {
            ThemeFamily::Rust => "rust",
            ThemeFamily::Indigo => "indigo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub back: Rgb565,
    pub fore: Rgb565,
    pub high: Rgb565,
    pub text: Rgb565,
    pub family: ThemeFamily,
    pub dark: bool,
}

pub const RUST_LIGHT: Theme = Theme {
    back: rgb565(0x9a03),
    fore: rgb565(0x18ca),
    high: rgb565(0xd408),
    text: rgb565(0xe56e),
    family: ThemeFamily::Rust,
    dark: false,
};

pub const RUST_DARK: Theme = Theme {
    back: rgb565(0x212c),
    fore: rgb565(0x9a03),
    high: rgb565(0xe56e),
    text: rgb565(0xd408),
    family: ThemeFamily::Rust,
    dark: true,
};

pub const INDIGO_LIGHT: Theme = Theme {
    back: rgb565(0xe51b),
    fore: rgb565(0x9274),
    high: rgb565(0x6516),
    text: rgb565(0x4109),
    family: ThemeFamily::Indigo,
    dark: false,
};

pub const INDIGO_DARK: Theme = Theme {
    back: rgb565(0x4109),
    fore: rgb565(0x6516),
    high: rgb565(0x9274),
    text: rgb565(0xe51b),
    family: ThemeFamily::Indigo,
    dark: true,
};

impl Default for Theme {
    fn default() -> Self {
        RUST_LIGHT
    }
}

impl Theme {
    /// The theme constant for `family` in its light or dark variant.
    pub const fn select(family: ThemeFamily, dark: bool) -> Self {
        match (family, dark) {
            (ThemeFamily::Rust, false) => RUST_LIGHT,
            (ThemeFamily::Rust, true) => RUST_DARK,
            (ThemeFamily::Indigo, false) => INDIGO_LIGHT,
            (ThemeFamily::Indigo, true) => INDIGO_DARK,
        }
    }

    pub const fn class_name(&self) -> &'static str {
        self.family.class_name()
    }

    pub fn to_record(&self) -> ThemeRecord {
        ThemeRecord {
            family: self.family,
            dark: self.dark,
            back: self.back.into_storage(),
            fore: self.fore.into_storage(),
            high: self.high.into_storage(),
            text: self.text.into_storage(),
        }
    }

    /// Canonicalise a persisted record.
    pub fn from_record(record: &ThemeRecord) -> Self {
        let theme = Self::select(record.family, record.dark);
        if theme.to_record() != *record {
            warn!(
                " Stored {} theme colours do not match the built-in palette, using built-in",
                theme.class_name()
            );
        }
        theme
    }

    /// Serialize into `buf`, returning the used prefix.
    pub fn encode<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], AppError> {
        postcard::to_slice(&self.to_record(), buf).map_err(|_| AppError::Decode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, AppError> {
        let record: ThemeRecord = postcard::from_bytes(bytes).map_err(|_| AppError::Decode)?;
        Ok(Self::from_record(&record))
    }
}

/// Persisted form of a [`Theme`], colours as packed RGB565.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeRecord {
    pub family: ThemeFamily,
    pub dark: bool,
    pub back: u16,
    pub fore: u16,
    pub high: u16,
    pub text: u16,
}

/// Largest encoded [`ThemeRecord`] (two single-byte fields, four varint u16s)
pub const THEME_RECORD_MAX_LEN: usize = 2 + 4 * 3;
