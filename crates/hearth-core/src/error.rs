//! Application-wide error type
//!
//! None of these are fatal to the UI loop: every caller logs the error and
//! carries on with a fallback (default theme, previous app, retry later).

use thiserror_no_std::Error;

use crate::sntp::SntpError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Unknown application: {0}")]
    UnknownApplication(heapless::String<32>),
    #[error("Settings store error: {0}")]
    Settings(heapless::String<64>),
    #[error("Persisted value could not be decoded")]
    Decode,
    #[error("Gave up after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
    #[error("Invalid time zone rule")]
    InvalidTimeZone,
    #[error("SNTP error: {0}")]
    Sntp(SntpError),
}

impl From<SntpError> for AppError {
    fn from(err: SntpError) -> Self {
        AppError::Sntp(err)
    }
}

/// Copy as much of `value` as fits into a fixed-capacity string.
///
/// Error payloads are truncated rather than dropped so the log still shows
/// the start of the offending value.
pub fn truncated<const N: usize>(value: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in value.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
