//! Flash-backed settings store
//!
//! Keys live in a sequential-storage map on the NVS partition, so repeated
//! theme and app saves are wear-levelled across its pages. The core settings
//! API is synchronous; flash operations complete without yielding, so the
//! async map calls are driven to completion with `block_on`.

use core::ops::Range;

use embassy_futures::block_on;
use embedded_storage::nor_flash::{ErrorType, NorFlash, ReadNorFlash};
use hearth_core::settings::{MAX_VALUE_LEN, SettingsKey, SettingsStore};
use sequential_storage::cache::NoCache;
use sequential_storage::map;

/// Default NVS partition of the stock ESP-IDF partition table
pub const NVS_RANGE: Range<u32> = 0x9000..0xF000;

/// Scratch space for one map entry: key, length header and value
const ENTRY_BUFFER_LEN: usize = MAX_VALUE_LEN + 16;

#[derive(Debug)]
pub enum FlashSettingsError<E> {
    Storage(sequential_storage::Error<E>),
    BufferTooSmall,
}

pub struct FlashSettings<F> {
    flash: F,
    range: Range<u32>,
}

impl<F> FlashSettings<F>
where
    F: NorFlash,
{
    pub fn new(flash: F, range: Range<u32>) -> Self {
        Self { flash, range }
    }
}

impl<F> SettingsStore for FlashSettings<F>
where
    F: NorFlash,
    F::Error: core::fmt::Debug,
{
    type Error = FlashSettingsError<F::Error>;

    fn get_bytes(&mut self, key: SettingsKey, buf: &mut [u8]) -> Result<Option<usize>, Self::Error> {
        let mut entry = [0u8; ENTRY_BUFFER_LEN];
        let found = block_on(map::fetch_item::<u8, &[u8], _>(
            &mut AsyncFlash(&mut self.flash),
            self.range.clone(),
            &mut NoCache::new(),
            &mut entry,
            &key.id(),
        ))
        .map_err(FlashSettingsError::Storage)?;

        let Some(value) = found else {
            return Ok(None);
        };
        let dest = buf
            .get_mut(..value.len())
            .ok_or(FlashSettingsError::BufferTooSmall)?;
        dest.copy_from_slice(value);
        Ok(Some(value.len()))
    }

    fn put_bytes(&mut self, key: SettingsKey, value: &[u8]) -> Result<(), Self::Error> {
        let mut entry = [0u8; ENTRY_BUFFER_LEN];
        block_on(map::store_item(
            &mut AsyncFlash(&mut self.flash),
            self.range.clone(),
            &mut NoCache::new(),
            &mut entry,
            &key.id(),
            &value,
        ))
        .map_err(FlashSettingsError::Storage)
    }
}

/// Exposes a blocking flash driver through the async NOR flash traits.
struct AsyncFlash<'a, F>(&'a mut F);

impl<F: ErrorType> ErrorType for AsyncFlash<'_, F> {
    type Error = F::Error;
}

impl<F: ReadNorFlash> embedded_storage_async::nor_flash::ReadNorFlash for AsyncFlash<'_, F> {
    const READ_SIZE: usize = F::READ_SIZE;

    async fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        self.0.read(offset, bytes)
    }

    fn capacity(&self) -> usize {
        self.0.capacity()
    }
}

impl<F: NorFlash> embedded_storage_async::nor_flash::NorFlash for AsyncFlash<'_, F> {
    const WRITE_SIZE: usize = F::WRITE_SIZE;
    const ERASE_SIZE: usize = F::ERASE_SIZE;

    async fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        self.0.erase(from, to)
    }

    async fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        self.0.write(offset, bytes)
    }
}
