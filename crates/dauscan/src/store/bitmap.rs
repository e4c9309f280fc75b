//! Bitmap — maps identifiers onto per-day bitmap offsets and writes them.

use std::sync::Arc;

use super::client::{BitStore, StoreError};
use crate::conf::StoreConfig;
use crate::logs::day::CalendarDay;

/// Outcome of recording one identifier for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    /// The bit was previously unset: a genuinely new activity record.
    New,
    /// Already recorded for that day; the write was a no-op.
    Repeat,
    /// Outside the counted population, or not numeric. Nothing was written.
    Rejected,
}

/// Writes per-day activity bitmaps through a [`BitStore`].
///
/// The store handle and the population bounds are fixed at construction.
pub struct BitmapWriter {
    store: Arc<dyn BitStore>,
    key_prefix: String,
    base_offset: u64,
    max_population: u64,
}

impl BitmapWriter {
    pub fn new(store: Arc<dyn BitStore>, config: &StoreConfig) -> Self {
        Self {
            store,
            key_prefix: config.key_prefix.clone(),
            base_offset: config.base_offset,
            max_population: config.max_population,
        }
    }

    /// The store key holding `day`'s bitmap.
    pub fn day_key(&self, day: CalendarDay) -> String {
        format!("{}{}", self.key_prefix, day.key())
    }

    /// Record `raw_id` as active on `day`.
    ///
    /// Bits only ever go 0→1 here, and setting an already-set bit is a
    /// no-op, so re-running a day is idempotent. Rejected identifiers never
    /// touch the store.
    pub async fn record_active(
        &self,
        day: CalendarDay,
        raw_id: &str,
    ) -> Result<Record, StoreError> {
        let Some(offset) = self.offset_of(raw_id) else {
            return Ok(Record::Rejected);
        };
        let previous = self.store.set_bit(&self.day_key(day), offset, true).await?;
        Ok(if previous { Record::Repeat } else { Record::New })
    }

    /// Bit position for an identifier, if it falls inside the population.
    fn offset_of(&self, raw_id: &str) -> Option<u64> {
        let id: u64 = raw_id.parse().ok()?;
        let offset = id.checked_sub(self.base_offset)?;
        (offset < self.max_population).then_some(offset)
    }
}

// ── Tests ───────────────────────────────────────────────────────
