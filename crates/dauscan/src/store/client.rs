//! Client — the narrow Redis surface the pipeline consumes.
//!
//! Only SETBIT is exposed. Going through a trait keeps tests off the
//! network: the mock implements the same bit semantics in process, so the
//! whole pipeline can be exercised against it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot connect to redis at {url}: {source}")]
    Connect {
        url: String,
        source: redis::RedisError,
    },
    #[error("redis command failed: {0}")]
    Command(#[from] redis::RedisError),
}

/// SETBIT-only view of the key-value store.
#[async_trait]
pub trait BitStore: Send + Sync {
    /// Atomically set the bit at `offset` in `key` and return its previous
    /// value. Must be the store's native bit-set primitive, never a
    /// read-modify-write sequence.
    async fn set_bit(&self, key: &str, offset: u64, value: bool) -> Result<bool, StoreError>;
}

pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(|source| StoreError::Connect {
            url: url.to_string(),
            source,
        })?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|source| StoreError::Connect {
                url: url.to_string(),
                source,
            })?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl BitStore for RedisStore {
    async fn set_bit(&self, key: &str, offset: u64, value: bool) -> Result<bool, StoreError> {
        // ConnectionManager clones share one multiplexed connection.
        let mut conn = self.manager.clone();
        let previous: bool = conn.setbit(key, offset as usize, value).await?;
        Ok(previous)
    }
}

/// In-process stand-in with real SETBIT semantics (MSB-first within each
/// byte, like Redis). State is shared across clones so a test can write
/// through the trait and assert through the struct.
#[derive(Clone, Default)]
pub struct MockBitStore {
    bits: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    ops: Arc<AtomicU64>,
    unavailable: Arc<AtomicBool>,
}

impl MockBitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail, as if the store went away.
    pub fn set_unavailable(&self, on: bool) {
        self.unavailable.store(on, Ordering::SeqCst);
    }

    /// Number of set_bit calls that reached the store.
    pub fn ops(&self) -> u64 {
        self.ops.load(Ordering::SeqCst)
    }

    pub fn bit(&self, key: &str, offset: u64) -> bool {
        let bits = self.bits.lock().unwrap();
        bits.get(key).is_some_and(|bytes| {
            bytes
                .get((offset / 8) as usize)
                .is_some_and(|byte| byte & (0x80 >> (offset % 8)) != 0)
        })
    }

    /// Population count of one bitmap.
    pub fn cardinality(&self, key: &str) -> u64 {
        let bits = self.bits.lock().unwrap();
        bits.get(key)
            .map_or(0, |bytes| bytes.iter().map(|b| b.count_ones() as u64).sum())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.bits.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BitStore for MockBitStore {
    async fn set_bit(&self, key: &str, offset: u64, value: bool) -> Result<bool, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Command(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "mock store unavailable",
            ))));
        }
        self.ops.fetch_add(1, Ordering::SeqCst);

        let mut bits = self.bits.lock().unwrap();
        let bytes = bits.entry(key.to_string()).or_default();
        let index = (offset / 8) as usize;
        if bytes.len() <= index {
            bytes.resize(index + 1, 0);
        }
        let mask = 0x80u8 >> (offset % 8);
        let previous = bytes[index] & mask != 0;
        if value {
            bytes[index] |= mask;
        } else {
            bytes[index] &= !mask;
        }
        Ok(previous)
    }
}
