//! Store module — the bitmap adapter over the key-value store's SETBIT.

pub mod bitmap;
pub mod client;

pub use bitmap::{BitmapWriter, Record};
pub use client::{BitStore, MockBitStore, RedisStore, StoreError};
