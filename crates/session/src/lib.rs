//! `carecircle-session` — durable session state.
//!
//! The session lives behind an injected [`KeyValueStore`] so consumers never
//! touch the backing storage directly. [`SessionStore`] owns the field
//! layout, the write/clear ordering contracts, and the tolerant read path.

pub mod keys;
pub mod kv;
pub mod store;

pub use kv::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
pub use store::SessionStore;
