//! Storage Module
//!
//! The in-memory key-value store shared by every connection.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │                  Store                   │
//! │  Mutex<HashMap<Bytes, Entry>>            │
//! │                                          │
//! │  Entry { value, expires_at: Option<_> }  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! - **Single lock**: `GET` may delete an expired key, and that delete must
//!   not interleave with a `SET` of the same key.
//! - **Lazy expiry**: deadlines are only checked when a key is read.

pub mod store;

pub use store::{Entry, Store, StoreStats};
