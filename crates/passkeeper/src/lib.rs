//! passkeeper - Local credential store
//!
//! Per-service sets of `name -> secret` pairs, kept in flat `name:value` files
//! with every value encrypted individually (XChaCha20-Poly1305) under one
//! locally generated key.
//!
//! The key is never ambient: load it once with [`ensure_key`] and pass it to
//! [`Store::new`] or to the [`cipher`] and [`transcode`] functions directly.

pub mod cipher;
pub mod error;
pub mod key;
pub mod record;
pub mod store;
pub mod transcode;

pub use error::{Error, Result};
pub use key::{ensure_key, Key, KEY_LEN};
pub use record::{MalformedLine, Record, RecordSet};
pub use store::{init_storage, Store};
pub use transcode::{decrypt_all, encrypt_all};
