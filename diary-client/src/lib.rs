//! Client core for the end-to-end-encrypted diary.
//!
//! Provides:
//! - Registration and login that rebuild the key hierarchy locally
//! - A per-client key cache behind the [`KeyStore`] trait
//! - Entry encryption, including re-encryption when an entry changes diary
//! - The two-sided sharing protocol (share, then accept)
//! - An HTTP backend for the diary server
//!
//! The server only ever stores wrapped keys and ciphertext.

pub mod api_client;
pub mod backend;
pub mod client;
pub mod config;
pub mod diary_keys;
pub mod entry_codec;
pub mod error;
pub mod identity;
pub mod key_store;
pub mod session;
pub mod sharing;
pub mod types;

pub use api_client::DiaryApiClient;
pub use backend::DiaryBackend;
pub use client::DiaryClient;
pub use config::ClientConfig;
pub use error::{DiaryError, DiaryResult};
pub use key_store::{KeySlot, KeyStore, MemoryKeyStore};
pub use types::*;

/// Installs a stderr `tracing` subscriber filtered by `RUST_LOG`
/// (default `info`). Does nothing if a subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
