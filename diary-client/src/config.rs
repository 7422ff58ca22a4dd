//! Diary client configuration.

use crate::error::{DiaryError, DiaryResult};
use diary_crypto::{KdfParams, DEFAULT_RSA_BITS, MIN_RSA_BITS};
use serde::{Deserialize, Serialize};

/// Configuration for the diary client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the diary server (e.g., "https://diary.example.com").
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Master key derivation parameters. Must match the server's stored
    /// parameters for existing accounts.
    #[serde(default)]
    pub kdf: KdfParams,

    /// RSA modulus size for keypairs generated at registration.
    pub rsa_key_bits: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            request_timeout_secs: 30,
            kdf: KdfParams::default(),
            rsa_key_bits: DEFAULT_RSA_BITS,
        }
    }
}

impl ClientConfig {
    /// Rejects configurations the client cannot operate with.
    pub fn validate(&self) -> DiaryResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(DiaryError::Config("api_base_url is empty".to_string()));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(DiaryError::Config(format!(
                "api_base_url must be an http(s) URL, got {}",
                self.api_base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(DiaryError::Config("request_timeout_secs must be positive".to_string()));
        }
        if self.kdf.iterations == 0 {
            return Err(DiaryError::Config("kdf.iterations must be positive".to_string()));
        }
        if self.rsa_key_bits < MIN_RSA_BITS {
            return Err(DiaryError::Config(format!(
                "rsa_key_bits must be at least {MIN_RSA_BITS}"
            )));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub(crate) fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}
