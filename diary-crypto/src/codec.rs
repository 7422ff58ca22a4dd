//! Byte/text codecs for the boundary with the transport layer, which only
//! carries text.

use crate::error::{CryptoError, CryptoResult};
use base64::{engine::general_purpose::STANDARD, Engine};

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_base64(text: &str) -> CryptoResult<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| CryptoError::Encoding(format!("invalid base64: {e}")))
}

/// Strict UTF-8 decode.
pub fn bytes_to_text(bytes: Vec<u8>) -> CryptoResult<String> {
    String::from_utf8(bytes).map_err(|e| CryptoError::Encoding(format!("invalid utf-8: {e}")))
}
