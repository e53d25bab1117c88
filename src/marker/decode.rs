//! Transport-safe text decoding for marker payload blobs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decode base64 into UTF-8 text.
pub fn decode_text(encoded: &str) -> Result<String, String> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| format!("invalid base64: {e}"))?;
    String::from_utf8(bytes).map_err(|e| format!("decoded payload is not UTF-8: {e}"))
}
