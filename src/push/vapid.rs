//! VAPID application server key decoding
//!
//! The backend hands out the public key as unpadded base64url; the push
//! platform wants the raw key bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Restore `=` padding to a multiple of four characters
pub fn pad_base64(input: &str) -> String {
    let padding = (4 - input.len() % 4) % 4;
    let mut padded = String::with_capacity(input.len() + padding);
    padded.push_str(input);
    padded.extend(std::iter::repeat('=').take(padding));
    padded
}

/// Decode a base64url string, padded or not, into raw bytes
pub fn decode_base64url(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let standard: String = pad_base64(input.trim())
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    STANDARD.decode(standard)
}
