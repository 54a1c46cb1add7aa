// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Evidence photo payload checks.
//!
//! Photos arrive already compressed, as `data:image/<type>;base64,<data>`
//! URLs. They are stored as given once they pass these checks.

use base64::{engine::general_purpose::STANDARD, Engine};

const DATA_URL_PREFIX: &str = "data:image/";
const BASE64_MARKER: &str = ";base64,";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PhotoError {
    #[error("Photo must be a base64 image data URL")]
    NotDataUrl,

    #[error("Photo data is not valid base64")]
    InvalidBase64,

    #[error("Photo is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// Check an evidence photo. The empty string (no photo) is accepted.
pub fn validate_data_url(data_url: &str, max_bytes: usize) -> Result<(), PhotoError> {
    if data_url.is_empty() {
        return Ok(());
    }

    let rest = data_url
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or(PhotoError::NotDataUrl)?;
    let (subtype, payload) = rest.split_once(BASE64_MARKER).ok_or(PhotoError::NotDataUrl)?;
    if subtype.is_empty() || !subtype.chars().all(is_subtype_char) {
        return Err(PhotoError::NotDataUrl);
    }

    // Reject oversized payloads before decoding them
    let estimated = payload.len() / 4 * 3;
    if estimated > max_bytes + 3 {
        return Err(PhotoError::TooLarge {
            size: estimated,
            limit: max_bytes,
        });
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| PhotoError::InvalidBase64)?;
    if bytes.len() > max_bytes {
        return Err(PhotoError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }
    Ok(())
}

fn is_subtype_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_url(bytes: &[u8]) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes))
    }

    #[test]
    fn test_accepts_empty_and_small_photo() {
        assert_eq!(validate_data_url("", 10), Ok(()));
        assert_eq!(validate_data_url(&data_url(&[0xff, 0xd8, 0xff]), 10), Ok(()));
    }

    #[test]
    fn test_rejects_other_payloads() {
        assert_eq!(
            validate_data_url("http://example.com/a.jpg", 10),
            Err(PhotoError::NotDataUrl)
        );
        assert_eq!(
            validate_data_url("data:image/png,abc", 10),
            Err(PhotoError::NotDataUrl)
        );
        assert_eq!(
            validate_data_url("data:image/png;base64,@@@@", 10),
            Err(PhotoError::InvalidBase64)
        );
    }

    #[test]
    fn test_rejects_oversized_photo() {
        let result = validate_data_url(&data_url(&[0u8; 100]), 50);
        assert!(matches!(result, Err(PhotoError::TooLarge { limit: 50, .. })));
    }
}
