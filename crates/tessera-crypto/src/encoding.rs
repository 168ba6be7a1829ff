//! Base64 and base64url codecs shared by key export, DIDs and JWS.
//!
//! Encoders emit the canonical form (padded base64, unpadded base64url).
//! Decoders accept either padding style since peers are not consistent.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::CryptoError;

const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub fn base64_encode(bytes: impl AsRef<[u8]>) -> String {
    BASE64.encode(bytes)
}

pub fn base64_decode(input: &str) -> Result<Vec<u8>, CryptoError> {
    BASE64
        .decode(input.trim())
        .map_err(|e| CryptoError::Encoding(format!("invalid base64: {}", e)))
}

pub fn base64url_encode(bytes: impl AsRef<[u8]>) -> String {
    BASE64URL.encode(bytes)
}

pub fn base64url_decode(input: &str) -> Result<Vec<u8>, CryptoError> {
    BASE64URL
        .decode(input)
        .map_err(|e| CryptoError::Encoding(format!("invalid base64url: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_known_vector() {
        assert_eq!(base64_encode(b"tessera"), "dGVzc2VyYQ==");
        assert_eq!(base64_decode("dGVzc2VyYQ==").unwrap(), b"tessera");
    }

    #[test]
    fn test_base64_decode_without_padding() {
        assert_eq!(base64_decode("dGVzc2VyYQ").unwrap(), b"tessera");
    }

    #[test]
    fn test_base64url_uses_url_alphabet_without_padding() {
        let encoded = base64url_encode([0xfb, 0xff, 0xfe]);
        assert_eq!(encoded, "-__-");
        assert!(!encoded.contains('='));
        assert_eq!(base64url_decode(&encoded).unwrap(), vec![0xfb, 0xff, 0xfe]);
    }

    #[test]
    fn test_base64url_decode_padded_input() {
        assert_eq!(base64url_decode("dGVzc2VyYQ==").unwrap(), b"tessera");
    }

    #[test]
    fn test_base64url_rejects_standard_alphabet() {
        assert!(base64url_decode("+/+/").is_err());
    }

    #[test]
    fn test_base64_rejects_garbage() {
        assert!(matches!(
            base64_decode("not base64!"),
            Err(CryptoError::Encoding(_))
        ));
    }
}
