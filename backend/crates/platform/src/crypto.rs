//! Cryptographic Utilities

use base64::{Engine, engine::general_purpose};
use rand::RngCore;

/// Number of random bytes behind a validation token
pub const TOKEN_BYTES: usize = 16;

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

/// Encode bytes as unpadded URL-safe base64, safe to embed in a path segment
pub fn to_base64_url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Fresh opaque token, 22 URL-safe characters
pub fn random_token() -> String {
    to_base64_url(&random_bytes(TOKEN_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_base64_url(s: &str) -> Vec<u8> {
        general_purpose::URL_SAFE_NO_PAD.decode(s).unwrap()
    }

    #[test]
    fn test_random_bytes() {
        let bytes = random_bytes(32);
        assert_eq!(bytes.len(), 32);
        // Should not be all zeros (statistically)
        assert!(bytes.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_base64_url_known_value() {
        let bytes = hex::decode("fbff00").unwrap();
        assert_eq!(to_base64_url(&bytes), "-_8A");
        assert_eq!(from_base64_url("-_8A"), bytes);
    }

    #[test]
    fn test_random_token_shape() {
        let token = random_token();
        assert_eq!(token.len(), 22);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(from_base64_url(&token).len(), TOKEN_BYTES);
        assert_ne!(token, random_token());
    }
}
