//! Random identifiers and credentials.

use rand::RngExt;

/// Bytes of entropy in a client id (128 bits).
pub const CLIENT_ID_BYTES: usize = 16;

/// Bytes of entropy in client secrets, codes and tokens (256 bits).
pub const SECRET_BYTES: usize = 32;

/// `N` bytes from the thread-local CSPRNG, lower-case hex encoded.
#[must_use]
pub fn random_hex<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// A fresh 128-bit client id.
#[must_use]
pub fn client_id() -> String {
    random_hex::<CLIENT_ID_BYTES>()
}

/// A fresh 256-bit secret: client secret, authorization code, access or refresh token.
#[must_use]
pub fn secret() -> String {
    random_hex::<SECRET_BYTES>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_and_alphabet() {
        let id = client_id();
        assert_eq!(id.len(), 32);
        let token = secret();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_values_are_unique() {
        assert_ne!(secret(), secret());
        assert_ne!(client_id(), client_id());
    }
}
