use base64::URL_SAFE_NO_PAD;
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng};

// TODO: link to rfc wrt suggested bit size of salt
const DEFAULT_SALT_SIZE: usize = 128 / 8;

/// Source of per-node salts for the issuer walk.
///
/// Every visited node draws one fresh salt. The default provider reads a
/// cryptographic RNG; a deterministic provider can be injected for
/// reproducible issuance in tests.
pub trait SaltProvider {
    /// Returns the salt for the next visited node.
    fn next_salt(&mut self) -> String;
}

/// Salts drawn from a cryptographic RNG, base64url encoded without padding.
#[derive(Debug, Clone)]
pub struct RngSalt<R = OsRng> {
    rng: R,
}

impl RngSalt<OsRng> {
    pub fn new() -> Self {
        Self::with_rng(OsRng)
    }
}

impl<R: Rng + CryptoRng> RngSalt<R> {
    pub fn with_rng(rng: R) -> Self {
        RngSalt { rng }
    }
}

impl Default for RngSalt<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng + CryptoRng> SaltProvider for RngSalt<R> {
    fn next_salt(&mut self) -> String {
        let mut salt_bytes = [0u8; DEFAULT_SALT_SIZE];
        self.rng.fill_bytes(&mut salt_bytes);
        base64::encode_config(salt_bytes, URL_SAFE_NO_PAD)
    }
}

/// Returns the same salt for every node. Defeats the hiding property of the
/// emitted digests, so only suitable for tests and reproducible vectors.
#[derive(Debug, Clone)]
pub struct FixedSalt(String);

impl FixedSalt {
    pub fn new<S: Into<String>>(salt: S) -> Self {
        FixedSalt(salt.into())
    }
}

impl SaltProvider for FixedSalt {
    fn next_salt(&mut self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_salt_length_and_alphabet() {
        let mut salts = RngSalt::new();
        let salt = salts.next_salt();
        // 16 bytes come out as 22 unpadded base64url characters
        assert_eq!(salt.len(), 22);
        assert!(salt
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    }

    #[test]
    fn test_rng_salts_are_distinct() {
        let mut salts = RngSalt::new();
        let a = salts.next_salt();
        let b = salts.next_salt();
        assert_ne!(a, b);
    }

    #[test]
    fn test_fixed_salt_repeats() {
        let mut salts = FixedSalt::new("salt_zyx");
        assert_eq!(salts.next_salt(), "salt_zyx");
        assert_eq!(salts.next_salt(), "salt_zyx");
    }
}
