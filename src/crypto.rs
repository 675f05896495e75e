//! secp256k1 scalar -> point, Keccak-256, hex encoding.
//!
//! `derive_address` is the only entry point callers need. Everything
//! else in this module exists to keep the hot loop allocation-free:
//! workers pool their scratch buffers and reuse a `Keccak256` hasher
//! across attempts instead of constructing a fresh one every time.

use crate::error::{Result, VanityError};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::TryRngCore;
use sha3::{Digest, Keccak256};
use zeroize::Zeroize;

/// A 32-byte secret scalar. Zeroized on drop so a miss never leaves key
/// material sitting in freed memory.
pub struct SecretBuf(pub [u8; 32]);

impl Drop for SecretBuf {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Per-worker scratch state reused across attempts: one hasher, one
/// secret buffer, one public-key buffer. Hasher is reset before each
/// reuse across attempts without reallocating.
pub struct CryptoScratch {
    hasher: Keccak256,
}

impl CryptoScratch {
    pub fn new() -> Self {
        Self {
            hasher: Keccak256::new(),
        }
    }

    /// Sample a fresh secret key into a pooled buffer using the OS CSPRNG.
    pub fn sample_secret(&mut self) -> Result<SecretBuf> {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| VanityError::Crypto(format!("CSPRNG failure: {e}")))?;
        Ok(SecretBuf(bytes))
    }

    /// Derive `(address, uncompressed_public_key)` from a 32-byte secret.
    ///
    /// `SigningKey::from_bytes` rejects zero and out-of-range scalars;
    /// such a sample has probability on the order of 2^-128 so a single
    /// rejection surfaces as a crypto error rather than a silent retry
    /// loop — the worker's batch loop samples a fresh scalar on its next
    /// iteration regardless.
    pub fn derive_address(&mut self, secret: &SecretBuf) -> Result<([u8; 20], [u8; 64])> {
        let signing_key = SigningKey::from_bytes((&secret.0).into())
            .map_err(|e| VanityError::Crypto(format!("invalid scalar: {e}")))?;

        let verifying_key = signing_key.verifying_key();
        let encoded = verifying_key.to_encoded_point(false);
        let uncompressed = encoded.as_bytes(); // 0x04 || X(32) || Y(32)
        debug_assert_eq!(uncompressed.len(), 65);
        debug_assert_eq!(uncompressed[0], 0x04);

        let mut pub_key = [0u8; 64];
        pub_key.copy_from_slice(&uncompressed[1..]);

        self.hasher.reset();
        self.hasher.update(&pub_key);
        let digest = self.hasher.finalize_reset();

        let mut address = [0u8; 20];
        address.copy_from_slice(&digest[12..]);

        Ok((address, pub_key))
    }
}

impl Default for CryptoScratch {
    fn default() -> Self {
        Self::new()
    }
}

/// Stateless convenience wrapper around [`CryptoScratch`] for callers
/// (tests, benchmarks) that don't need the pooled hot path.
pub fn derive_address(secret: &[u8; 32]) -> Result<([u8; 20], [u8; 64])> {
    let mut scratch = CryptoScratch::new();
    let buf = SecretBuf(*secret);
    scratch.derive_address(&buf)
}

/// Lowercase, no-`0x` hex rendering of a 20-byte address.
pub fn hex_encode_address(address: &[u8; 20]) -> String {
    hex::encode(address)
}

/// Lowercase, no-`0x` hex rendering of a 32-byte secret key.
pub fn hex_encode_secret(secret: &[u8; 32]) -> String {
    hex::encode(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_address_is_deterministic() {
        let secret = [0x42u8; 32];
        let (a1, p1) = derive_address(&secret).unwrap();
        let (a2, p2) = derive_address(&secret).unwrap();
        assert_eq!(a1, a2);
        assert_eq!(p1, p2);
    }

    #[test]
    fn different_secrets_yield_different_addresses() {
        let (a1, _) = derive_address(&[0x01u8; 32]).unwrap();
        let (a2, _) = derive_address(&[0x02u8; 32]).unwrap();
        assert_ne!(a1, a2);
    }

    #[test]
    fn hex_encoding_has_no_0x_prefix_and_is_lowercase() {
        let address = [0xABu8; 20];
        let encoded = hex_encode_address(&address);
        assert_eq!(encoded.len(), 40);
        assert!(!encoded.starts_with("0x"));
        assert_eq!(encoded, encoded.to_lowercase());
    }

    #[test]
    fn scratch_reuse_matches_stateless_helper() {
        let mut scratch = CryptoScratch::new();
        let secret = SecretBuf([0x11u8; 32]);
        let (addr_a, pk_a) = scratch.derive_address(&secret).unwrap();
        let (addr_b, pk_b) = scratch.derive_address(&secret).unwrap();
        assert_eq!(addr_a, addr_b);
        assert_eq!(pk_a, pk_b);
    }
}
