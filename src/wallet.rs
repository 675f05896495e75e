//! The data model's `Wallet`: an immutable `(private_key, address,
//! public_key)` triple, created only on a successful pattern match.

use zeroize::Zeroize;

/// A found vanity wallet. The private key is zeroized on drop; there is
/// no path that lets it escape this struct except by copying the hex
/// rendering out through [`Wallet::private_key_hex`].
pub struct Wallet {
    private_key: [u8; 32],
    pub address: [u8; 20],
    pub public_key: [u8; 64],
}

impl Wallet {
    pub fn new(private_key: [u8; 32], address: [u8; 20], public_key: [u8; 64]) -> Self {
        Self {
            private_key,
            address,
            public_key,
        }
    }

    /// 64-char lowercase hex private key, for the KeyStore collaborator
    /// The only sanctioned way to read the secret out.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.private_key)
    }

    /// 40-char lowercase hex address, no `0x` prefix.
    pub fn address_hex(&self) -> String {
        hex::encode(self.address)
    }
}

impl Drop for Wallet {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address_hex())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_renderings_have_expected_length_and_case() {
        let w = Wallet::new([0xAB; 32], [0xCD; 20], [0x01; 64]);
        assert_eq!(w.private_key_hex().len(), 64);
        assert_eq!(w.address_hex().len(), 40);
        assert_eq!(w.address_hex(), w.address_hex().to_lowercase());
    }

    #[test]
    fn debug_never_prints_the_private_key() {
        let w = Wallet::new([0xAB; 32], [0xCD; 20], [0x01; 64]);
        let debug = format!("{:?}", w);
        assert!(!debug.contains(&w.private_key_hex()));
    }
}
