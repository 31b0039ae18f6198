//! Signing keys from BIP-32 extended private keys.
//!
//! The payment key is the extended key's own private key (no child
//! derivation). Only the standard `xprv` (mainnet) and `tprv` (testnet)
//! serializations are accepted.

use std::fmt;
use std::str::FromStr;

use bitcoin::bip32::Xpriv;
use bitcoin::secp256k1::{ecdsa, Message, Secp256k1, SecretKey, Signing};
use bitcoin::NetworkKind;
use litesend_core::constants::Network;
use litesend_core::error::SignerError;
use litesend_core::types::KeyMaterial;

use crate::address::LitecoinAddress;

/// A secp256k1 private key bound to a network.
///
/// The secret is erased on drop and never printed.
pub struct SigningKey {
    secret: SecretKey,
    public_key: bitcoin::PublicKey,
    network: Network,
}

impl SigningKey {
    /// Parse an extended private key and check it matches `network`.
    pub fn from_key_material(key: &KeyMaterial, network: Network) -> Result<Self, SignerError> {
        let xpriv = Xpriv::from_str(key.expose_secret().trim())
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        if xpriv.network != network_kind(network) {
            return Err(SignerError::InvalidKey(format!(
                "extended key is not a {network} key"
            )));
        }
        Ok(Self::from_secret(xpriv.private_key, network))
    }

    pub fn from_secret(secret: SecretKey, network: Network) -> Self {
        let secp = Secp256k1::signing_only();
        let public_key = bitcoin::PublicKey::new(secret.public_key(&secp));
        Self {
            secret,
            public_key,
            network,
        }
    }

    /// Compressed public key.
    pub fn public_key(&self) -> &bitcoin::PublicKey {
        &self.public_key
    }

    /// P2PKH address of this key.
    pub fn address(&self) -> LitecoinAddress {
        LitecoinAddress::from_public_key(&self.public_key, self.network)
    }

    /// ECDSA signature (low-S, DER-serializable) over a 32-byte digest.
    pub fn sign_digest<C: Signing>(
        &self,
        secp: &Secp256k1<C>,
        digest: [u8; 32],
    ) -> ecdsa::Signature {
        secp.sign_ecdsa(&Message::from_digest(digest), &self.secret)
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("secret", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .field("network", &self.network)
            .finish()
    }
}

fn network_kind(network: Network) -> NetworkKind {
    match network {
        Network::Mainnet => NetworkKind::Main,
        Network::Testnet => NetworkKind::Test,
    }
}
