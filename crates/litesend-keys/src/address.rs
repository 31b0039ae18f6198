//! Litecoin base58check addresses.
//!
//! Legacy pay-to-pubkey-hash and pay-to-script-hash addresses only: a
//! version byte, a 20-byte hash, and a 4-byte double-SHA256 checksum.
//!
//! | network | P2PKH         | P2SH                           |
//! |---------|---------------|--------------------------------|
//! | mainnet | `0x30` (`L…`) | `0x32` (`M…`), legacy `0x05` (`3…`) |
//! | testnet | `0x6f` (`m…`/`n…`) | `0x3a` (`Q…`), legacy `0xc4` (`2…`) |
//!
//! Bech32 (`ltc1…`/`tltc1…`) addresses are rejected.

use std::fmt;

use bitcoin::hashes::Hash;
use bitcoin::{PubkeyHash, ScriptBuf, ScriptHash};
use litesend_core::constants::Network;
use litesend_core::error::SignerError;

const MAINNET_P2PKH: u8 = 0x30;
const MAINNET_P2SH: u8 = 0x32;
const MAINNET_P2SH_LEGACY: u8 = 0x05;
const TESTNET_P2PKH: u8 = 0x6f;
const TESTNET_P2SH: u8 = 0x3a;
const TESTNET_P2SH_LEGACY: u8 = 0xc4;

/// Payload length: version byte + hash160.
const PAYLOAD_LEN: usize = 21;

/// What an address's hash commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressKind {
    P2pkh,
    P2sh,
}

/// A decoded legacy Litecoin address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LitecoinAddress {
    network: Network,
    kind: AddressKind,
    hash: [u8; 20],
}

impl LitecoinAddress {
    /// P2PKH address for a 20-byte public key hash.
    pub fn from_pubkey_hash(hash: PubkeyHash, network: Network) -> Self {
        Self {
            network,
            kind: AddressKind::P2pkh,
            hash: hash.to_byte_array(),
        }
    }

    /// P2PKH address of a (compressed) public key.
    pub fn from_public_key(public_key: &bitcoin::PublicKey, network: Network) -> Self {
        Self::from_pubkey_hash(public_key.pubkey_hash(), network)
    }

    /// Decode and check that the address belongs to `expected`.
    pub fn parse(s: &str, expected: Network) -> Result<Self, SignerError> {
        let address = Self::decode(s)?;
        if address.network != expected {
            return Err(SignerError::WrongNetwork {
                address: s.to_string(),
                expected: expected.to_string(),
                found: address.network.to_string(),
            });
        }
        Ok(address)
    }

    /// Decode without a network expectation.
    pub fn decode(s: &str) -> Result<Self, SignerError> {
        let invalid = |reason: String| SignerError::InvalidAddress {
            address: s.to_string(),
            reason,
        };

        let lower = s.to_ascii_lowercase();
        if lower.starts_with("ltc1") || lower.starts_with("tltc1") {
            return Err(invalid("segwit addresses are not supported".into()));
        }

        let payload = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|e| invalid(e.to_string()))?;
        if payload.len() != PAYLOAD_LEN {
            return Err(invalid(format!(
                "payload is {} bytes, expected {PAYLOAD_LEN}",
                payload.len()
            )));
        }

        let (network, kind) = classify(payload[0])
            .ok_or_else(|| invalid(format!("unknown version byte 0x{:02x}", payload[0])))?;
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[1..]);
        Ok(Self {
            network,
            kind,
            hash,
        })
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    /// The locking script paying to this address.
    pub fn script_pubkey(&self) -> ScriptBuf {
        match self.kind {
            AddressKind::P2pkh => ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(self.hash)),
            AddressKind::P2sh => ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(self.hash)),
        }
    }

    /// Base58check string form.
    pub fn encode(&self) -> String {
        let mut payload = Vec::with_capacity(PAYLOAD_LEN);
        payload.push(version_byte(self.network, self.kind));
        payload.extend_from_slice(&self.hash);
        bs58::encode(payload).with_check().into_string()
    }
}

impl fmt::Display for LitecoinAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn version_byte(network: Network, kind: AddressKind) -> u8 {
    match (network, kind) {
        (Network::Mainnet, AddressKind::P2pkh) => MAINNET_P2PKH,
        (Network::Mainnet, AddressKind::P2sh) => MAINNET_P2SH,
        (Network::Testnet, AddressKind::P2pkh) => TESTNET_P2PKH,
        (Network::Testnet, AddressKind::P2sh) => TESTNET_P2SH,
    }
}

fn classify(version: u8) -> Option<(Network, AddressKind)> {
    match version {
        MAINNET_P2PKH => Some((Network::Mainnet, AddressKind::P2pkh)),
        MAINNET_P2SH | MAINNET_P2SH_LEGACY => Some((Network::Mainnet, AddressKind::P2sh)),
        TESTNET_P2PKH => Some((Network::Testnet, AddressKind::P2pkh)),
        TESTNET_P2SH | TESTNET_P2SH_LEGACY => Some((Network::Testnet, AddressKind::P2sh)),
        _ => None,
    }
}
