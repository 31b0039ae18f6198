//! # litesend-keys
//! Litecoin key handling, legacy address encoding, and transaction signing.
//!
//! - [`address`]: base58check P2PKH/P2SH addresses
//! - [`keys`]: signing keys from extended private keys
//! - [`signer`]: [`LitecoinSigner`], the `TransactionSigner` implementation

pub mod address;
pub mod keys;
pub mod signer;

pub use address::{AddressKind, LitecoinAddress};
pub use keys::SigningKey;
pub use signer::LitecoinSigner;
