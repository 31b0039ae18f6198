//! Protocol constants. All monetary values in litoshis (1 LTC = 10^8 litoshis).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of litoshis in one LTC.
pub const COIN: u64 = 100_000_000;

/// Fractional digits of the major unit (`COIN = 10^DECIMALS`).
pub const DECIMALS: u32 = 8;

/// Maximum money supply in litoshis. Amounts above this are never valid.
pub const MAX_MONEY: u64 = 84_000_000 * COIN;

/// Smallest output value relays accept for a P2PKH output. Non-zero outputs
/// below it are dust.
pub const DUST_LIMIT: u64 = 546;

/// Confirmation target, in blocks, used when asking the ledger for a fee rate.
pub const DEFAULT_FEE_TARGET_BLOCKS: u32 = 3;

/// Fractional digits kept when a decimal division does not terminate.
pub const DIVISION_SCALE: u32 = 20;

/// Largest exponent accepted by the `^` operator and by scientific notation.
///
/// Bounds the size of intermediate big integers.
pub const MAX_EXPONENT: u32 = 1_000;

/// Which ledger family a payment targets.
///
/// # Examples
///
/// ```
/// use litesend_core::constants::Network;
/// let net: Network = "testnet".parse().unwrap();
/// assert_eq!(net, Network::Testnet);
/// assert_eq!(Network::default(), Network::Mainnet);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network ("livenet").
    #[default]
    Mainnet,
    /// Public test network.
    Testnet,
}

impl Network {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "livenet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            other => Err(format!("unknown network: {other}")),
        }
    }
}
