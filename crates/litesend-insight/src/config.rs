//! Insight endpoint configuration.
//!
//! Defaults point at the public litecore explorers and can be overridden
//! from the environment:
//!
//! | variable                     | default                            |
//! |------------------------------|------------------------------------|
//! | `LITESEND_MAINNET_API`       | `https://insight.litecore.io/api`  |
//! | `LITESEND_TESTNET_API`       | `https://testnet.litecore.io/api`  |
//! | `LITESEND_HTTP_TIMEOUT_SECS` | `30`                               |

use std::time::Duration;

use litesend_core::constants::Network;
use thiserror::Error;

pub const DEFAULT_MAINNET_API: &str = "https://insight.litecore.io/api";
pub const DEFAULT_TESTNET_API: &str = "https://testnet.litecore.io/api";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Per-network API base URLs and the HTTP request timeout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub mainnet: String,
    pub testnet: String,
    pub timeout: Duration,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            mainnet: DEFAULT_MAINNET_API.to_string(),
            testnet: DEFAULT_TESTNET_API.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl Endpoints {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` to resolve variables; unset or empty variables
    /// keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let mainnet = get("LITESEND_MAINNET_API").unwrap_or(defaults.mainnet);
        let testnet = get("LITESEND_TESTNET_API").unwrap_or(defaults.testnet);
        let timeout = match get("LITESEND_HTTP_TIMEOUT_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "LITESEND_HTTP_TIMEOUT_SECS",
                        expected: "a positive number of seconds",
                        value,
                    });
                }
            },
            None => defaults.timeout,
        };

        Ok(Self {
            mainnet,
            testnet,
            timeout,
        })
    }

    /// API base for `network`, without a trailing slash.
    pub fn base_url(&self, network: Network) -> &str {
        let url = match network {
            Network::Mainnet => &self.mainnet,
            Network::Testnet => &self.testnet,
        };
        url.trim_end_matches('/')
    }
}
