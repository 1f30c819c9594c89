//! The bitcoin networks the coordinator can operate on.

use std::{fmt, str::FromStr};

use bitcoin::Network;
use serde::{Deserialize, Serialize};

use crate::errors::ParamsError;

/// Network selector as accepted from configuration and from clients.
///
/// All test networks share the testnet address encoding, but each has its own explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BtcNetwork {
    /// Bitcoin mainnet.
    #[serde(alias = "bitcoin")]
    Mainnet,

    /// Testnet3.
    Testnet,

    /// Testnet4.
    Testnet4,

    /// The default signet.
    Signet,

    /// A local regtest chain.
    Regtest,
}

impl BtcNetwork {
    /// The [`Network`] used to encode addresses for this network.
    pub const fn address_network(&self) -> Network {
        match self {
            BtcNetwork::Mainnet => Network::Bitcoin,
            BtcNetwork::Testnet | BtcNetwork::Testnet4 | BtcNetwork::Signet => Network::Testnet,
            BtcNetwork::Regtest => Network::Regtest,
        }
    }

    /// Base URL of the public block explorer API for this network.
    ///
    /// Regtest has no public explorer so this points at a locally running esplora instance.
    pub const fn default_explorer_url(&self) -> &'static str {
        match self {
            BtcNetwork::Mainnet => "https://mempool.space",
            BtcNetwork::Testnet => "https://mempool.space/testnet",
            BtcNetwork::Testnet4 => "https://mempool.space/testnet4",
            BtcNetwork::Signet => "https://mempool.space/signet",
            BtcNetwork::Regtest => "http://127.0.0.1:3002",
        }
    }
}

impl fmt::Display for BtcNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BtcNetwork::Mainnet => "mainnet",
            BtcNetwork::Testnet => "testnet",
            BtcNetwork::Testnet4 => "testnet4",
            BtcNetwork::Signet => "signet",
            BtcNetwork::Regtest => "regtest",
        };

        f.write_str(name)
    }
}

impl FromStr for BtcNetwork {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "testnet4" => Ok(Self::Testnet4),
            "signet" => Ok(Self::Signet),
            "regtest" => Ok(Self::Regtest),
            _ => Err(ParamsError::UnknownNetwork(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parse() {
        assert_eq!("bitcoin".parse::<BtcNetwork>(), Ok(BtcNetwork::Mainnet));
        assert_eq!("Testnet4".parse::<BtcNetwork>(), Ok(BtcNetwork::Testnet4));
        assert_eq!(
            "liquid".parse::<BtcNetwork>(),
            Err(ParamsError::UnknownNetwork("liquid".to_string()))
        );
    }

    #[test]
    fn test_test_networks_share_address_encoding() {
        for network in [BtcNetwork::Testnet, BtcNetwork::Testnet4, BtcNetwork::Signet] {
            assert_eq!(network.address_network(), Network::Testnet);
        }

        assert_eq!(BtcNetwork::Mainnet.address_network(), Network::Bitcoin);
    }

    #[test]
    fn test_explorer_urls_are_distinct() {
        assert_eq!(
            BtcNetwork::Testnet4.default_explorer_url(),
            "https://mempool.space/testnet4"
        );
        assert_ne!(
            BtcNetwork::Testnet.default_explorer_url(),
            BtcNetwork::Signet.default_explorer_url()
        );
    }
}
