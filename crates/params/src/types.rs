//! Types shared by the parameters and the builders that consume them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ParamsError;

/// The output type a witness script is wrapped in.
///
/// A stake funds exactly one of these for its deposit and the choice is persisted alongside the
/// stake so that every later step rebuilds the same address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressKind {
    /// Segwit v0 pay-to-witness-script-hash.
    SegwitV0,

    /// Taproot with a single script leaf and an unspendable internal key.
    Taproot,
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressKind::SegwitV0 => write!(f, "segwitV0"),
            AddressKind::Taproot => write!(f, "taproot"),
        }
    }
}

impl FromStr for AddressKind {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "segwitv0" | "p2wsh" => Ok(Self::SegwitV0),
            "taproot" | "p2tr" => Ok(Self::Taproot),
            _ => Err(ParamsError::UnknownAddressKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_kind_parse() {
        assert_eq!("p2wsh".parse::<AddressKind>(), Ok(AddressKind::SegwitV0));
        assert_eq!("segwitV0".parse::<AddressKind>(), Ok(AddressKind::SegwitV0));
        assert_eq!("P2TR".parse::<AddressKind>(), Ok(AddressKind::Taproot));
        assert!("p2pkh".parse::<AddressKind>().is_err());

        for kind in [AddressKind::SegwitV0, AddressKind::Taproot] {
            assert_eq!(kind.to_string().parse::<AddressKind>(), Ok(kind));
        }
    }
}
