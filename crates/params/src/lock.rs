//! Parameters for the transaction that moves a deposit into its final-lock output.

use bitcoin::Amount;
use serde::{Deserialize, Serialize};

use crate::{
    default::{
        DEPOSIT_ADDRESS_KIND, DEPOSIT_TIMEOUT_BLOCKS, DUST_LIMIT, LOCK_ADDRESS_KIND,
        LOCK_FEE_BUFFER, LOCK_FEE_SURCHARGE,
    },
    types::AddressKind,
};

/// Parameters used when assembling the lock transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockParams {
    /// Added to the deposit value to get the final-lock output value.
    pub fee_surcharge: Amount,

    /// Covered by the coordinator's fee inputs on top of [`Self::fee_surcharge`].
    pub fee_buffer: Amount,

    /// Change at or below this amount is not paid out.
    pub dust_limit: Amount,

    /// Relative timelock in blocks on the user-only branch of the deposit script.
    pub deposit_timeout: u16,

    /// Output type for newly created deposit addresses.
    pub deposit_address_kind: AddressKind,

    /// Output type for the final-lock address.
    pub lock_address_kind: AddressKind,
}

impl LockParams {
    /// The amount the coordinator's fee inputs must cover.
    pub fn fee_target(&self) -> Amount {
        self.fee_surcharge + self.fee_buffer
    }
}

impl Default for LockParams {
    fn default() -> Self {
        Self {
            fee_surcharge: LOCK_FEE_SURCHARGE,
            fee_buffer: LOCK_FEE_BUFFER,
            dust_limit: DUST_LIMIT,
            deposit_timeout: DEPOSIT_TIMEOUT_BLOCKS,
            deposit_address_kind: DEPOSIT_ADDRESS_KIND,
            lock_address_kind: LOCK_ADDRESS_KIND,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_params_serde() {
        let params = LockParams::default();
        let serialized = toml::to_string(&params).unwrap();

        let deserialized: LockParams = toml::from_str(&serialized).unwrap();

        assert_eq!(params, deserialized);

        let params_toml = r#"
            fee_surcharge = 2000
            dust_limit = 330
            deposit_address_kind = "segwitV0"
        "#;
        let parsed = toml::from_str::<LockParams>(params_toml)
            .expect("must be able to deserialize partial LockParams from a toml");

        assert_eq!(parsed.fee_surcharge, Amount::from_sat(2_000));
        assert_eq!(parsed.fee_buffer, LOCK_FEE_BUFFER);
        assert_eq!(parsed.deposit_address_kind, AddressKind::SegwitV0);
    }

    #[test]
    fn test_fee_target() {
        assert_eq!(LockParams::default().fee_target(), Amount::from_sat(1_800));
    }
}
