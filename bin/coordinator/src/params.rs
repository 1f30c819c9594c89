use gbpl_custody_params::prelude::{LockParams, RedeemParams};
use serde::{Deserialize, Serialize};

/// The protocol parameters of the coordinator.
///
/// Changing the lock parameters changes the deposit addresses handed out to users, so they must
/// stay fixed for as long as deposits made under them are outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Params {
    /// How deposit scripts and lock transactions are built.
    pub lock: LockParams,

    /// How redeem requests are authorized.
    pub redeem: RedeemParams,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_params_serde_toml() {
        let params = r#"
            [lock]
            fee_surcharge = 2000
            deposit_timeout = 6
            deposit_address_kind = "segwitV0"

            [redeem]
            freshness_window = { secs = 120, nanos = 0 }
        "#;

        let deserialized = toml::from_str::<Params>(params);

        assert!(
            deserialized.is_ok(),
            "must be able to deserialize params from toml but got: {}",
            deserialized.unwrap_err()
        );

        let deserialized = deserialized.unwrap();
        assert_eq!(deserialized.lock.deposit_timeout, 6);
        assert_eq!(deserialized.redeem.freshness_window, Duration::from_secs(120));

        let serialized = toml::to_string(&deserialized).unwrap();
        let params = toml::from_str::<Params>(&serialized).unwrap();

        assert_eq!(
            deserialized, params,
            "must be able to serialize and deserialize params to toml"
        );
    }

    #[test]
    fn test_empty_params_use_defaults() {
        let params = toml::from_str::<Params>("").unwrap();

        assert_eq!(params, Params::default());
        assert_eq!(params.lock.fee_target().to_sat(), 1_800);
    }
}
