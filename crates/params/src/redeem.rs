//! Parameters for authorizing stake redemptions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::default::REDEEM_FRESHNESS_WINDOW;

/// Parameters for the signed redeem message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedeemParams {
    /// Maximum age of the timestamp embedded in a redeem message.
    pub freshness_window: Duration,
}

impl Default for RedeemParams {
    fn default() -> Self {
        Self {
            freshness_window: REDEEM_FRESHNESS_WINDOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redeem_params_serde() {
        let params_toml = r#"
            freshness_window = { secs = 120, nanos = 0 }
        "#;
        let params = toml::from_str::<RedeemParams>(params_toml).unwrap();
        assert_eq!(params.freshness_window, Duration::from_secs(120));

        let params = toml::from_str::<RedeemParams>("").unwrap();
        assert_eq!(params, RedeemParams::default());
    }
}
