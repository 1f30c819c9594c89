//! Default values for the lock transaction and the redeem flow.

use std::time::Duration;

use bitcoin::Amount;

use crate::types::AddressKind;

/// Amount added on top of the deposit value when paying into the final-lock output.
///
/// This is paid for by the coordinator's fee inputs.
pub(crate) const LOCK_FEE_SURCHARGE: Amount = Amount::from_sat(1_500);

/// Extra amount the coordinator's fee inputs must cover beyond [`LOCK_FEE_SURCHARGE`].
///
/// Whatever is left of it after the change output is the miner fee.
pub(crate) const LOCK_FEE_BUFFER: Amount = Amount::from_sat(300);

/// Change below this amount is left to the miners instead of creating an output.
pub(crate) const DUST_LIMIT: Amount = Amount::from_sat(546);

/// Relative timelock (in blocks) on the user-only branch of the deposit script.
pub(crate) const DEPOSIT_TIMEOUT_BLOCKS: u16 = 1;

/// Output type used for new deposit addresses.
pub(crate) const DEPOSIT_ADDRESS_KIND: AddressKind = AddressKind::Taproot;

/// Output type used for the final-lock address.
pub(crate) const LOCK_ADDRESS_KIND: AddressKind = AddressKind::SegwitV0;

/// How old a signed redeem message may be before it is rejected.
pub(crate) const REDEEM_FRESHNESS_WINDOW: Duration = Duration::from_secs(5 * 60);
