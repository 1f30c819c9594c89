//! Greedy selection of the coordinator UTXOs that fund the lock transaction.

use bitcoin::Amount;
use gbpl_custody_primitives::types::FeeUtxo;

use crate::errors::AssembleError;

/// The fee inputs chosen for a lock transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSelection {
    /// Selected UTXOs, in the order they were offered.
    pub inputs: Vec<FeeUtxo>,

    /// Sum of the selected UTXOs.
    pub total: Amount,

    /// Change paid back to the coordinator, if the excess is above the dust limit.
    pub change: Option<Amount>,
}

impl FeeSelection {
    /// The part of [`Self::total`] that is neither change nor part of `target`.
    ///
    /// This is an implicit miner fee on top of the target.
    pub fn leftover(&self, target: Amount) -> Amount {
        self.total
            .checked_sub(target)
            .and_then(|excess| excess.checked_sub(self.change.unwrap_or(Amount::ZERO)))
            .unwrap_or(Amount::ZERO)
    }
}

/// Takes UTXOs in order until they add up to `target`.
///
/// Selection stops at the first UTXO that makes the running total reach `target`. The excess
/// becomes a change output only when it is strictly greater than `dust_limit`; otherwise it is
/// left to the miners.
///
/// # Errors
///
/// [`AssembleError::InsufficientFunds`] if all UTXOs together fall short. Nothing is partially
/// selected in that case. [`AssembleError::AmountOverflow`] if the UTXO amounts cannot be summed.
pub fn select_fee_utxos(
    utxos: impl IntoIterator<Item = FeeUtxo>,
    target: Amount,
    dust_limit: Amount,
) -> Result<FeeSelection, AssembleError> {
    let mut inputs = Vec::new();
    let mut total = Amount::ZERO;

    for utxo in utxos {
        if total >= target {
            break;
        }

        total = total
            .checked_add(utxo.amount)
            .ok_or(AssembleError::AmountOverflow("summing fee utxos"))?;
        inputs.push(utxo);
    }

    if total < target {
        return Err(AssembleError::InsufficientFunds {
            required: target,
            available: total,
        });
    }

    let excess = total - target;
    let change = (excess > dust_limit).then_some(excess);

    Ok(FeeSelection {
        inputs,
        total,
        change,
    })
}
