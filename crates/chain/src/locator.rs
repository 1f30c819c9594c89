//! Finds the output of a user's deposit transaction that pays to their deposit address.

use bitcoin::{Address, Txid};
use gbpl_custody_primitives::types::DepositRef;
use tracing::{debug, info};

use crate::{errors::LocateError, traits::ChainReader};

/// Locates the deposit output in `txid` that pays to `expected`.
///
/// Outputs are compared by their locking script, not by the address string the explorer reports,
/// so the result does not depend on how the explorer encodes addresses. When the transaction pays
/// to the address more than once, the first such output is returned.
pub async fn locate_deposit<R>(
    reader: &R,
    txid: &Txid,
    expected: &Address,
) -> Result<DepositRef, LocateError>
where
    R: ChainReader + ?Sized,
{
    debug!(%txid, %expected, "looking up deposit output");

    let tx = reader.get_transaction(txid).await?;
    let expected_script = expected.script_pubkey();

    let (vout, output) = tx
        .vout
        .iter()
        .enumerate()
        .find(|(_, output)| output.scriptpubkey == expected_script)
        .ok_or_else(|| LocateError::DepositNotFound {
            txid: *txid,
            address: expected.clone(),
        })?;

    let deposit = DepositRef {
        txid: *txid,
        vout: vout as u32,
        amount: output.value,
    };

    info!(%txid, %vout, amount = %deposit.amount, confirmed = %tx.status.confirmed, "located deposit output");

    Ok(deposit)
}
