//! Standalone helpers to create transaction skeletons.

use bitcoin::{
    absolute::LockTime, transaction::Version, Amount, OutPoint, ScriptBuf, Sequence, Transaction,
    TxIn, TxOut, Witness,
};

/// Creates a version 2 transaction with no absolute locktime, which is required for relative
/// timelocks to be enforced on its inputs.
pub fn create_tx(tx_ins: Vec<TxIn>, tx_outs: Vec<TxOut>) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: tx_ins,
        output: tx_outs,
    }
}

/// Creates unsigned inputs that signal replaceability without a relative timelock.
pub fn create_tx_ins(utxos: impl IntoIterator<Item = OutPoint>) -> Vec<TxIn> {
    utxos
        .into_iter()
        .map(|utxo| create_tx_in(utxo, Sequence::ENABLE_RBF_NO_LOCKTIME))
        .collect()
}

/// Creates a single unsigned input with the given `sequence`.
pub fn create_tx_in(previous_output: OutPoint, sequence: Sequence) -> TxIn {
    TxIn {
        previous_output,
        sequence,
        script_sig: ScriptBuf::new(),
        witness: Witness::new(),
    }
}

/// Creates outputs paying the given amounts to the given scripts, in order.
pub fn create_tx_outs(
    scripts_and_amounts: impl IntoIterator<Item = (ScriptBuf, Amount)>,
) -> Vec<TxOut> {
    scripts_and_amounts
        .into_iter()
        .map(|(script_pubkey, value)| TxOut {
            script_pubkey,
            value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use bitcoin::{hashes::Hash, Txid};

    use super::*;

    #[test]
    fn test_create_tx_preserves_order() {
        let outpoints = [0u8, 1, 2].map(|b| OutPoint {
            txid: Txid::from_byte_array([b; 32]),
            vout: u32::from(b),
        });

        let mut ins = create_tx_ins(outpoints);
        ins.insert(0, create_tx_in(outpoints[2], Sequence::from_height(1)));

        let outs = create_tx_outs([
            (ScriptBuf::new(), Amount::from_sat(1_000)),
            (ScriptBuf::new(), Amount::from_sat(2_000)),
        ]);

        let tx = create_tx(ins, outs);

        assert_eq!(tx.version, Version::TWO);
        assert_eq!(tx.input.len(), 4);
        assert_eq!(tx.input[0].sequence, Sequence::from_height(1));
        assert_eq!(tx.input[1].previous_output, outpoints[0]);
        assert_eq!(tx.input[3].sequence, Sequence::ENABLE_RBF_NO_LOCKTIME);
        assert_eq!(tx.output[1].value, Amount::from_sat(2_000));
    }
}
