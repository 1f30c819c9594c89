//! Signs the coordinator's inputs of a lock transaction.

use bitcoin::{
    ecdsa,
    hashes::Hash,
    sighash::{EcdsaSighashType, SighashCache},
    Psbt,
};
use secp256k1::{Message, SECP256K1};
use tracing::{debug, warn};

use crate::{errors::SignerError, keys::CoordinatorKeys};

/// Index of the user's deposit input, which the coordinator never signs.
pub const DEPOSIT_INPUT_INDEX: usize = 0;

/// Signs lock transaction inputs with the coordinator key.
#[derive(Debug)]
pub struct CoordinatorSigner {
    keys: CoordinatorKeys,
}

impl CoordinatorSigner {
    /// Creates a new [`CoordinatorSigner`].
    pub const fn new(keys: CoordinatorKeys) -> Self {
        Self { keys }
    }

    /// The keys this signer signs with.
    pub const fn keys(&self) -> &CoordinatorKeys {
        &self.keys
    }

    /// Signs every input of `psbt` except the deposit input.
    ///
    /// Each signature is an ECDSA `SIGHASH_ALL` signature over the P2WPKH sighash of the input and
    /// is stored as a partial signature. Inputs that do not spend from the coordinator's funding
    /// address are left alone, which makes the call fail.
    ///
    /// # Errors
    ///
    /// [`SignerError::PartialSignFailure`] unless exactly `inputs - 1` signatures were produced.
    pub fn sign_fee_inputs(&self, psbt: &mut Psbt) -> Result<usize, SignerError> {
        let funding_script = self.keys.funding_script();
        let psbt_key = self.keys.psbt_key();
        let expected = psbt.inputs.len().saturating_sub(1);

        let tx = psbt.unsigned_tx.clone();
        let mut sighash_cache = SighashCache::new(&tx);
        let mut signed = 0;

        for (index, input) in psbt.inputs.iter_mut().enumerate() {
            if index == DEPOSIT_INPUT_INDEX {
                continue;
            }

            let Some(prevout) = input.witness_utxo.as_ref() else {
                warn!(%index, "fee input has no witness utxo, not signing");
                continue;
            };

            if prevout.script_pubkey != funding_script {
                warn!(%index, "input does not spend from the funding address, not signing");
                continue;
            }

            let sighash = sighash_cache.p2wpkh_signature_hash(
                index,
                &prevout.script_pubkey,
                prevout.value,
                EcdsaSighashType::All,
            )?;
            let message = Message::from_digest(sighash.to_byte_array());

            let signature = ecdsa::Signature {
                signature: SECP256K1.sign_ecdsa(&message, self.keys.secret_key()),
                sighash_type: EcdsaSighashType::All,
            };

            input.partial_sigs.insert(psbt_key, signature);
            signed += 1;
        }

        if signed != expected {
            return Err(SignerError::PartialSignFailure { signed, expected });
        }

        debug!(txid = %tx.compute_txid(), %signed, "signed fee inputs");

        Ok(signed)
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::{
        absolute::LockTime, transaction::Version, Amount, OutPoint, ScriptBuf, Sequence,
        Transaction, TxIn, TxOut, Txid, Witness,
    };

    use super::*;

    fn signer() -> CoordinatorSigner {
        CoordinatorSigner::new(CoordinatorKeys::from_seed(&[7u8; 32]).unwrap())
    }

    fn psbt(prevout_scripts: &[ScriptBuf]) -> Psbt {
        let input = prevout_scripts
            .iter()
            .enumerate()
            .map(|(i, _)| TxIn {
                previous_output: OutPoint {
                    txid: Txid::from_byte_array([i as u8; 32]),
                    vout: 0,
                },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
                witness: Witness::new(),
            })
            .collect();
        let tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input,
            output: vec![TxOut {
                value: Amount::from_sat(10_000),
                script_pubkey: ScriptBuf::new(),
            }],
        };

        let mut psbt = Psbt::from_unsigned_tx(tx).unwrap();
        for (input, script) in psbt.inputs.iter_mut().zip(prevout_scripts) {
            input.witness_utxo = Some(TxOut {
                value: Amount::from_sat(5_000),
                script_pubkey: script.clone(),
            });
        }

        psbt
    }

    #[test]
    fn test_signs_all_but_deposit_input() {
        let signer = signer();
        let funding = signer.keys().funding_script();
        let deposit = ScriptBuf::new();
        let mut psbt = psbt(&[deposit, funding.clone(), funding]);

        let signed = signer.sign_fee_inputs(&mut psbt).unwrap();

        assert_eq!(signed, 2);
        assert!(psbt.inputs[0].partial_sigs.is_empty());

        let tx = psbt.unsigned_tx.clone();
        let mut cache = SighashCache::new(&tx);
        for index in 1..3 {
            let (pubkey, signature) = psbt.inputs[index].partial_sigs.iter().next().unwrap();
            let prevout = psbt.inputs[index].witness_utxo.as_ref().unwrap();
            let sighash = cache
                .p2wpkh_signature_hash(
                    index,
                    &prevout.script_pubkey,
                    prevout.value,
                    EcdsaSighashType::All,
                )
                .unwrap();

            SECP256K1
                .verify_ecdsa(
                    &Message::from_digest(sighash.to_byte_array()),
                    &signature.signature,
                    &pubkey.inner,
                )
                .expect("signature must verify");
        }
    }

    #[test]
    fn test_foreign_input_fails() {
        let signer = signer();
        let funding = signer.keys().funding_script();
        let foreign = ScriptBuf::new_p2wpkh(
            &CoordinatorKeys::from_seed(&[8u8; 32])
                .unwrap()
                .funding_pubkey()
                .wpubkey_hash(),
        );
        let mut psbt = psbt(&[funding.clone(), funding, foreign]);

        assert!(matches!(
            signer.sign_fee_inputs(&mut psbt),
            Err(SignerError::PartialSignFailure {
                signed: 1,
                expected: 2
            })
        ));
    }
}
