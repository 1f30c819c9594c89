//! The lock transaction spends the user's deposit output together with coordinator fee inputs and
//! pays the deposit plus a fixed surcharge to the final-lock output.

use bitcoin::{
    psbt::Input,
    sighash::Prevouts,
    taproot::LeafVersion,
    Amount, Psbt, ScriptBuf, TapLeafHash, Transaction, TxOut, Txid,
};
use gbpl_custody_connectors::prelude::*;
use gbpl_custody_params::prelude::{AddressKind, LockParams};
use gbpl_custody_primitives::{
    keys::UserPubkey,
    scripts::prelude::*,
    types::DepositRef,
};
use tracing::{debug, trace};

use crate::{
    errors::{AssembleError, FinalizeError},
    fees::FeeSelection,
};

/// Data needed to construct a [`LockTx`].
#[derive(Debug, Clone)]
pub struct LockTxData {
    /// The user's deposit output, as located on chain.
    pub deposit: DepositRef,

    /// The coordinator UTXOs that fund the surcharge and the fee.
    pub fee_selection: FeeSelection,

    /// The locking script of the coordinator's funding address.
    ///
    /// Every fee input spends from it and the change goes back to it.
    pub funding_script: ScriptBuf,
}

/// The lock transaction.
///
/// Input 0 is always the deposit, the remaining inputs are fee inputs. Output 0 is always the
/// final-lock output, followed by at most one change output.
#[derive(Debug, Clone)]
pub struct LockTx {
    psbt: Psbt,

    prevouts: Vec<TxOut>,
}

impl LockTx {
    /// Constructs the lock transaction.
    ///
    /// Input 0 carries the deposit timeout as its sequence so that the user-only branch of the
    /// deposit script is valid as soon as the deposit is old enough.
    pub fn new(
        data: LockTxData,
        connector_deposit: &ConnectorDeposit,
        connector_lock: &ConnectorLock,
        params: &LockParams,
    ) -> Result<Self, AssembleError> {
        let LockTxData {
            deposit,
            fee_selection,
            funding_script,
        } = data;

        let mut tx_ins = vec![create_tx_in(
            deposit.outpoint(),
            connector_deposit.timeout_sequence(),
        )];
        tx_ins.extend(create_tx_ins(
            fee_selection.inputs.iter().map(|utxo| utxo.outpoint),
        ));

        let lock_amount = deposit
            .amount
            .checked_add(params.fee_surcharge)
            .ok_or(AssembleError::AmountOverflow("adding the fee surcharge"))?;
        let lock_script = connector_lock.generate_address()?.script_pubkey();

        let mut scripts_and_amounts = vec![(lock_script, lock_amount)];
        if let Some(change) = fee_selection.change {
            scripts_and_amounts.push((funding_script.clone(), change));
        }

        let tx = create_tx(tx_ins, create_tx_outs(scripts_and_amounts));
        let mut psbt = Psbt::from_unsigned_tx(tx)?;

        connector_deposit.populate_input(&mut psbt.inputs[0], deposit.amount)?;

        for (input, utxo) in psbt.inputs[1..].iter_mut().zip(&fee_selection.inputs) {
            input.witness_utxo = Some(TxOut {
                value: utxo.amount,
                script_pubkey: funding_script.clone(),
            });
        }

        let prevouts = psbt
            .inputs
            .iter()
            .filter_map(|input| input.witness_utxo.clone())
            .collect();

        debug!(
            deposit = %deposit.outpoint(),
            %lock_amount,
            fee_inputs = fee_selection.inputs.len(),
            change = ?fee_selection.change,
            "assembled lock transaction"
        );

        Ok(Self { psbt, prevouts })
    }

    /// Wraps a psbt received back from a signer.
    pub fn from_psbt(psbt: Psbt) -> Self {
        let prevouts = psbt
            .inputs
            .iter()
            .filter_map(|input| input.witness_utxo.clone())
            .collect();

        Self { psbt, prevouts }
    }

    /// The psbt of this transaction.
    pub const fn psbt(&self) -> &Psbt {
        &self.psbt
    }

    /// Mutable access to the psbt, for signers.
    pub fn psbt_mut(&mut self) -> &mut Psbt {
        &mut self.psbt
    }

    /// Consumes the transaction and returns its psbt.
    pub fn into_psbt(self) -> Psbt {
        self.psbt
    }

    /// The outputs spent by this transaction, in input order.
    pub fn prevouts(&self) -> Prevouts<'_, TxOut> {
        Prevouts::All(&self.prevouts)
    }

    /// Value of the final-lock output.
    pub fn lock_amount(&self) -> Amount {
        self.psbt
            .unsigned_tx
            .output
            .first()
            .map(|output| output.value)
            .unwrap_or(Amount::ZERO)
    }

    /// Sum of the values of all inputs, `None` if it does not fit an [`Amount`].
    pub fn input_amount(&self) -> Option<Amount> {
        self.prevouts
            .iter()
            .try_fold(Amount::ZERO, |total, prevout| total.checked_add(prevout.value))
    }

    /// Id of the transaction. Signatures do not change it.
    pub fn compute_txid(&self) -> Txid {
        self.psbt.unsigned_tx.compute_txid()
    }

    /// Completes the witness of every input and extracts the network transaction.
    ///
    /// The deposit branch is chosen from the signatures present on input 0: with both the
    /// coordinator's and the user's signature the cooperative branch is used, with only the user's
    /// the timeout branch is used. Fee inputs are finalized as P2WPKH spends with the partial
    /// signature of the key that owns them.
    pub fn finalize(
        mut self,
        connector_deposit: &ConnectorDeposit,
    ) -> Result<Transaction, FinalizeError> {
        let txid = self.compute_txid();
        let (deposit_input, fee_inputs) = self
            .psbt
            .inputs
            .split_first_mut()
            .ok_or(FinalizeError::NoInputs)?;

        let spend_path = deposit_spend_path(deposit_input, connector_deposit)?;
        trace!(%txid, ?spend_path, "finalizing deposit input");
        connector_deposit.finalize_input(deposit_input, spend_path)?;

        for (index, input) in fee_inputs.iter_mut().enumerate() {
            finalize_fee_input(input, index + 1)?;
        }

        if let Some(index) = self
            .psbt
            .inputs
            .iter()
            .position(|input| input.final_script_witness.is_none())
        {
            return Err(FinalizeError::NotFinalized(index));
        }

        Ok(self.psbt.extract_tx()?)
    }
}

/// Picks the deposit spend path from the signatures on `input`.
fn deposit_spend_path(
    input: &Input,
    connector_deposit: &ConnectorDeposit,
) -> Result<DepositSpendPath, FinalizeError> {
    let script = connector_deposit.generate_script();
    let kind = connector_deposit.kind();

    let user_signature = find_signature(input, kind, &script, &connector_deposit.user_pubkey())
        .ok_or(FinalizeError::MissingUserSignature)?;

    let coordinator_pubkey = UserPubkey::from(connector_deposit.coordinator_pubkey());
    let spend_path = match find_signature(input, kind, &script, &coordinator_pubkey) {
        Some(coordinator_signature) => DepositSpendPath::Coordinator {
            user_signature,
            coordinator_signature,
        },
        None => DepositSpendPath::Timeout { user_signature },
    };

    Ok(spend_path)
}

/// Looks up the signature of `pubkey` over `script` in the field of the psbt input that a signer
/// for `kind` fills.
fn find_signature(
    input: &Input,
    kind: AddressKind,
    script: &ScriptBuf,
    pubkey: &UserPubkey,
) -> Option<ConnectorSignature> {
    match kind {
        AddressKind::Taproot => {
            let leaf_hash = TapLeafHash::from_script(script, LeafVersion::TapScript);

            input
                .tap_script_sigs
                .get(&(pubkey.x_only(), leaf_hash))
                .copied()
                .map(ConnectorSignature::from)
        }
        AddressKind::SegwitV0 => input
            .partial_sigs
            .get(&bitcoin::PublicKey::new(pubkey.full()))
            .copied()
            .map(ConnectorSignature::from),
    }
}

fn finalize_fee_input(input: &mut Input, index: usize) -> Result<(), FinalizeError> {
    let script_pubkey = input
        .witness_utxo
        .as_ref()
        .map(|utxo| utxo.script_pubkey.clone())
        .ok_or(FinalizeError::MissingWitnessUtxo(index))?;

    let (pubkey, signature) = input
        .partial_sigs
        .iter()
        .find(|(pubkey, _)| {
            pubkey
                .wpubkey_hash()
                .is_ok_and(|hash| ScriptBuf::new_p2wpkh(&hash) == script_pubkey)
        })
        .map(|(pubkey, signature)| (*pubkey, *signature))
        .ok_or(FinalizeError::MissingFeeSignature(index))?;

    finalize_input(input, [signature.to_vec(), pubkey.to_bytes()]);

    Ok(())
}
