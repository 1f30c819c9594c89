//! This module contains the connector for the final-lock (HTLC) output.
use bitcoin::{
    hashes::{sha256, Hash},
    opcodes::all::{
        OP_1SUB, OP_CHECKSIG, OP_CSV, OP_DEPTH, OP_DROP, OP_ELSE, OP_ENDIF, OP_EQUALVERIFY, OP_IF,
        OP_SHA256,
    },
    psbt::Input,
    relative, Address, Amount, Network, ScriptBuf, Sequence,
};
use gbpl_custody_params::prelude::AddressKind;
use gbpl_custody_primitives::{
    errors::TxBuilderResult, keys::UserPubkey, scripts::prelude::finalize_input,
};

use crate::{
    address::{push_pubkey, DerivedAddress},
    spend_path::LockSpendPath,
};

/// The connector for the final-lock output that holds the collateral for the lifetime of the
/// stake.
///
/// The user can take the collateral back either by revealing the preimage of `htlc_hash` (which
/// the coordinator releases on redemption) or alone once `csv_blocks` have passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorLock {
    /// The user's public key, required on both branches.
    user_pubkey: UserPubkey,

    /// SHA-256 commitment to the stake's preimage.
    htlc_hash: sha256::Hash,

    /// Relative timelock in blocks on the user-only branch.
    csv_blocks: u16,

    /// The output type the script is wrapped in.
    kind: AddressKind,

    /// The bitcoin network on which the connector operates.
    network: Network,
}

impl ConnectorLock {
    /// Creates a new [`ConnectorLock`].
    pub const fn new(
        user_pubkey: UserPubkey,
        htlc_hash: sha256::Hash,
        csv_blocks: u16,
        kind: AddressKind,
        network: Network,
    ) -> Self {
        Self {
            user_pubkey,
            htlc_hash,
            csv_blocks,
            kind,
            network,
        }
    }

    /// The output type of this connector.
    pub const fn kind(&self) -> AddressKind {
        self.kind
    }

    /// The HTLC hash commitment.
    pub const fn htlc_hash(&self) -> sha256::Hash {
        self.htlc_hash
    }

    /// The sequence an input must carry to spend via [`LockSpendPath::Csv`].
    pub fn csv_sequence(&self) -> Sequence {
        relative::LockTime::from_height(self.csv_blocks).into()
    }

    /// Generates the locking script for this connector.
    ///
    /// ```text
    /// OP_DEPTH OP_1SUB
    /// OP_IF
    ///     OP_SHA256 <htlc_hash> OP_EQUALVERIFY
    /// OP_ELSE
    ///     <csv_blocks> OP_CHECKSEQUENCEVERIFY OP_DROP
    /// OP_ENDIF
    /// <user_pubkey> OP_CHECKSIG
    /// ```
    pub fn generate_script(&self) -> ScriptBuf {
        let builder = ScriptBuf::builder()
            .push_opcode(OP_DEPTH)
            .push_opcode(OP_1SUB)
            .push_opcode(OP_IF)
            .push_opcode(OP_SHA256)
            .push_slice(self.htlc_hash.to_byte_array())
            .push_opcode(OP_EQUALVERIFY)
            .push_opcode(OP_ELSE)
            .push_sequence(self.csv_sequence())
            .push_opcode(OP_CSV)
            .push_opcode(OP_DROP)
            .push_opcode(OP_ENDIF);

        push_pubkey(builder, self.kind, &self.user_pubkey.full())
            .push_opcode(OP_CHECKSIG)
            .into_script()
    }

    /// Human readable form of [`Self::generate_script`].
    pub fn script_asm(&self) -> String {
        self.generate_script().to_asm_string()
    }

    /// Wraps the locking script in the connector's output type.
    pub fn derive(&self) -> TxBuilderResult<DerivedAddress> {
        DerivedAddress::new(self.kind, self.network, self.generate_script())
    }

    /// The final-lock address.
    pub fn generate_address(&self) -> TxBuilderResult<Address> {
        Ok(self.derive()?.address)
    }

    /// Fills in the metadata of a psbt input that spends `value` from this connector.
    pub fn populate_input(&self, input: &mut Input, value: Amount) -> TxBuilderResult<()> {
        self.derive()?.populate_input(input, value)
    }

    /// Finalizes a psbt input where this connector is used with the provided `witness_data`.
    ///
    /// # Note
    ///
    /// Neither the signature nor the preimage are checked here.
    pub fn finalize_input(
        &self,
        input: &mut Input,
        witness_data: LockSpendPath,
    ) -> TxBuilderResult<()> {
        let witness = self.derive()?.witness(witness_data.stack())?;
        finalize_input(input, witness);

        Ok(())
    }
}
