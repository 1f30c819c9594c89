//! This module contains the connector for the user's deposit output.
//!
//! The user sends their collateral to this output. It is spent by the lock transaction which
//! moves the collateral into the final-lock output.
use bitcoin::{
    opcodes::all::{
        OP_1SUB, OP_CHECKSIG, OP_CHECKSIGVERIFY, OP_CSV, OP_DEPTH, OP_DROP, OP_ELSE, OP_ENDIF,
        OP_IF,
    },
    psbt::Input,
    relative, Address, Amount, Network, ScriptBuf, Sequence,
};
use gbpl_custody_params::prelude::AddressKind;
use gbpl_custody_primitives::{
    errors::TxBuilderResult, keys::UserPubkey, scripts::prelude::finalize_input,
};
use secp256k1::PublicKey;

use crate::{
    address::{push_pubkey, DerivedAddress},
    spend_path::DepositSpendPath,
};

/// The connector for the user's deposit output.
///
/// The output can be spent either by the user and the coordinator together, or by the user alone
/// once `timeout` blocks have passed since it confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorDeposit {
    /// The user's public key, required on both branches.
    user_pubkey: UserPubkey,

    /// The coordinator's public key, required on the cooperative branch.
    coordinator_pubkey: PublicKey,

    /// Relative timelock in blocks after which the user can spend alone.
    timeout: u16,

    /// The output type the script is wrapped in.
    kind: AddressKind,

    /// The bitcoin network on which the connector operates.
    network: Network,
}

impl ConnectorDeposit {
    /// Creates a new [`ConnectorDeposit`].
    pub const fn new(
        user_pubkey: UserPubkey,
        coordinator_pubkey: PublicKey,
        timeout: u16,
        kind: AddressKind,
        network: Network,
    ) -> Self {
        Self {
            user_pubkey,
            coordinator_pubkey,
            timeout,
            kind,
            network,
        }
    }

    /// The output type of this connector.
    pub const fn kind(&self) -> AddressKind {
        self.kind
    }

    /// The user's public key.
    pub const fn user_pubkey(&self) -> UserPubkey {
        self.user_pubkey
    }

    /// The coordinator's public key.
    pub const fn coordinator_pubkey(&self) -> PublicKey {
        self.coordinator_pubkey
    }

    /// The sequence an input must carry to spend via [`DepositSpendPath::Timeout`].
    pub fn timeout_sequence(&self) -> Sequence {
        relative::LockTime::from_height(self.timeout).into()
    }

    /// Generates the locking script for this connector.
    ///
    /// ```text
    /// OP_DEPTH OP_1SUB
    /// OP_IF
    ///     <coordinator_pubkey> OP_CHECKSIGVERIFY
    /// OP_ELSE
    ///     <timeout> OP_CHECKSEQUENCEVERIFY OP_DROP
    /// OP_ENDIF
    /// <user_pubkey> OP_CHECKSIG
    /// ```
    pub fn generate_script(&self) -> ScriptBuf {
        let builder = ScriptBuf::builder()
            .push_opcode(OP_DEPTH)
            .push_opcode(OP_1SUB)
            .push_opcode(OP_IF);

        let builder = push_pubkey(builder, self.kind, &self.coordinator_pubkey)
            .push_opcode(OP_CHECKSIGVERIFY)
            .push_opcode(OP_ELSE)
            .push_sequence(self.timeout_sequence())
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

    /// The deposit address the user sends their collateral to.
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
    /// This method does not check if the signatures in `witness_data` are valid for the input,
    /// deferring the validation to the caller (or to the network).
    pub fn finalize_input(
        &self,
        input: &mut Input,
        witness_data: DepositSpendPath,
    ) -> TxBuilderResult<()> {
        let witness = self.derive()?.witness(witness_data.stack())?;
        finalize_input(input, witness);

        Ok(())
    }
}
