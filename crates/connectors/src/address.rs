//! Wraps a witness script in an output type to get an address and what is needed to spend it.

use bitcoin::{
    psbt::Input,
    script::Builder,
    taproot::{LeafVersion, TaprootSpendInfo},
    Address, Amount, Network, ScriptBuf, TxOut,
};
use gbpl_custody_params::prelude::AddressKind;
use gbpl_custody_primitives::{
    constants::UNSPENDABLE_INTERNAL_KEY,
    errors::TxBuilderResult,
    scripts::prelude::{control_block_for, create_taproot_addr},
};
use secp256k1::PublicKey;

/// An address derived from a single witness script.
#[derive(Debug, Clone)]
pub struct DerivedAddress {
    /// The output type the script is wrapped in.
    pub kind: AddressKind,

    /// The witness script.
    pub script: ScriptBuf,

    /// The address committing to [`Self::script`].
    pub address: Address,

    /// The taptree, for taproot addresses.
    pub spend_info: Option<TaprootSpendInfo>,
}

impl DerivedAddress {
    /// Wraps `script` in an output of the given `kind` on `network`.
    ///
    /// This is deterministic: the same script, kind and network always give the same address.
    pub fn new(kind: AddressKind, network: Network, script: ScriptBuf) -> TxBuilderResult<Self> {
        let (address, spend_info) = match kind {
            AddressKind::SegwitV0 => (Address::p2wsh(&script, network), None),
            AddressKind::Taproot => {
                let (address, spend_info) =
                    create_taproot_addr(network, std::slice::from_ref(&script))?;
                (address, Some(spend_info))
            }
        };

        Ok(Self {
            kind,
            script,
            address,
            spend_info,
        })
    }

    /// Fills in what a signer needs to know about an input spending `value` from this address.
    pub fn populate_input(&self, input: &mut Input, value: Amount) -> TxBuilderResult<()> {
        input.witness_utxo = Some(TxOut {
            value,
            script_pubkey: self.address.script_pubkey(),
        });

        match &self.spend_info {
            Some(spend_info) => {
                let control_block = control_block_for(spend_info, &self.script)?;
                input
                    .tap_scripts
                    .insert(control_block, (self.script.clone(), LeafVersion::TapScript));
                input.tap_internal_key = Some(*UNSPENDABLE_INTERNAL_KEY);
                input.tap_merkle_root = spend_info.merkle_root();
            }
            None => {
                input.witness_script = Some(self.script.clone());
            }
        }

        Ok(())
    }

    /// The witness for spending from this address, given the elements below the script.
    pub fn witness(&self, mut stack: Vec<Vec<u8>>) -> TxBuilderResult<Vec<Vec<u8>>> {
        stack.push(self.script.to_bytes());

        if let Some(spend_info) = &self.spend_info {
            stack.push(control_block_for(spend_info, &self.script)?.serialize());
        }

        Ok(stack)
    }
}

/// Pushes `pubkey` in the encoding the signature opcodes of `kind` expect.
///
/// Tapscript checks 32-byte x-only keys while segwit v0 needs the 33-byte compressed encoding.
pub(crate) fn push_pubkey(builder: Builder, kind: AddressKind, pubkey: &PublicKey) -> Builder {
    match kind {
        AddressKind::Taproot => builder.push_x_only_key(&pubkey.x_only_public_key().0),
        AddressKind::SegwitV0 => builder.push_key(&bitcoin::PublicKey::new(*pubkey)),
    }
}
