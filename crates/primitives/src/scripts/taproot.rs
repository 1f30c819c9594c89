//! Taproot helpers for outputs that can only be spent through one of their script leaves.

use std::collections::BTreeMap;

use bitcoin::{
    hashes::Hash,
    psbt::Input,
    secp256k1::SECP256K1,
    sighash::{Prevouts, SighashCache, TaprootError},
    taproot::{ControlBlock, LeafVersion, TaprootBuilder, TaprootSpendInfo},
    Address, Network, ScriptBuf, TapLeafHash, TapSighashType, Transaction, TxOut, Witness,
};
use secp256k1::Message;

use crate::{
    constants::UNSPENDABLE_INTERNAL_KEY,
    errors::{TxBuilderError, TxBuilderResult},
};

/// Creates a taproot address that commits to `scripts` and whose internal key is the
/// [`static@UNSPENDABLE_INTERNAL_KEY`], so that the key path can never be used.
///
/// # Errors
///
/// If `scripts` is empty.
pub fn create_taproot_addr(
    network: Network,
    scripts: &[ScriptBuf],
) -> TxBuilderResult<(Address, TaprootSpendInfo)> {
    if scripts.is_empty() {
        return Err(TxBuilderError::EmptyTapscript);
    }

    let spend_info = build_taptree(scripts)?;
    let address = Address::p2tr(
        SECP256K1,
        *UNSPENDABLE_INTERNAL_KEY,
        spend_info.merkle_root(),
        network,
    );

    Ok((address, spend_info))
}

/// Places the scripts in a taptree of minimal height.
///
/// With `n` leaves the deepest level is `ceil(log2(n))`. When `n` is not a power of two, the
/// leaves that do not fit in the deepest level go one level up.
fn build_taptree(scripts: &[ScriptBuf]) -> TxBuilderResult<TaprootSpendInfo> {
    let num_scripts = scripts.len();
    let max_depth = match num_scripts {
        0 | 1 => 0,
        n => (n - 1).ilog2() + 1,
    };

    let num_shallow = 2usize.pow(max_depth).saturating_sub(num_scripts);
    let num_deep = num_scripts.saturating_sub(num_shallow);

    let builder = scripts
        .iter()
        .enumerate()
        .try_fold(TaprootBuilder::new(), |builder, (idx, script)| {
            let depth = if idx < num_deep {
                max_depth
            } else {
                max_depth - 1
            };

            builder.add_leaf(depth as u8, script.clone())
        })?;

    builder
        .finalize(SECP256K1, *UNSPENDABLE_INTERNAL_KEY)
        .map_err(|_| TxBuilderError::IncompleteTaptree)
}

/// Returns the control block required to spend `script` from an output built with
/// `spend_info`.
pub fn control_block_for(
    spend_info: &TaprootSpendInfo,
    script: &ScriptBuf,
) -> TxBuilderResult<ControlBlock> {
    spend_info
        .control_block(&(script.clone(), LeafVersion::TapScript))
        .ok_or(TxBuilderError::MissingLeaf)
}

/// Computes the message that a tapscript signature for `script` at `input_index` must commit to.
pub fn create_script_spend_hash(
    sighash_cache: &mut SighashCache<&Transaction>,
    script: &ScriptBuf,
    prevouts: Prevouts<'_, TxOut>,
    sighash_type: TapSighashType,
    input_index: usize,
) -> Result<Message, TaprootError> {
    let leaf_hash = TapLeafHash::from_script(script, LeafVersion::TapScript);

    let sighash = sighash_cache.taproot_script_spend_signature_hash(
        input_index,
        &prevouts,
        leaf_hash,
        sighash_type,
    )?;

    Ok(Message::from_digest(sighash.to_byte_array()))
}

/// Finalizes a [`bitcoin::Psbt`] input with the given witness stack, bottom element first.
///
/// This is done as per
/// <https://github.com/rust-bitcoin/rust-bitcoin/blob/bitcoin-0.32.1/bitcoin/examples/taproot-psbt.rs#L315-L327>
/// and clears every field that BIP-174 says a finalizer must clear, for segwit v0 and taproot
/// inputs alike.
pub fn finalize_input<D>(input: &mut Input, witnesses: impl IntoIterator<Item = D>)
where
    D: AsRef<[u8]>,
{
    let mut witness_stack = Witness::new();

    witnesses
        .into_iter()
        .for_each(|witness| witness_stack.push(witness));

    input.final_script_witness = Some(witness_stack);

    input.partial_sigs = BTreeMap::new();
    input.sighash_type = None;
    input.redeem_script = None;
    input.witness_script = None;
    input.bip32_derivation = BTreeMap::new();
    input.tap_script_sigs = BTreeMap::new();
    input.tap_scripts = BTreeMap::new();
    input.tap_key_origins = BTreeMap::new();
    input.tap_internal_key = None;
    input.tap_merkle_root = None;
}

#[cfg(test)]
mod tests {
    use bitcoin::opcodes::all::OP_CHECKSIG;
    use proptest::prelude::*;

    use super::*;

    fn dummy_script(tag: u8) -> ScriptBuf {
        ScriptBuf::builder()
            .push_slice([tag; 32])
            .push_opcode(OP_CHECKSIG)
            .into_script()
    }

    #[test]
    fn test_create_taproot_addr() {
        let scripts: Vec<ScriptBuf> = (0..10).map(dummy_script).collect();
        let network = Network::Regtest;

        assert!(
            matches!(
                create_taproot_addr(network, &[]),
                Err(TxBuilderError::EmptyTapscript)
            ),
            "script-path-only addresses need at least one leaf"
        );

        for count in [1, 4, 5, 10] {
            let (_, spend_info) = create_taproot_addr(network, &scripts[..count])
                .unwrap_or_else(|e| panic!("must build taptree with {count} leaves: {e}"));

            assert_eq!(spend_info.internal_key(), *UNSPENDABLE_INTERNAL_KEY);

            for script in &scripts[..count] {
                assert!(
                    control_block_for(&spend_info, script).is_ok(),
                    "every leaf must be spendable"
                );
            }
        }
    }

    #[test]
    fn test_control_block_verifies_against_output_key() {
        let script = dummy_script(7);
        let (address, spend_info) =
            create_taproot_addr(Network::Regtest, std::slice::from_ref(&script)).unwrap();

        let control_block = control_block_for(&spend_info, &script).unwrap();
        let output_key = spend_info.output_key().to_inner();

        assert!(control_block.verify_taproot_commitment(SECP256K1, output_key, &script));
        assert!(address.script_pubkey().is_p2tr());

        assert!(matches!(
            control_block_for(&spend_info, &dummy_script(8)),
            Err(TxBuilderError::MissingLeaf)
        ));
    }

    #[test]
    fn test_finalize_input_clears_signing_fields() {
        let script = dummy_script(1);
        let mut input = Input {
            witness_script: Some(script.clone()),
            tap_internal_key: Some(*UNSPENDABLE_INTERNAL_KEY),
            ..Default::default()
        };

        finalize_input(&mut input, [vec![1u8; 64], script.to_bytes()]);

        let witness = input.final_script_witness.expect("witness must be set");
        assert_eq!(witness.len(), 2);
        assert_eq!(witness.nth(1), Some(script.as_bytes()));
        assert!(input.witness_script.is_none());
        assert!(input.tap_internal_key.is_none());
    }

    proptest! {
        #[test]
        fn taproot_address_is_deterministic(tag in any::<u8>()) {
            let script = dummy_script(tag);

            let (first, _) = create_taproot_addr(Network::Bitcoin, std::slice::from_ref(&script)).unwrap();
            let (second, _) = create_taproot_addr(Network::Bitcoin, std::slice::from_ref(&script)).unwrap();

            prop_assert_eq!(first, second);
        }
    }
}
