//! Handlers for the bitcoin side of a stake.
//!
//! The flow is: the user asks for a deposit address, pays to it, reports the deposit
//! transaction, and asks the coordinator to assemble the lock transaction. The coordinator funds
//! and signs its fee inputs and hands the PSBT back. The user signs the deposit input and sends the
//! PSBT to [`LockService::finalize_lock`], which completes the witnesses and broadcasts.

use std::{str::FromStr, sync::Arc};

use bitcoin::{Network, Psbt, Transaction, Txid};
use gbpl_custody_chain::{errors::ChainError, locator::locate_deposit, traits::ChainReader};
use gbpl_custody_connectors::prelude::{ConnectorDeposit, ConnectorLock};
use gbpl_custody_params::prelude::{AddressKind, BtcNetwork, LockParams};
use gbpl_custody_primitives::{
    keys::{parse_sha256, parse_txid, UserPubkey},
    types::FeeUtxo,
};
use gbpl_custody_rpc::types::{
    AssembleLockRequest, AssembleLockResponse, DepositAddressRequest, DepositAddressResponse,
    FinalizeLockRequest, FinalizeLockResponse, SaveDepositTxRequest, StakeBtcMetaResponse,
    SuccessResponse,
};
use gbpl_custody_signer::prelude::CoordinatorSigner;
use gbpl_custody_stake::{
    record::{validate_stake_id, StakeRecord},
    repo::{AssembledLock, StakeRepo},
};
use gbpl_custody_tx_graph::{
    leases::UtxoLeases,
    transactions::prelude::{LockTx, LockTxData},
};
use tracing::{debug, info, warn};

use crate::errors::{CoordinatorError, CoordinatorResult};

/// Handles deposit addresses and the lock transaction.
#[derive(Debug, Clone)]
pub struct LockService {
    network: BtcNetwork,
    params: LockParams,
    chain: Arc<dyn ChainReader>,
    repo: StakeRepo,
    leases: Arc<UtxoLeases>,

    /// Absent when no seed is configured. Every request that needs the coordinator key fails
    /// with [`CoordinatorError::Configuration`] in that case.
    signer: Option<Arc<CoordinatorSigner>>,
}

impl LockService {
    /// Creates a new [`LockService`].
    pub fn new(
        network: BtcNetwork,
        params: LockParams,
        chain: Arc<dyn ChainReader>,
        repo: StakeRepo,
        leases: Arc<UtxoLeases>,
        signer: Option<Arc<CoordinatorSigner>>,
    ) -> Self {
        Self {
            network,
            params,
            chain,
            repo,
            leases,
            signer,
        }
    }

    fn signer(&self) -> CoordinatorResult<&CoordinatorSigner> {
        self.signer
            .as_deref()
            .ok_or_else(|| CoordinatorError::Configuration("BITCOIN_KEY is not set".to_string()))
    }

    const fn address_network(&self) -> Network {
        self.network.address_network()
    }

    /// Rejects requests for a network whose addresses differ from ours.
    fn check_network(&self, requested: Option<&str>) -> CoordinatorResult<()> {
        let Some(requested) = requested else {
            return Ok(());
        };

        let requested = BtcNetwork::from_str(requested)?;
        if requested.address_network() != self.address_network() {
            return Err(CoordinatorError::Validation(format!(
                "coordinator runs on {}, not {requested}",
                self.network
            )));
        }

        Ok(())
    }

    fn connector_deposit(
        &self,
        signer: &CoordinatorSigner,
        user_pubkey: UserPubkey,
        kind: AddressKind,
    ) -> ConnectorDeposit {
        ConnectorDeposit::new(
            user_pubkey,
            signer.keys().public_key(),
            self.params.deposit_timeout,
            kind,
            self.address_network(),
        )
    }

    /// Builds the deposit address of `request.user_pubkey_hex`.
    pub fn deposit_address(
        &self,
        request: DepositAddressRequest,
    ) -> CoordinatorResult<DepositAddressResponse> {
        self.check_network(request.network.as_deref())?;

        let user_pubkey = UserPubkey::from_str(&request.user_pubkey_hex)?;
        let kind = match request.address_kind.as_deref() {
            Some(kind) => AddressKind::from_str(kind)?,
            None => self.params.deposit_address_kind,
        };

        let connector = self.connector_deposit(self.signer()?, user_pubkey, kind);
        let address = connector.generate_address()?;

        debug!(%user_pubkey, %kind, %address, "derived deposit address");

        Ok(DepositAddressResponse {
            address: address.to_string(),
            script_hex: connector.generate_script().to_hex_string(),
            script_asm: connector.script_asm(),
            address_kind: kind.to_string(),
        })
    }

    /// Assembles the lock transaction that spends the deposit of stake `request.stake_id` and
    /// signs the coordinator's fee inputs.
    ///
    /// The fee inputs stay leased to the deposit until the lock transaction is broadcast, the
    /// deposit is assembled again or the lease expires.
    pub async fn assemble_lock(
        &self,
        request: AssembleLockRequest,
    ) -> CoordinatorResult<AssembleLockResponse> {
        validate_stake_id(&request.stake_id)?;
        self.check_network(request.network.as_deref())?;

        let user_pubkey = UserPubkey::from_str(&request.user_pubkey_hex)?;
        let htlc_hash = parse_sha256("htlc hash", &request.htlc_hash)?;
        let deposit_txid = parse_txid("deposit txid", &request.deposit_tx_id)?;
        if request.csv_blocks == 0 {
            return Err(CoordinatorError::Validation(
                "csv blocks must be positive".to_string(),
            ));
        }

        let record = self.repo.load(&request.stake_id).await?;
        if record.htlc_hash() != htlc_hash {
            return Err(CoordinatorError::Validation(
                "htlc hash does not match the stake".to_string(),
            ));
        }
        ensure_awaits_lock(&record)?;

        let signer = self.signer()?;
        let connector_deposit =
            self.connector_deposit(signer, user_pubkey, record.deposit_address_kind());
        let deposit_address = connector_deposit.generate_address()?;

        let deposit = locate_deposit(self.chain.as_ref(), &deposit_txid, &deposit_address).await?;

        let funding_address = signer.keys().funding_address(self.address_network());
        let utxos = self.chain.get_utxos(&funding_address).await?;
        let (fee_selection, pending_leases) = self.leases.select_and_lease(
            deposit_txid,
            utxos.into_iter().map(FeeUtxo::from),
            self.params.fee_target(),
            self.params.dust_limit,
        )?;

        let data = LockTxData {
            deposit,
            fee_selection,
            funding_script: signer.keys().funding_script(),
        };
        let connector_lock = ConnectorLock::new(
            user_pubkey,
            htlc_hash,
            request.csv_blocks,
            self.params.lock_address_kind,
            self.address_network(),
        );

        let lock_tx = match self.build_and_sign(signer, data, &connector_deposit, &connector_lock) {
            Ok(lock_tx) => lock_tx,
            Err(err) => {
                self.leases.abort(pending_leases);
                return Err(err);
            }
        };

        let assembled = AssembledLock {
            stake_id: request.stake_id.clone(),
            lock_txid: lock_tx.compute_txid(),
            user_pubkey: user_pubkey.to_string(),
        };

        if let Err(err) = self.repo.set_assembled_lock(&deposit_txid, &assembled).await {
            self.leases.abort(pending_leases);
            return Err(err.into());
        }
        self.leases.commit(pending_leases);

        info!(
            stake_id = %request.stake_id,
            %deposit_txid,
            lock_txid = %assembled.lock_txid,
            lock_amount = %lock_tx.lock_amount(),
            "assembled lock transaction"
        );

        Ok(AssembleLockResponse {
            success: true,
            psbt_base64: lock_tx.into_psbt().to_string(),
        })
    }

    fn build_and_sign(
        &self,
        signer: &CoordinatorSigner,
        data: LockTxData,
        connector_deposit: &ConnectorDeposit,
        connector_lock: &ConnectorLock,
    ) -> CoordinatorResult<LockTx> {
        let mut lock_tx = LockTx::new(data, connector_deposit, connector_lock, &self.params)?;
        signer.sign_fee_inputs(lock_tx.psbt_mut())?;

        Ok(lock_tx)
    }

    /// Completes the lock transaction signed by the user and broadcasts it.
    ///
    /// Only the exact transaction last assembled for the deposit is accepted. On success the
    /// stake's collateral is marked as locked. If recording the lock failed after the
    /// transaction was relayed, finalizing again records it without relaying it twice.
    pub async fn finalize_lock(
        &self,
        request: FinalizeLockRequest,
    ) -> CoordinatorResult<FinalizeLockResponse> {
        validate_stake_id(&request.stake_id)?;
        self.check_network(request.network.as_deref())?;

        let deposit_txid = parse_txid("deposit txid", &request.deposit_tx_id)?;
        let psbt = Psbt::from_str(&request.psbt)
            .map_err(|e| CoordinatorError::Validation(format!("invalid psbt: {e}")))?;

        let record = self.repo.load(&request.stake_id).await?;
        ensure_awaits_lock(&record)?;

        let assembled = self
            .repo
            .assembled_lock(&deposit_txid)
            .await?
            .ok_or_else(|| {
                CoordinatorError::InvalidState(format!(
                    "no lock transaction was assembled for deposit {deposit_txid}"
                ))
            })?;

        if assembled.stake_id != request.stake_id {
            return Err(CoordinatorError::Validation(
                "deposit was assembled for another stake".to_string(),
            ));
        }

        let lock_txid = psbt.unsigned_tx.compute_txid();
        if lock_txid != assembled.lock_txid {
            warn!(%deposit_txid, %lock_txid, expected = %assembled.lock_txid, "psbt was modified");
            return Err(CoordinatorError::Validation(
                "psbt does not match the assembled lock transaction".to_string(),
            ));
        }

        let signer = self.signer()?;
        let user_pubkey = UserPubkey::from_str(&assembled.user_pubkey)?;
        let connector_deposit =
            self.connector_deposit(signer, user_pubkey, record.deposit_address_kind());

        let mut lock_tx = LockTx::from_psbt(psbt);
        signer.sign_fee_inputs(lock_tx.psbt_mut())?;
        let tx = lock_tx.finalize(&connector_deposit)?;

        let final_txid = self.broadcast(&tx).await?;
        self.record_lock(&request.stake_id, &deposit_txid, final_txid)
            .await?;

        info!(stake_id = %request.stake_id, %deposit_txid, %final_txid, "broadcast lock transaction");

        Ok(FinalizeLockResponse {
            success: true,
            txid: final_txid.to_string(),
        })
    }

    /// Broadcasts `tx`, treating a rejection of a transaction the explorer already knows as
    /// success so that a finalization interrupted after its broadcast can be completed.
    async fn broadcast(&self, tx: &Transaction) -> CoordinatorResult<Txid> {
        let err = match self.chain.broadcast(tx).await {
            Ok(txid) => return Ok(txid),
            Err(err @ ChainError::BroadcastRejected { .. }) => err,
            Err(err) => return Err(err.into()),
        };

        let txid = tx.compute_txid();
        match self.chain.get_transaction(&txid).await {
            Ok(known) => {
                warn!(
                    %txid,
                    confirmed = known.status.confirmed,
                    reason = %err,
                    "lock transaction was already broadcast"
                );
                Ok(txid)
            }
            Err(lookup) => {
                debug!(%txid, %lookup, "rejected lock transaction is unknown to the explorer");
                Err(err.into())
            }
        }
    }

    async fn record_lock(
        &self,
        stake_id: &str,
        deposit_txid: &Txid,
        final_txid: Txid,
    ) -> CoordinatorResult<()> {
        self.leases.release(deposit_txid);
        self.repo.set_final_tx(deposit_txid, &final_txid).await?;
        self.repo.mark_locked(stake_id, final_txid).await?;

        Ok(())
    }

    /// The coordinator key and the deposit and lock transactions recorded for a stake.
    pub async fn btc_meta(
        &self,
        stake_id: Option<&str>,
        btc_pubkey: Option<&str>,
    ) -> CoordinatorResult<StakeBtcMetaResponse> {
        let pubkey_hex = self.signer()?.keys().public_key().to_string();

        let mut response = StakeBtcMetaResponse {
            success: true,
            pubkey_hex,
            has_tx: false,
            txid: None,
            final_txid: None,
        };

        let (Some(stake_id), Some(btc_pubkey)) = (stake_id, btc_pubkey) else {
            return Ok(response);
        };

        validate_stake_id(stake_id)?;
        let btc_pubkey = UserPubkey::from_str(btc_pubkey)?.to_string();

        if let Some(deposit_txid) = self.repo.deposit_tx(stake_id, &btc_pubkey).await? {
            response.has_tx = true;
            response.txid = Some(deposit_txid.to_string());
            response.final_txid = self
                .repo
                .final_tx(&deposit_txid)
                .await?
                .map(|txid| txid.to_string());
        }

        Ok(response)
    }

    /// Records the deposit transaction a user sent for a stake.
    pub async fn save_deposit_tx(
        &self,
        request: SaveDepositTxRequest,
    ) -> CoordinatorResult<SuccessResponse> {
        validate_stake_id(&request.stake_id)?;
        let btc_pubkey = UserPubkey::from_str(&request.btc_pubkey)?.to_string();
        let txid = parse_txid("txid", &request.txid)?;

        self.repo
            .save_deposit_tx(&request.stake_id, &btc_pubkey, &txid)
            .await?;

        debug!(stake_id = %request.stake_id, %btc_pubkey, %txid, "saved deposit transaction");

        Ok(SuccessResponse { success: true })
    }
}

fn ensure_awaits_lock(record: &StakeRecord) -> CoordinatorResult<()> {
    if !record.awaits_lock() {
        return Err(CoordinatorError::InvalidState(format!(
            "stake {} is not awaiting its lock transaction",
            record.id()
        )));
    }

    Ok(())
}
