//! Traits for the RPC server.

use jsonrpsee::{core::RpcResult, proc_macros::rpc};

use crate::types::{
    AssembleLockRequest, AssembleLockResponse, CreateStakeRequest, CreateStakeResponse,
    DepositAddressRequest, DepositAddressResponse, FinalizeLockRequest, FinalizeLockResponse,
    RedeemStakeRequest, RedeemStakeResponse, SaveDepositTxRequest, StakeBtcMetaResponse,
    StakesResponse, SuccessResponse,
};

/// RPCs that move a user's bitcoin deposit into its final-lock output.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "custody"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "custody"))]
pub trait CustodyLockApi {
    /// Builds the deposit address for a user key.
    #[method(name = "depositAddress")]
    async fn deposit_address(
        &self,
        request: DepositAddressRequest,
    ) -> RpcResult<DepositAddressResponse>;

    /// Assembles the lock transaction for a deposit and signs the coordinator's fee inputs.
    ///
    /// The returned PSBT still needs the user's signature on the deposit input.
    #[method(name = "assembleLock")]
    async fn assemble_lock(&self, request: AssembleLockRequest) -> RpcResult<AssembleLockResponse>;

    /// Completes a lock transaction signed by the user and broadcasts it.
    #[method(name = "finalizeLock")]
    async fn finalize_lock(&self, request: FinalizeLockRequest) -> RpcResult<FinalizeLockResponse>;

    /// Get the coordinator key and the transactions recorded for a stake.
    #[method(name = "stakeBtcMeta")]
    async fn stake_btc_meta(
        &self,
        #[argument(rename = "stakeId")] stake_id: Option<String>,
        #[argument(rename = "btcPubkey")] btc_pubkey: Option<String>,
    ) -> RpcResult<StakeBtcMetaResponse>;

    /// Records the deposit transaction a user broadcast for a stake.
    #[method(name = "saveDepositTx")]
    async fn save_deposit_tx(&self, request: SaveDepositTxRequest) -> RpcResult<SuccessResponse>;
}

/// RPCs that create, redeem and list stakes.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "custody"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "custody"))]
pub trait CustodyStakeApi {
    /// Creates a stake from a verified token transfer into the vault.
    #[method(name = "createStake")]
    async fn create_stake(&self, request: CreateStakeRequest) -> RpcResult<CreateStakeResponse>;

    /// Redeems a stake with a message signed by its owner.
    #[method(name = "redeemStake")]
    async fn redeem_stake(&self, request: RedeemStakeRequest) -> RpcResult<RedeemStakeResponse>;

    /// Get the stakes awaiting their lock transaction, the total staked and optionally the stakes
    /// of one user.
    #[method(name = "stakes")]
    async fn stakes(
        &self,
        #[argument(rename = "userAddress")] user_address: Option<String>,
    ) -> RpcResult<StakesResponse>;
}
