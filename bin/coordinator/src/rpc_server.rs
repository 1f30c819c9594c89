//! Bootstraps the RPC server of the coordinator.

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use gbpl_custody_coordinator::{errors::CoordinatorError, lock::LockService, stake::StakeService};
use gbpl_custody_rpc::{
    traits::{CustodyLockApiServer, CustodyStakeApiServer},
    types::{
        AssembleLockRequest, AssembleLockResponse, CreateStakeRequest, CreateStakeResponse,
        DepositAddressRequest, DepositAddressResponse, FinalizeLockRequest, FinalizeLockResponse,
        RedeemStakeRequest, RedeemStakeResponse, SaveDepositTxRequest, StakeBtcMetaResponse,
        StakesResponse, SuccessResponse,
    },
};
use jsonrpsee::{core::RpcResult, types::ErrorObjectOwned, RpcModule};
use serde::Serialize;
use tokio::signal;
use tracing::{debug, error, info, warn};

/// Starts the RPC server and serves until ctrl-c.
pub(crate) async fn start_rpc<T>(rpc_impl: &T, rpc_addr: &str) -> anyhow::Result<()>
where
    T: CustodyLockApiServer + CustodyStakeApiServer + Clone + Sync + Send + 'static,
{
    let mut rpc_module = RpcModule::new(rpc_impl.clone());

    let lock_api = CustodyLockApiServer::into_rpc(rpc_impl.clone());
    let stake_api = CustodyStakeApiServer::into_rpc(rpc_impl.clone());

    rpc_module.merge(lock_api).context("merge lock api")?;
    rpc_module.merge(stake_api).context("merge stake api")?;

    info!("starting coordinator rpc server at {rpc_addr}");
    let rpc_server = jsonrpsee::server::ServerBuilder::new()
        .build(&rpc_addr)
        .await
        .context("build coordinator rpc server")?;

    let rpc_handle = rpc_server.start(rpc_module);
    debug!("coordinator rpc server started");

    signal::ctrl_c().await.context("listen for ctrl-c")?;
    info!("stopping rpc server");

    if rpc_handle.stop().is_err() {
        warn!("rpc server already stopped");
    }
    rpc_handle.stopped().await;

    Ok(())
}

/// Serves the custody RPCs from the coordinator services.
#[derive(Debug, Clone)]
pub(crate) struct CustodyRpc {
    lock: LockService,
    stake: StakeService,
}

impl CustodyRpc {
    pub(crate) const fn new(lock: LockService, stake: StakeService) -> Self {
        Self { lock, stake }
    }
}

#[async_trait]
impl CustodyLockApiServer for CustodyRpc {
    async fn deposit_address(
        &self,
        request: DepositAddressRequest,
    ) -> RpcResult<DepositAddressResponse> {
        self.lock.deposit_address(request).map_err(into_rpc_error)
    }

    async fn assemble_lock(&self, request: AssembleLockRequest) -> RpcResult<AssembleLockResponse> {
        self.lock
            .assemble_lock(request)
            .await
            .map_err(into_rpc_error)
    }

    async fn finalize_lock(&self, request: FinalizeLockRequest) -> RpcResult<FinalizeLockResponse> {
        self.lock
            .finalize_lock(request)
            .await
            .map_err(into_rpc_error)
    }

    async fn stake_btc_meta(
        &self,
        stake_id: Option<String>,
        btc_pubkey: Option<String>,
    ) -> RpcResult<StakeBtcMetaResponse> {
        self.lock
            .btc_meta(stake_id.as_deref(), btc_pubkey.as_deref())
            .await
            .map_err(into_rpc_error)
    }

    async fn save_deposit_tx(&self, request: SaveDepositTxRequest) -> RpcResult<SuccessResponse> {
        self.lock
            .save_deposit_tx(request)
            .await
            .map_err(into_rpc_error)
    }
}

#[async_trait]
impl CustodyStakeApiServer for CustodyRpc {
    async fn create_stake(&self, request: CreateStakeRequest) -> RpcResult<CreateStakeResponse> {
        self.stake
            .create_stake(request, Utc::now())
            .await
            .map_err(into_rpc_error)
    }

    async fn redeem_stake(&self, request: RedeemStakeRequest) -> RpcResult<RedeemStakeResponse> {
        self.stake
            .redeem_stake(request, Utc::now())
            .await
            .map_err(into_rpc_error)
    }

    async fn stakes(&self, user_address: Option<String>) -> RpcResult<StakesResponse> {
        self.stake
            .list_stakes(user_address.as_deref())
            .await
            .map_err(into_rpc_error)
    }
}

#[derive(Debug, Serialize)]
struct ErrorData {
    error: String,
}

/// Maps a [`CoordinatorError`] to an [`ErrorObjectOwned`] whose code is the error's status code.
fn into_rpc_error(err: CoordinatorError) -> ErrorObjectOwned {
    let code = err.status_code();
    let message = err.to_string();

    if code >= 500 {
        error!(%code, %message, "request failed");
    } else {
        debug!(%code, %message, "request rejected");
    }

    ErrorObjectOwned::owned(
        i32::from(code),
        message.clone(),
        Some(ErrorData { error: message }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_carries_status_and_message() {
        let err = into_rpc_error(CoordinatorError::BroadcastRejected(
            "sendrawtransaction RPC error: bad-txns-inputs-missingorspent".to_string(),
        ));

        assert_eq!(err.code(), 400);
        assert_eq!(
            err.message(),
            "sendrawtransaction RPC error: bad-txns-inputs-missingorspent"
        );
        assert_eq!(
            err.data().map(|data| data.get()),
            Some(r#"{"error":"sendrawtransaction RPC error: bad-txns-inputs-missingorspent"}"#)
        );

        let err = into_rpc_error(CoordinatorError::Configuration(
            "BITCOIN_KEY is not set".to_string(),
        ));
        assert_eq!(err.code(), 500);
    }
}
