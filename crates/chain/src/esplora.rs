//! [`ChainReader`] over the esplora HTTP API, as served by mempool.space and blockstream.info.

use std::time::Duration;

use async_trait::async_trait;
use bitcoin::{consensus::encode::serialize_hex, Address, Transaction, Txid};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::{
    errors::{ChainError, ChainResult},
    traits::ChainReader,
    types::{ExplorerTx, ExplorerUtxo},
};

/// Connection settings for an [`EsploraReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsploraConfig {
    /// Base URL of the explorer, e.g. `https://mempool.space/testnet4`.
    pub url: String,

    /// Deadline for a single request.
    pub timeout: Duration,

    /// How many times a failed read is attempted again.
    pub retry_count: u8,

    /// Delay between attempts.
    pub retry_interval: Duration,
}

/// Block explorer client.
#[derive(Debug, Clone)]
pub struct EsploraReader {
    client: Client,
    base_url: String,
    retry_count: u8,
    retry_interval: Duration,
}

impl EsploraReader {
    /// Creates a new [`EsploraReader`].
    pub fn new(config: &EsploraConfig) -> ChainResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            retry_count: config.retry_count,
            retry_interval: config.retry_interval,
        })
    }

    /// The base URL requests are made against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Makes a single GET request and returns the body of a successful response.
    async fn get_once(&self, path: &str) -> ChainResult<String> {
        let url = self.url(path);
        trace!(%url, "querying explorer");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ChainError::HttpResponse {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(body)
    }

    /// Makes a GET request, trying again up to `retry_count` times on transient failures.
    async fn get_text(&self, path: &str) -> ChainResult<String> {
        let mut num_retries = 0;

        loop {
            match self.get_once(path).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_transient() && num_retries < self.retry_count => {
                    num_retries += 1;
                    warn!(%path, %err, %num_retries, "explorer request failed, retrying");

                    tokio::time::sleep(self.retry_interval).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ChainResult<T> {
        let body = self.get_text(path).await?;

        serde_json::from_str(&body)
            .map_err(|e| ChainError::UnexpectedResponse(format!("{path}: {e}")))
    }
}

#[async_trait]
impl ChainReader for EsploraReader {
    async fn get_transaction(&self, txid: &Txid) -> ChainResult<ExplorerTx> {
        self.get_json(&format!("/tx/{txid}")).await
    }

    async fn get_utxos(&self, address: &Address) -> ChainResult<Vec<ExplorerUtxo>> {
        self.get_json(&format!("/address/{address}/utxo")).await
    }

    async fn get_tip_height(&self) -> ChainResult<u64> {
        let body = self.get_text("/blocks/tip/height").await?;

        parse_height(&body)
    }

    async fn broadcast(&self, tx: &Transaction) -> ChainResult<Txid> {
        let url = self.url("/tx");
        let txid = tx.compute_txid();
        debug!(%txid, "broadcasting transaction");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(serialize_hex(tx))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            warn!(%txid, %status, reason = %body, "explorer rejected transaction");

            return Err(ChainError::BroadcastRejected {
                status: status.as_u16(),
                message: body,
            });
        }

        parse_txid(&body)
    }
}

fn parse_height(body: &str) -> ChainResult<u64> {
    body.trim()
        .parse()
        .map_err(|_| ChainError::UnexpectedResponse(format!("invalid tip height: {body}")))
}

fn parse_txid(body: &str) -> ChainResult<Txid> {
    body.trim()
        .parse()
        .map_err(|_| ChainError::UnexpectedResponse(format!("invalid txid: {body}")))
}
