//! JSON-RPC access for the deployment pipeline
//!
//! [`DeployRpc`] names every node call the deployer makes, so the pipeline
//! can run against a scripted double instead of a live chain.

use crate::error::{DeployerError, DeployerResult};

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::time::Duration;
use tracing::{debug, warn};

/// Node operations used by the deployer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeployRpc: Send + Sync {
    /// Liveness probe; returns the latest block number
    async fn block_number(&self) -> DeployerResult<u64>;

    async fn chain_id(&self) -> DeployerResult<u64>;

    async fn get_balance(&self, address: Address) -> DeployerResult<U256>;

    /// Transaction count at the latest block, used as the next nonce
    async fn get_transaction_count(&self, address: Address) -> DeployerResult<u64>;

    async fn get_gas_price(&self) -> DeployerResult<U256>;

    async fn estimate_gas(&self, tx: &TypedTransaction) -> DeployerResult<U256>;

    /// Broadcast a signed envelope and return the hash the node reports
    async fn send_raw_transaction(&self, envelope: Bytes) -> DeployerResult<H256>;

    async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> DeployerResult<Option<TransactionReceipt>>;

    async fn get_code(&self, address: Address) -> DeployerResult<Bytes>;
}

/// HTTP JSON-RPC provider for a single endpoint
pub struct ChainProvider {
    url: String,
    http: Provider<Http>,
}

impl ChainProvider {
    /// Create a new chain provider
    pub fn new(url: &str) -> DeployerResult<Self> {
        let http = Provider::<Http>::try_from(url)
            .map_err(|e| DeployerError::Config(format!("Invalid RPC URL {}: {}", url, e)))?
            .interval(Duration::from_millis(100));

        debug!("Created HTTP provider for {}", url);

        Ok(Self {
            url: url.to_string(),
            http,
        })
    }

    /// Endpoint this provider talks to
    pub fn url(&self) -> &str {
        &self.url
    }

    fn connection_error(&self, e: ProviderError) -> DeployerError {
        warn!("RPC call to {} failed: {}", self.url, e);
        DeployerError::Connection(e.to_string())
    }
}

#[async_trait]
impl DeployRpc for ChainProvider {
    async fn block_number(&self) -> DeployerResult<u64> {
        self.http
            .get_block_number()
            .await
            .map(|b| b.as_u64())
            .map_err(|e| self.connection_error(e))
    }

    async fn chain_id(&self) -> DeployerResult<u64> {
        self.http
            .get_chainid()
            .await
            .map(|id| id.as_u64())
            .map_err(|e| self.connection_error(e))
    }

    async fn get_balance(&self, address: Address) -> DeployerResult<U256> {
        self.http
            .get_balance(address, None)
            .await
            .map_err(|e| self.connection_error(e))
    }

    async fn get_transaction_count(&self, address: Address) -> DeployerResult<u64> {
        self.http
            .get_transaction_count(address, None)
            .await
            .map(|n| n.as_u64())
            .map_err(|e| self.connection_error(e))
    }

    async fn get_gas_price(&self) -> DeployerResult<U256> {
        self.http
            .get_gas_price()
            .await
            .map_err(|e| self.connection_error(e))
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> DeployerResult<U256> {
        self.http
            .estimate_gas(tx, None)
            .await
            .map_err(|e| DeployerError::GasEstimation(e.to_string()))
    }

    async fn send_raw_transaction(&self, envelope: Bytes) -> DeployerResult<H256> {
        self.http
            .send_raw_transaction(envelope)
            .await
            .map(|pending| pending.tx_hash())
            .map_err(|e| DeployerError::Submission(e.to_string()))
    }

    async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> DeployerResult<Option<TransactionReceipt>> {
        self.http
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| self.connection_error(e))
    }

    async fn get_code(&self, address: Address) -> DeployerResult<Bytes> {
        self.http
            .get_code(address, None)
            .await
            .map_err(|e| self.connection_error(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_url() {
        let err = ChainProvider::new("not a url").err().unwrap();
        assert!(matches!(err, DeployerError::Config(_)));
    }

    #[test]
    fn test_keeps_endpoint() {
        let provider = ChainProvider::new("http://127.0.0.1:8545").unwrap();
        assert_eq!(provider.url(), "http://127.0.0.1:8545");
    }
}
