//! Chain module - JSON-RPC access to the target network
//!
//! This module provides:
//! - The [`DeployRpc`] interface covering every node call the deployer makes
//! - An HTTP implementation backed by an ethers provider
//! - The connectivity check run before anything else

pub mod provider;

pub use provider::{ChainProvider, DeployRpc};

#[cfg(test)]
pub use provider::MockDeployRpc;

use crate::error::DeployerResult;

use tracing::info;

/// Result of the connectivity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainInfo {
    pub chain_id: u64,
    pub block_number: u64,
}

/// Probe the endpoint and fetch its chain id. Fails fast, no retry.
pub async fn connect<R: DeployRpc + ?Sized>(rpc: &R) -> DeployerResult<ChainInfo> {
    let block_number = rpc.block_number().await?;
    let chain_id = rpc.chain_id().await?;

    let info = ChainInfo {
        chain_id,
        block_number,
    };
    info!("Connected to chain {} at block {}", info.chain_id, info.block_number);

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployerError;

    #[tokio::test]
    async fn test_connect_reports_chain() {
        let mut rpc = MockDeployRpc::new();
        rpc.expect_block_number().returning(|| Ok(1_234));
        rpc.expect_chain_id().returning(|| Ok(421614));

        let info = connect(&rpc).await.unwrap();
        assert_eq!(
            info,
            ChainInfo {
                chain_id: 421614,
                block_number: 1_234
            }
        );
    }

    #[tokio::test]
    async fn test_connect_fails_fast_on_dead_endpoint() {
        let mut rpc = MockDeployRpc::new();
        rpc.expect_block_number()
            .times(1)
            .returning(|| Err(DeployerError::Connection("refused".to_string())));
        rpc.expect_chain_id().never();

        let err = connect(&rpc).await.unwrap_err();
        assert!(matches!(err, DeployerError::Connection(_)));
    }
}
