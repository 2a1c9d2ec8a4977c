//! Summary of a completed deployment

use super::artifact::format_address;
use crate::error::{DeployerError, DeployerResult};
use crate::tx::GasLimitSource;

use chrono::{DateTime, Utc};
use ethers::types::{Address, H256, U256};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentReport {
    pub chain_id: u64,
    pub deployer: Address,
    pub contract_address: Address,
    pub transaction_hash: H256,
    pub nonce: u64,
    pub gas_limit: U256,
    pub gas_limit_source: GasLimitSource,
    pub gas_used: Option<U256>,
    pub block_number: Option<u64>,
    pub deployed_at: DateTime<Utc>,
}

impl DeploymentReport {
    /// Whether the applied gas limit is the fallback ceiling rather than an estimate
    pub fn used_default_gas_limit(&self) -> bool {
        self.gas_limit_source == GasLimitSource::Default
    }

    pub fn contract_address_checksummed(&self) -> String {
        format_address(&self.contract_address)
    }

    /// Write the report as pretty JSON
    pub async fn write_json(&self, path: &Path) -> DeployerResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DeployerError::Output {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            })?;

        tokio::fs::write(path, json)
            .await
            .map_err(|source| DeployerError::Output {
                path: path.to_path_buf(),
                source,
            })
    }
}
