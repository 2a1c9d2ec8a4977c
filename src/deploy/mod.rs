//! Deployment pipeline
//!
//! Runs the stages in order and stops at the first failure:
//! connectivity, account, balance, artifact, build, estimate, sign,
//! submit/confirm. Only a failed gas estimate is tolerated (unless strict).

pub mod artifact;
pub mod report;

pub use artifact::{format_address, load_artifact, write_address};
pub use report::DeploymentReport;

use crate::chain::{self, DeployRpc};
use crate::config::Settings;
use crate::error::{DeployerError, DeployerResult};
use crate::tx::{DeployAccount, DeploymentRequest, GasEstimator, TransactionSender};

use chrono::Utc;
use ethers::utils::format_ether;
use tracing::{info, warn};

/// Drives a single contract deployment against a [`DeployRpc`]
pub struct Deployer<R> {
    rpc: R,
    settings: Settings,
    gas_estimator: GasEstimator,
    sender: TransactionSender,
}

impl<R: DeployRpc> Deployer<R> {
    pub fn new(rpc: R, settings: Settings) -> Self {
        let gas_estimator = GasEstimator::new(&settings.gas);
        let sender = TransactionSender::new(&settings.confirmation);

        Self {
            rpc,
            settings,
            gas_estimator,
            sender,
        }
    }

    /// Deploy the configured artifact with the given private key.
    ///
    /// The address file is written only for a successful receipt.
    pub async fn deploy(&self, private_key: Option<&str>) -> DeployerResult<DeploymentReport> {
        // Connectivity
        let chain = chain::connect(&self.rpc).await?;

        // Account derivation
        let account = DeployAccount::from_private_key(private_key)?;
        let deployer = account.address();
        info!("Deploying from: {:?}", deployer);

        // Balance
        let balance = self.rpc.get_balance(deployer).await?;
        info!("Balance: {} ETH", format_ether(balance));
        if balance.is_zero() {
            return Err(DeployerError::InsufficientBalance { address: deployer });
        }

        // Artifact
        let payload = load_artifact(&self.settings.artifact_path).await?;

        // Build
        let nonce = self.rpc.get_transaction_count(deployer).await?;
        let fees = self.gas_estimator.quote_fees(&self.rpc).await?;
        let request = DeploymentRequest::new(
            deployer,
            payload,
            nonce,
            self.gas_estimator.default_gas_limit(),
            fees,
            chain.chain_id,
        )?;

        // Estimate
        let (gas_limit, gas_limit_source) = self
            .gas_estimator
            .estimate_gas_limit(&self.rpc, &request.to_typed_transaction())
            .await?;
        let request = request.with_gas_limit(gas_limit);

        info!(
            "Prepared deployment: nonce {}, gas limit {} ({:?}), max cost {} ETH",
            nonce,
            gas_limit,
            gas_limit_source,
            format_ether(GasEstimator::calculate_cost(gas_limit, &request.fees))
        );
        info!("Expected contract address: {:?}", request.predicted_address());

        // Sign
        let envelope = account.sign(&request)?;

        // Submit and confirm
        let tx_hash = self.sender.submit(&self.rpc, envelope).await?;
        let receipt = self.sender.wait_for_receipt(&self.rpc, tx_hash).await?;

        if !receipt.success {
            return Err(DeployerError::Reverted { tx_hash });
        }
        let contract_address = receipt
            .contract_address
            .ok_or(DeployerError::MissingContractAddress { tx_hash })?;

        write_address(&self.settings.output_path, &contract_address).await?;

        let report = DeploymentReport {
            chain_id: chain.chain_id,
            deployer,
            contract_address,
            transaction_hash: tx_hash,
            nonce,
            gas_limit,
            gas_limit_source,
            gas_used: receipt.gas_used,
            block_number: receipt.block_number,
            deployed_at: Utc::now(),
        };

        info!(
            "Contract deployed successfully at {}",
            report.contract_address_checksummed()
        );
        if let Some(url) = self
            .settings
            .explorer_address_url(&report.contract_address_checksummed())
        {
            info!("View on explorer: {}", url);
        }
        if report.used_default_gas_limit() {
            warn!("Deployment used the default gas limit because estimation failed");
        }

        Ok(report)
    }
}
