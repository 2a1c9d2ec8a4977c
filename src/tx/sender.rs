//! Transaction submission and receipt polling

use super::signer::SignedEnvelope;
use crate::chain::DeployRpc;
use crate::config::ConfirmationConfig;
use crate::error::{DeployerError, DeployerResult};

use ethers::types::{Address, TransactionReceipt, H256, U256};
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Outcome of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReceipt {
    pub success: bool,
    pub contract_address: Option<Address>,
    pub transaction_hash: H256,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
}

impl From<TransactionReceipt> for DeployReceipt {
    fn from(receipt: TransactionReceipt) -> Self {
        Self {
            success: receipt.status.map(|s| s.as_u64()) == Some(1),
            contract_address: receipt.contract_address,
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|b| b.as_u64()),
            gas_used: receipt.gas_used,
        }
    }
}

/// Broadcasts a signed envelope and waits for it to be mined
pub struct TransactionSender {
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl TransactionSender {
    pub fn new(config: &ConfirmationConfig) -> Self {
        Self {
            confirmation_timeout: config.timeout(),
            poll_interval: config.poll_interval(),
        }
    }

    /// Send the envelope once. Rejection is terminal; nothing is retried.
    pub async fn submit<R: DeployRpc + ?Sized>(
        &self,
        rpc: &R,
        envelope: SignedEnvelope,
    ) -> DeployerResult<H256> {
        let expected = envelope.tx_hash();
        debug!("Submitting {} byte envelope {:?}", envelope.raw().len(), expected);
        let tx_hash = rpc.send_raw_transaction(envelope.into_raw()).await?;

        if tx_hash != expected {
            warn!(
                "Node reported hash {:?}, locally computed {:?}",
                tx_hash, expected
            );
        }

        info!("Transaction sent: {:?}", tx_hash);
        Ok(tx_hash)
    }

    /// Poll for the receipt until it appears or the confirmation timeout elapses
    pub async fn wait_for_receipt<R: DeployRpc + ?Sized>(
        &self,
        rpc: &R,
        tx_hash: H256,
    ) -> DeployerResult<DeployReceipt> {
        info!(
            "Waiting up to {}s for confirmation of {:?}",
            self.confirmation_timeout.as_secs(),
            tx_hash
        );

        match timeout(self.confirmation_timeout, self.poll_receipt(rpc, tx_hash)).await {
            Ok(result) => result,
            Err(_) => Err(DeployerError::Timeout {
                tx_hash,
                secs: self.confirmation_timeout.as_secs(),
            }),
        }
    }

    async fn poll_receipt<R: DeployRpc + ?Sized>(
        &self,
        rpc: &R,
        tx_hash: H256,
    ) -> DeployerResult<DeployReceipt> {
        let mut polls: u64 = 0;
        loop {
            if let Some(receipt) = rpc.get_transaction_receipt(tx_hash).await? {
                let receipt = DeployReceipt::from(receipt);
                debug!(
                    "Receipt for {:?} after {} polls: success={}",
                    tx_hash, polls, receipt.success
                );
                return Ok(receipt);
            }

            polls += 1;
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl Default for TransactionSender {
    fn default() -> Self {
        Self::new(&ConfirmationConfig::default())
    }
}
