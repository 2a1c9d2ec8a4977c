//! Error types for the contract deployer

use ethers::types::{Address, H256};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the deployer
#[derive(Error, Debug)]
pub enum DeployerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Private key not provided")]
    MissingKey,

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Failed to read artifact {path:?}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact {path:?} is empty")]
    EmptyArtifact { path: PathBuf },

    #[error("Deployment payload is empty")]
    EmptyPayload,

    #[error("RPC connection error: {0}")]
    Connection(String),

    #[error("Insufficient balance: account {address:?} has no funds")]
    InsufficientBalance { address: Address },

    #[error("Gas estimation error: {0}")]
    GasEstimation(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Transaction submission rejected: {0}")]
    Submission(String),

    #[error("Timeout after {secs}s waiting for receipt of {tx_hash:?}")]
    Timeout { tx_hash: H256, secs: u64 },

    #[error("Deployment transaction {tx_hash:?} reverted")]
    Reverted { tx_hash: H256 },

    #[error("Receipt for {tx_hash:?} carries no contract address")]
    MissingContractAddress { tx_hash: H256 },

    #[error("Failed to write {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeployerError {
    /// Whether the transaction may still land on chain after this error
    pub fn is_unresolved(&self) -> bool {
        matches!(self, DeployerError::Timeout { .. })
    }

    /// Whether the error happened before anything was broadcast
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            DeployerError::Config(_)
                | DeployerError::MissingKey
                | DeployerError::InvalidKey(_)
                | DeployerError::Artifact { .. }
                | DeployerError::EmptyArtifact { .. }
                | DeployerError::EmptyPayload
        )
    }
}

/// Result type for deployer operations
pub type DeployerResult<T> = Result<T, DeployerError>;
