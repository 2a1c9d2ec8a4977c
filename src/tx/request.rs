//! Contract-creation transaction requests

use super::gas::FeeQuote;
use crate::error::{DeployerError, DeployerResult};

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Eip1559TransactionRequest, U256};
use ethers::utils::get_contract_address;

/// Everything needed to sign a contract deployment.
///
/// There is no destination: an absent `to` gives contract-creation semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub from: Address,
    pub payload: Bytes,
    pub nonce: u64,
    pub gas_limit: U256,
    pub fees: FeeQuote,
    pub chain_id: u64,
}

impl DeploymentRequest {
    /// Build a request; the payload must not be empty
    pub fn new(
        from: Address,
        payload: Bytes,
        nonce: u64,
        gas_limit: U256,
        fees: FeeQuote,
        chain_id: u64,
    ) -> DeployerResult<Self> {
        if payload.is_empty() {
            return Err(DeployerError::EmptyPayload);
        }

        Ok(Self {
            from,
            payload,
            nonce,
            gas_limit,
            fees,
            chain_id,
        })
    }

    /// Replace the gas limit, e.g. after estimation
    pub fn with_gas_limit(mut self, gas_limit: U256) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Address the contract will be created at (CREATE: sender + nonce)
    pub fn predicted_address(&self) -> Address {
        get_contract_address(self.from, self.nonce)
    }

    /// EIP-1559 transaction with no recipient
    pub fn to_typed_transaction(&self) -> TypedTransaction {
        let tx = Eip1559TransactionRequest::new()
            .from(self.from)
            .data(self.payload.clone())
            .nonce(self.nonce)
            .gas(self.gas_limit)
            .max_fee_per_gas(self.fees.max_fee_per_gas)
            .max_priority_fee_per_gas(self.fees.max_priority_fee_per_gas)
            .chain_id(self.chain_id);

        TypedTransaction::Eip1559(tx)
    }
}
