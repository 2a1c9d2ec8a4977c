//! Read-only helpers: account balance, receipt lookup, code check

use crate::chain::DeployRpc;
use crate::error::DeployerResult;
use crate::tx::{DeployAccount, DeployReceipt};

use ethers::types::{Address, H256, U256};
use ethers::utils::format_ether;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    pub address: Address,
    pub balance: U256,
}

/// Balance of the account derived from `private_key`
pub async fn account_balance<R: DeployRpc + ?Sized>(
    rpc: &R,
    private_key: &str,
) -> DeployerResult<AccountBalance> {
    let account = DeployAccount::from_private_key(Some(private_key))?;
    let address = account.address();
    let balance = rpc.get_balance(address).await?;

    info!("Wallet {:?} balance: {} ETH", address, format_ether(balance));
    if balance.is_zero() {
        warn!("No balance - the account cannot pay for a deployment");
    }

    Ok(AccountBalance { address, balance })
}

/// Receipt for `tx_hash`, `None` while the transaction is still pending
pub async fn deployment_receipt<R: DeployRpc + ?Sized>(
    rpc: &R,
    tx_hash: H256,
) -> DeployerResult<Option<DeployReceipt>> {
    let receipt = rpc
        .get_transaction_receipt(tx_hash)
        .await?
        .map(DeployReceipt::from);

    match &receipt {
        Some(r) => info!(
            "Transaction {:?} mined in block {:?}: success={}, contract={:?}, gas used={:?}",
            tx_hash, r.block_number, r.success, r.contract_address, r.gas_used
        ),
        None => info!("Transaction {:?} is pending", tx_hash),
    }

    Ok(receipt)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeInfo {
    pub address: Address,
    pub code_size: usize,
}

impl CodeInfo {
    /// Whether any code is installed at the address
    pub fn is_contract(&self) -> bool {
        self.code_size > 0
    }
}

/// Size of the code deployed at `address`
pub async fn contract_code<R: DeployRpc + ?Sized>(
    rpc: &R,
    address: Address,
) -> DeployerResult<CodeInfo> {
    let code = rpc.get_code(address).await?;
    let info = CodeInfo {
        address,
        code_size: code.len(),
    };

    info!(
        "Code at {:?}: {} bytes (contract exists: {})",
        address,
        info.code_size,
        info.is_contract()
    );
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockDeployRpc;
    use crate::error::DeployerError;
    use ethers::types::{Bytes, TransactionReceipt, U64};
    use mockall::predicate::eq;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn test_balance_of_derived_account() {
        let expected: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        let mut rpc = MockDeployRpc::new();
        rpc.expect_get_balance()
            .with(eq(expected))
            .returning(|_| Ok(U256::exp10(18)));

        let result = account_balance(&rpc, KEY).await.unwrap();
        assert_eq!(result.address, expected);
        assert_eq!(result.balance, U256::exp10(18));
    }

    #[tokio::test]
    async fn test_balance_rejects_bad_key() {
        let rpc = MockDeployRpc::new();
        let err = account_balance(&rpc, "zz").await.unwrap_err();
        assert!(matches!(err, DeployerError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_pending_receipt() {
        let mut rpc = MockDeployRpc::new();
        rpc.expect_get_transaction_receipt().returning(|_| Ok(None));

        let receipt = deployment_receipt(&rpc, H256::repeat_byte(1)).await.unwrap();
        assert!(receipt.is_none());
    }

    #[tokio::test]
    async fn test_mined_receipt() {
        let mut rpc = MockDeployRpc::new();
        rpc.expect_get_transaction_receipt().returning(|hash| {
            Ok(Some(TransactionReceipt {
                transaction_hash: hash,
                status: Some(U64::from(1)),
                contract_address: Some(Address::repeat_byte(7)),
                ..Default::default()
            }))
        });

        let receipt = deployment_receipt(&rpc, H256::repeat_byte(1))
            .await
            .unwrap()
            .unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.contract_address, Some(Address::repeat_byte(7)));
    }

    #[tokio::test]
    async fn test_code_check() {
        let mut rpc = MockDeployRpc::new();
        rpc.expect_get_code()
            .with(eq(Address::repeat_byte(1)))
            .returning(|_| Ok(Bytes::from_static(b"\x00asm")));
        rpc.expect_get_code()
            .with(eq(Address::repeat_byte(2)))
            .returning(|_| Ok(Bytes::new()));

        assert!(contract_code(&rpc, Address::repeat_byte(1))
            .await
            .unwrap()
            .is_contract());
        assert!(!contract_code(&rpc, Address::repeat_byte(2))
            .await
            .unwrap()
            .is_contract());
    }
}
