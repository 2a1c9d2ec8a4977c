//! Account derivation and transaction signing

use super::request::DeploymentRequest;
use crate::error::{DeployerError, DeployerResult};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, H256};
use tracing::debug;

/// Add the `0x` prefix to a hex private key unless it is already there
pub fn normalize_private_key(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        format!("0x{}", &trimmed[2..])
    } else {
        format!("0x{}", trimmed)
    }
}

/// Signed transaction bytes ready for broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    raw: Bytes,
    tx_hash: H256,
}

impl SignedEnvelope {
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Hash of the signed transaction
    pub fn tx_hash(&self) -> H256 {
        self.tx_hash
    }

    pub fn into_raw(self) -> Bytes {
        self.raw
    }

    #[cfg(test)]
    pub(crate) fn for_tests(raw: Bytes, tx_hash: H256) -> Self {
        Self { raw, tx_hash }
    }
}

/// Signing identity derived from a raw private key
#[derive(Debug, Clone)]
pub struct DeployAccount {
    wallet: LocalWallet,
}

impl DeployAccount {
    /// Derive an account from a hex private key, prefix optional
    pub fn from_private_key(raw: Option<&str>) -> DeployerResult<Self> {
        let raw = raw
            .filter(|k| !k.trim().is_empty())
            .ok_or(DeployerError::MissingKey)?;
        let normalized = normalize_private_key(raw);

        let bytes = hex::decode(&normalized[2..])
            .map_err(|e| DeployerError::InvalidKey(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(DeployerError::InvalidKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let wallet = LocalWallet::from_bytes(&bytes)
            .map_err(|e| DeployerError::InvalidKey(e.to_string()))?;

        debug!("Derived deployer account {:?}", wallet.address());
        Ok(Self { wallet })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Sign the request. The same request and key always yield the same envelope.
    pub fn sign(&self, request: &DeploymentRequest) -> DeployerResult<SignedEnvelope> {
        let wallet = self.wallet.clone().with_chain_id(request.chain_id);
        let tx = request.to_typed_transaction();

        let signature = wallet
            .sign_transaction_sync(&tx)
            .map_err(|e| DeployerError::Signing(e.to_string()))?;

        Ok(SignedEnvelope {
            raw: tx.rlp_signed(&signature),
            tx_hash: tx.hash(&signature),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::gas::FeeQuote;
    use ethers::types::U256;
    use ethers::utils::keccak256;

    // Well-known anvil development key
    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_normalize_adds_prefix_once() {
        assert_eq!(normalize_private_key(KEY), format!("0x{}", KEY));
        assert_eq!(
            normalize_private_key(&format!("0x{}", KEY)),
            format!("0x{}", KEY)
        );
        assert_eq!(
            normalize_private_key(&format!("  0X{}\n", KEY)),
            format!("0x{}", KEY)
        );
        assert_eq!(normalize_private_key(KEY).matches("0x").count(), 1);
    }

    #[test]
    fn test_prefix_does_not_change_account() {
        let bare = DeployAccount::from_private_key(Some(KEY)).unwrap();
        let prefixed = DeployAccount::from_private_key(Some(&format!("0x{}", KEY))).unwrap();

        let expected: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        assert_eq!(bare.address(), expected);
        assert_eq!(prefixed.address(), expected);
    }

    #[test]
    fn test_missing_key() {
        assert!(matches!(
            DeployAccount::from_private_key(None),
            Err(DeployerError::MissingKey)
        ));
        assert!(matches!(
            DeployAccount::from_private_key(Some("   ")),
            Err(DeployerError::MissingKey)
        ));
    }

    #[test]
    fn test_malformed_key() {
        assert!(matches!(
            DeployAccount::from_private_key(Some("0xnothex")),
            Err(DeployerError::InvalidKey(_))
        ));
        assert!(matches!(
            DeployAccount::from_private_key(Some("0x1234")),
            Err(DeployerError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let account = DeployAccount::from_private_key(Some(KEY)).unwrap();
        let request = DeploymentRequest::new(
            account.address(),
            Bytes::from_static(b"\x00asm"),
            0,
            U256::from(25_200),
            FeeQuote {
                max_fee_per_gas: U256::from(200_000_000u64),
                max_priority_fee_per_gas: U256::from(100_000_000u64),
            },
            421614,
        )
        .unwrap();

        let first = account.sign(&request).unwrap();
        let second = account.sign(&request).unwrap();
        assert_eq!(first, second);

        // EIP-1559 envelope type byte
        assert_eq!(first.raw()[0], 0x02);
        assert_eq!(H256::from(keccak256(first.raw())), first.tx_hash());
    }
}
