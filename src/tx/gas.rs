//! Fee and gas limit policy for deployment transactions

use crate::chain::DeployRpc;
use crate::config::GasConfig;
use crate::error::DeployerResult;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::U256;
use serde::Serialize;
use tracing::{debug, warn};

/// EIP-1559 fee fields for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

/// Where the applied gas limit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum GasLimitSource {
    /// Network estimate, before the safety margin was added
    Estimated { estimate: U256 },
    /// Estimation failed and the configured ceiling was kept
    Default,
}

/// Gas estimator for deployment transactions
pub struct GasEstimator {
    default_gas_limit: U256,
    /// Buffer for gas limit as a percentage of the estimate (120 = 20% buffer)
    gas_limit_multiplier_percent: u64,
    max_fee_multiplier: u64,
    max_priority_fee: U256,
    strict: bool,
}

impl GasEstimator {
    /// Create a gas estimator from configuration
    pub fn new(config: &GasConfig) -> Self {
        Self {
            default_gas_limit: U256::from(config.default_gas_limit),
            gas_limit_multiplier_percent: config.gas_limit_multiplier_percent,
            max_fee_multiplier: config.max_fee_multiplier,
            max_priority_fee: U256::from(config.max_priority_fee_wei),
            strict: config.strict_gas_estimation,
        }
    }

    /// Gas limit used before estimation and on fallback
    pub fn default_gas_limit(&self) -> U256 {
        self.default_gas_limit
    }

    /// Fee fields derived from the network gas price
    pub async fn quote_fees<R: DeployRpc + ?Sized>(&self, rpc: &R) -> DeployerResult<FeeQuote> {
        let gas_price = rpc.get_gas_price().await?;
        let quote = self.fees_from_gas_price(gas_price);

        debug!("Gas price {} -> {:?}", gas_price, quote);
        Ok(quote)
    }

    /// Static heuristic: max fee is a multiple of the observed price, tip is fixed
    pub fn fees_from_gas_price(&self, gas_price: U256) -> FeeQuote {
        let quote = FeeQuote {
            max_fee_per_gas: gas_price.saturating_mul(U256::from(self.max_fee_multiplier)),
            max_priority_fee_per_gas: self.max_priority_fee,
        };

        if quote.max_priority_fee_per_gas > quote.max_fee_per_gas {
            warn!(
                "Priority fee {} exceeds max fee {}; the node may reject the transaction",
                quote.max_priority_fee_per_gas, quote.max_fee_per_gas
            );
        }

        quote
    }

    /// Add the safety margin to an estimate, rounding up
    pub fn apply_margin(&self, estimate: U256) -> U256 {
        let scaled = estimate.saturating_mul(U256::from(self.gas_limit_multiplier_percent));
        let (quotient, remainder) = scaled.div_mod(U256::from(100));
        if remainder.is_zero() {
            quotient
        } else {
            quotient + 1
        }
    }

    /// Ask the node for an estimate and derive the gas limit to apply.
    ///
    /// A failed estimate keeps the default ceiling unless strict estimation
    /// is configured. The returned source tells the caller which happened.
    pub async fn estimate_gas_limit<R: DeployRpc + ?Sized>(
        &self,
        rpc: &R,
        tx: &TypedTransaction,
    ) -> DeployerResult<(U256, GasLimitSource)> {
        match rpc.estimate_gas(tx).await {
            Ok(estimate) => {
                let limit = self.apply_margin(estimate);
                debug!("Estimated gas {} -> limit {}", estimate, limit);
                Ok((limit, GasLimitSource::Estimated { estimate }))
            }
            Err(e) if self.strict => Err(e),
            Err(e) => {
                warn!(
                    "Gas estimation failed: {}; using default gas limit {}",
                    e, self.default_gas_limit
                );
                Ok((self.default_gas_limit, GasLimitSource::Default))
            }
        }
    }

    /// Calculate worst-case cost in wei
    pub fn calculate_cost(gas_limit: U256, fees: &FeeQuote) -> U256 {
        gas_limit.saturating_mul(fees.max_fee_per_gas)
    }
}

impl Default for GasEstimator {
    fn default() -> Self {
        Self::new(&GasConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockDeployRpc;
    use crate::error::DeployerError;

    #[test]
    fn test_margin_rounds_up() {
        let estimator = GasEstimator::default();
        assert_eq!(estimator.apply_margin(U256::from(21_000)), U256::from(25_200));
        // 7 * 1.2 = 8.4
        assert_eq!(estimator.apply_margin(U256::from(7)), U256::from(9));
        assert_eq!(estimator.apply_margin(U256::from(10)), U256::from(12));
        assert_eq!(estimator.apply_margin(U256::zero()), U256::zero());
    }

    #[test]
    fn test_fee_heuristic() {
        let estimator = GasEstimator::default();
        let quote = estimator.fees_from_gas_price(U256::from(150_000_000u64));
        assert_eq!(quote.max_fee_per_gas, U256::from(300_000_000u64));
        assert_eq!(quote.max_priority_fee_per_gas, U256::from(100_000_000u64));
    }

    #[tokio::test]
    async fn test_estimate_success_applies_margin() {
        let mut rpc = MockDeployRpc::new();
        rpc.expect_estimate_gas()
            .returning(|_| Ok(U256::from(1_000_000)));

        let estimator = GasEstimator::default();
        let (limit, source) = estimator
            .estimate_gas_limit(&rpc, &TypedTransaction::default())
            .await
            .unwrap();

        assert_eq!(limit, U256::from(1_200_000));
        assert_eq!(
            source,
            GasLimitSource::Estimated {
                estimate: U256::from(1_000_000)
            }
        );
    }

    #[tokio::test]
    async fn test_estimate_failure_keeps_default() {
        let mut rpc = MockDeployRpc::new();
        rpc.expect_estimate_gas()
            .returning(|_| Err(DeployerError::GasEstimation("execution reverted".to_string())));

        let estimator = GasEstimator::default();
        let (limit, source) = estimator
            .estimate_gas_limit(&rpc, &TypedTransaction::default())
            .await
            .unwrap();

        assert_eq!(limit, U256::from(10_000_000));
        assert_eq!(source, GasLimitSource::Default);
    }

    #[tokio::test]
    async fn test_strict_estimation_fails() {
        let mut rpc = MockDeployRpc::new();
        rpc.expect_estimate_gas()
            .returning(|_| Err(DeployerError::GasEstimation("execution reverted".to_string())));

        let estimator = GasEstimator::new(&GasConfig {
            strict_gas_estimation: true,
            ..GasConfig::default()
        });
        let err = estimator
            .estimate_gas_limit(&rpc, &TypedTransaction::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployerError::GasEstimation(_)));
    }

    #[test]
    fn test_calculate_cost() {
        let fees = FeeQuote {
            max_fee_per_gas: U256::from(2),
            max_priority_fee_per_gas: U256::from(1),
        };
        assert_eq!(
            GasEstimator::calculate_cost(U256::from(25_200), &fees),
            U256::from(50_400)
        );
    }
}
