//! Deployment transaction lifecycle: build, estimate, sign, submit, confirm

mod gas;
mod request;
mod sender;
mod signer;

pub use gas::{GasEstimator, GasLimitSource};
pub use request::DeploymentRequest;
pub use sender::{DeployReceipt, TransactionSender};
pub use signer::DeployAccount;
