//! Artifact input and deployed-address output

use crate::error::{DeployerError, DeployerResult};

use ethers::types::{Address, Bytes};
use ethers::utils::to_checksum;
use std::path::Path;
use tracing::info;

/// Read the compiled contract payload; an empty file is an input error
pub async fn load_artifact(path: &Path) -> DeployerResult<Bytes> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| DeployerError::Artifact {
            path: path.to_path_buf(),
            source,
        })?;

    if bytes.is_empty() {
        return Err(DeployerError::EmptyArtifact {
            path: path.to_path_buf(),
        });
    }

    info!("Loaded artifact {:?} ({} bytes)", path, bytes.len());
    Ok(Bytes::from(bytes))
}

/// Checksummed address as written to the output file
pub fn format_address(address: &Address) -> String {
    to_checksum(address, None)
}

/// Write the contract address as plain text, nothing else
pub async fn write_address(path: &Path, address: &Address) -> DeployerResult<()> {
    let output_error = |source| DeployerError::Output {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(output_error)?;
    }

    tokio::fs::write(path, format_address(address))
        .await
        .map_err(output_error)?;

    info!("Saved contract address to {:?}", path);
    Ok(())
}
