//! Contract Deployer - ships a compiled contract artifact to an EVM chain
//!
//! Reads the artifact, builds a contract-creation transaction, signs it with
//! the supplied key, submits it over JSON-RPC and waits for the receipt.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ethers::types::{Address, H256};
use ethers::utils::format_ether;
use std::path::PathBuf;
use tracing::{error, info, warn};

mod chain;
mod config;
mod deploy;
mod error;
mod inspect;
mod tx;

use chain::ChainProvider;
use config::Settings;
use deploy::Deployer;

#[derive(Parser)]
#[command(name = "contract-deployer", version)]
#[command(about = "Deploy a compiled contract artifact over JSON-RPC", long_about = None)]
struct Cli {
    /// TOML settings file (defaults to $DEPLOYER_CONFIG or ./deployer.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint, overrides the config file
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(flatten)]
    deploy: DeployArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct DeployArgs {
    /// Hex private key of the deploying account, 0x prefix optional
    private_key: Option<String>,

    /// Compiled contract to deploy
    #[arg(long)]
    artifact: Option<PathBuf>,

    /// File receiving the deployed contract address
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write a JSON deployment report here
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the address and balance for a private key
    Balance { private_key: String },
    /// Look up a transaction receipt and the contract it created
    Receipt { tx_hash: H256 },
    /// Check whether code is deployed at an address
    Code { address: Address },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_json);

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(url) = cli.rpc_url {
        settings.rpc_url = url;
    }

    let provider = ChainProvider::new(&settings.rpc_url)?;
    info!("Using RPC endpoint {}", provider.url());

    match cli.command {
        Some(Commands::Balance { private_key }) => {
            let balance = inspect::account_balance(&provider, &private_key).await?;
            println!("Address: {:?}", balance.address);
            println!("Balance: {} ETH", format_ether(balance.balance));
        }
        Some(Commands::Receipt { tx_hash }) => {
            match inspect::deployment_receipt(&provider, tx_hash).await? {
                Some(receipt) => {
                    println!("Status: {}", if receipt.success { "success" } else { "failed" });
                    if let Some(address) = receipt.contract_address {
                        let address = deploy::format_address(&address);
                        println!("Contract address: {}", address);
                        if let Some(url) = settings.explorer_address_url(&address) {
                            println!("Explorer: {}", url);
                        }
                    }
                    if let Some(block) = receipt.block_number {
                        println!("Block number: {}", block);
                    }
                    if let Some(gas_used) = receipt.gas_used {
                        println!("Gas used: {}", gas_used);
                    }
                }
                None => println!("Transaction pending"),
            }
        }
        Some(Commands::Code { address }) => {
            let code = inspect::contract_code(&provider, address).await?;
            println!("Code at {}: {} bytes", deploy::format_address(&code.address), code.code_size);
            println!("Contract exists: {}", code.is_contract());
        }
        None => run_deploy(provider, settings, cli.deploy).await?,
    }

    Ok(())
}

async fn run_deploy(provider: ChainProvider, mut settings: Settings, args: DeployArgs) -> Result<()> {
    if let Some(artifact) = args.artifact {
        settings.artifact_path = artifact;
    }
    if let Some(output) = args.output {
        settings.output_path = output;
    }

    let deployer = Deployer::new(provider, settings);
    let report = match deployer.deploy(args.private_key.as_deref()).await {
        Ok(report) => report,
        Err(e) => {
            error!("Deployment failed: {}", e);
            if e.is_unresolved() {
                warn!("The transaction may still be mined; check it with the receipt command");
            } else if e.is_input_error() {
                warn!("Nothing was sent to the network");
            }
            return Err(e.into());
        }
    };

    if let Some(path) = args.report {
        report
            .write_json(&path)
            .await
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        info!("Deployment report written to {:?}", path);
    }

    println!("{}", report.contract_address_checksummed());
    Ok(())
}

fn init_logging(json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,contract_deployer=debug,hyper=warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
