pub mod arguments;
pub mod bootstrap;
pub mod config;
pub mod deployer;
pub mod error;
pub mod ledger;
pub mod light_client;
pub mod proof;
pub mod transaction;

pub use error::Error;
use {
    crate::{
        bootstrap::CreationCode,
        config::Config,
        deployer::{DeterministicDeployer, OnchainFactory},
        ledger::Ledger,
        light_client::OnchainLightClient,
        proof::HttpProofSource,
    },
    anyhow::{Context, Result},
    std::sync::Arc,
};

pub async fn run(args: arguments::Arguments) -> Result<()> {
    let signer = args.private_key.clone();
    let config = Config::new(&args, signer.address())?;
    tracing::info!(deployer = ?signer.address(), operator = ?config.operator, "resolved accounts");

    // Fail on broken artifacts and headers before sending anything.
    let code = CreationCode::load(&config.artifacts_dir)?;
    let headers = config
        .header_files
        .iter()
        .map(|path| light_client::read_header_file(path))
        .collect::<Result<Vec<_>, _>>()?;

    let provider = ethrpc::alloy::provider_with_signer(&config.rpc_uri, "bootstrap", signer);
    let deployer = DeterministicDeployer::new(
        Arc::new(OnchainFactory::new(
            config.factory,
            provider.clone(),
            config.receipt_timeout,
        )),
        Arc::new(provider.clone()),
    );
    let ledger = Ledger::new(&config.ledger_path);

    let addresses = bootstrap::deploy(&config, &deployer, &ledger, &code)
        .await
        .with_context(|| format!("deploying light client on {}", config.network))?;

    let client = OnchainLightClient::new(addresses.proxy, provider, config.receipt_timeout);
    bootstrap::update_headers(&client, &headers)
        .await
        .context("updating block headers")?;

    if let Some(verification) = &config.verification {
        let proofs = HttpProofSource::new(reqwest::Client::new(), verification.proof_service.clone());
        let result = bootstrap::verify(&client, &proofs, verification.tx_hash, &verification.rpc)
            .await
            .with_context(|| format!("verifying proof of {}", verification.tx_hash))?;
        if !result.success {
            tracing::warn!(message = %result.message, "light client rejected proof");
        }
    }
    Ok(())
}
