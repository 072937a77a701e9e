use {
    crate::arguments::Arguments,
    alloy::primitives::{Address, TxHash},
    anyhow::{Context, Result},
    std::{path::PathBuf, time::Duration},
    url::Url,
};

/// Everything a bootstrap run needs, resolved from the command line once at
/// startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Id of the chain the light client follows.
    pub chain_id: u64,
    pub rpc_uri: Url,
    pub operator: Address,
    pub network: String,
    pub ledger_path: PathBuf,
    pub artifacts_dir: PathBuf,
    pub factory: Address,
    pub salts: Salts,
    pub receipt_timeout: Duration,
    pub header_files: Vec<PathBuf>,
    pub verification: Option<Verification>,
}

#[derive(Debug, Clone)]
pub struct Salts {
    pub mpt_verify: String,
    pub light_node: String,
    pub light_node_proxy: String,
}

/// A transaction whose receipt proof gets checked once the light client is
/// deployed.
#[derive(Debug, Clone)]
pub struct Verification {
    pub tx_hash: TxHash,
    /// Node of the chain the transaction was included in.
    pub rpc: Url,
    pub proof_service: Url,
}

impl Config {
    /// `deployer` is the operator unless one is configured explicitly.
    pub fn new(args: &Arguments, deployer: Address) -> Result<Self> {
        let verification = args
            .verify_tx_hash
            .map(|tx_hash| -> Result<_> {
                Ok(Verification {
                    tx_hash,
                    rpc: args
                        .proof_rpc_url
                        .clone()
                        .context("verifying a proof needs --proof-rpc-url")?,
                    proof_service: args
                        .proof_service_url
                        .clone()
                        .context("verifying a proof needs --proof-service-url")?,
                })
            })
            .transpose()?;

        Ok(Self {
            chain_id: args.chain_id,
            rpc_uri: args.node_url.clone(),
            operator: args.operator.unwrap_or(deployer),
            network: args.network.clone(),
            ledger_path: args.ledger_path.clone(),
            artifacts_dir: args.artifacts_dir.clone(),
            factory: args.factory,
            salts: Salts {
                mpt_verify: args.mpt_salt.clone(),
                light_node: args.impl_salt.clone(),
                light_node_proxy: args.proxy_salt.clone(),
            },
            receipt_timeout: args.receipt_timeout,
            header_files: args.header_files.clone(),
            verification,
        })
    }
}
