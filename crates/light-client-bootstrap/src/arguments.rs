use {
    alloy::{
        primitives::{Address, TxHash},
        signers::local::PrivateKeySigner,
    },
    std::{path::PathBuf, time::Duration},
    tracing::level_filters::LevelFilter,
    url::Url,
};

#[derive(clap::Parser)]
#[group(skip)]
pub struct LoggingArguments {
    #[clap(
        long,
        env,
        default_value = "warn,light_client_bootstrap=debug,ethrpc=debug"
    )]
    pub log_filter: String,

    #[clap(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    /// Output log events as JSON.
    #[clap(long, env, default_value = "false")]
    pub use_json_logs: bool,
}

#[derive(clap::Parser)]
#[clap(version, about = "Deploys and bootstraps the light client")]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    /// The Ethereum node URL to connect to.
    #[clap(long, env, default_value = "http://localhost:8545")]
    pub node_url: Url,

    /// Id of the chain the light client follows. Passed to the light client
    /// on initialization.
    #[clap(long, env)]
    pub chain_id: u64,

    /// Key of the account paying for the deployments.
    #[clap(long, env)]
    pub private_key: PrivateKeySigner,

    /// Account allowed to operate the light client. Defaults to the deploying
    /// account.
    #[clap(long, env)]
    pub operator: Option<Address>,

    /// Key under which the deployed addresses are recorded in the ledger.
    #[clap(long, env, default_value = "testnet")]
    pub network: String,

    /// File recording the deployed addresses per network.
    #[clap(long, env, default_value = "deployments/mos.json")]
    pub ledger_path: PathBuf,

    /// Directory containing the compiled contract artifacts.
    #[clap(long, env, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,

    /// Address of the deploy factory.
    #[clap(long, env, default_value_t = contracts::alloy::DEPLOY_FACTORY)]
    pub factory: Address,

    /// Salt of the proof verifier deployment. Change it to deploy a new
    /// version.
    #[clap(long, env, default_value = "MPTVerify-v1")]
    pub mpt_salt: String,

    /// Salt of the light client implementation deployment.
    #[clap(long, env, default_value = "LightNode-v1")]
    pub impl_salt: String,

    /// Salt of the light client proxy deployment.
    #[clap(long, env, default_value = "LightNodeProxy-v1")]
    pub proxy_salt: String,

    /// How long to wait for a transaction receipt before giving up.
    #[clap(
        long,
        env,
        default_value = "5m",
        value_parser = humantime::parse_duration,
    )]
    pub receipt_timeout: Duration,

    /// File containing a hex encoded block header to submit to the light
    /// client. Can be repeated, headers are submitted in the given order.
    #[clap(long = "header-file")]
    pub header_files: Vec<PathBuf>,

    /// Transaction whose receipt proof is verified against the light client
    /// after the deployment.
    #[clap(long, env, requires_all = ["proof_rpc_url", "proof_service_url"])]
    pub verify_tx_hash: Option<TxHash>,

    /// Node of the chain the verified transaction was included in.
    #[clap(long, env)]
    pub proof_rpc_url: Option<Url>,

    /// Service building receipt proofs.
    #[clap(long, env)]
    pub proof_service_url: Option<Url>,
}

impl std::fmt::Display for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            logging,
            node_url,
            chain_id,
            private_key,
            operator,
            network,
            ledger_path,
            artifacts_dir,
            factory,
            mpt_salt,
            impl_salt,
            proxy_salt,
            receipt_timeout,
            header_files,
            verify_tx_hash,
            proof_rpc_url,
            proof_service_url,
        } = self;

        writeln!(f, "log_filter: {}", logging.log_filter)?;
        writeln!(f, "log_stderr_threshold: {}", logging.log_stderr_threshold)?;
        writeln!(f, "use_json_logs: {}", logging.use_json_logs)?;
        writeln!(f, "node_url: {node_url}")?;
        writeln!(f, "chain_id: {chain_id}")?;
        writeln!(f, "private_key: SECRET ({:?})", private_key.address())?;
        writeln!(f, "operator: {operator:?}")?;
        writeln!(f, "network: {network}")?;
        writeln!(f, "ledger_path: {}", ledger_path.display())?;
        writeln!(f, "artifacts_dir: {}", artifacts_dir.display())?;
        writeln!(f, "factory: {factory:?}")?;
        writeln!(f, "mpt_salt: {mpt_salt}")?;
        writeln!(f, "impl_salt: {impl_salt}")?;
        writeln!(f, "proxy_salt: {proxy_salt}")?;
        writeln!(f, "receipt_timeout: {receipt_timeout:?}")?;
        writeln!(f, "header_files: {header_files:?}")?;
        writeln!(f, "verify_tx_hash: {verify_tx_hash:?}")?;
        writeln!(f, "proof_rpc_url: {proof_rpc_url:?}")?;
        writeln!(f, "proof_service_url: {proof_service_url:?}")?;
        Ok(())
    }
}
