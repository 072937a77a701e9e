//! The bootstrap sequence: deploy the proof verifier, the light client
//! implementation and its proxy, feed headers to the light client and check a
//! receipt proof against it. Every step depends on the result of the previous
//! one so they run strictly in order.

use {
    crate::{
        config::{Config, Salts},
        deployer::DeterministicDeployer,
        error::Error,
        ledger::{Deployments, Ledger, Slot},
        light_client::{LightClient, ProofVerification},
        proof::ProofSource,
        transaction::TxOutcome,
    },
    alloy::{
        primitives::{Address, Bytes, TxHash, U256},
        sol_types::{SolCall, SolConstructor},
    },
    contracts::alloy::{LightNode, LightNodeProxy, artifacts},
    std::path::Path,
    url::Url,
};

/// Creation bytecode of the contracts making up the light client.
#[derive(Debug, Clone)]
pub struct CreationCode {
    pub mpt_verify: Bytes,
    pub light_node: Bytes,
    pub light_node_proxy: Bytes,
}

impl CreationCode {
    pub fn load(dir: &Path) -> Result<Self, Error> {
        let load = |name: &str| {
            contracts::artifact::creation_code(dir, name).map_err(|source| Error::Artifact {
                name: name.to_string(),
                source,
            })
        };
        Ok(Self {
            mpt_verify: load(artifacts::MPT_VERIFY)?,
            light_node: load(artifacts::LIGHT_NODE)?,
            light_node_proxy: load(artifacts::LIGHT_NODE_PROXY)?,
        })
    }
}

/// Addresses of a fully deployed light client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightClientAddresses {
    pub mpt_verify: Address,
    pub implementation: Address,
    pub proxy: Address,
}

/// Calldata the proxy delegates to the implementation on construction.
pub fn initialize_calldata(chain_id: u64, operator: Address, mpt_verify: Address) -> Bytes {
    LightNode::initializeCall {
        chainId: U256::from(chain_id),
        controller: operator,
        mptVerify: mpt_verify,
    }
    .abi_encode()
    .into()
}

/// ABI encoded constructor arguments of the proxy.
pub fn proxy_constructor_params(implementation: Address, init_data: Bytes) -> Bytes {
    LightNodeProxy::constructorCall {
        logic: implementation,
        data: init_data,
    }
    .abi_encode()
    .into()
}

/// Deploys whatever part of the light client is missing on the configured
/// network and records every address in the ledger as soon as it is known.
pub async fn deploy(
    config: &Config,
    deployer: &DeterministicDeployer,
    ledger: &Ledger,
    code: &CreationCode,
) -> Result<LightClientAddresses, Error> {
    let mut deployments = ledger.load(&config.network)?;
    let mut step = Step {
        deployer,
        ledger,
        deployments: &mut deployments,
        network: &config.network,
    };
    let Salts {
        mpt_verify: mpt_salt,
        light_node: impl_salt,
        light_node_proxy: proxy_salt,
    } = &config.salts;

    let (mpt_verify, _) = step
        .run(Slot::Oracle, mpt_salt, &code.mpt_verify, &[])
        .await?;
    let (implementation, implementation_redeployed) = step
        .run(Slot::Implementation, impl_salt, &code.light_node, &[])
        .await?;

    let init_data = initialize_calldata(config.chain_id, config.operator, mpt_verify);
    let params = proxy_constructor_params(implementation, init_data);
    let (proxy, proxy_redeployed) = step
        .run(Slot::Proxy, proxy_salt, &code.light_node_proxy, &params)
        .await?;
    if implementation_redeployed && !proxy_redeployed {
        tracing::warn!(
            ?proxy,
            ?implementation,
            "new implementation deployed behind an existing proxy, the proxy still delegates to \
             the implementation it was created with"
        );
    }

    tracing::info!(
        network = %config.network,
        ?mpt_verify,
        ?implementation,
        ?proxy,
        "light client deployed"
    );
    Ok(LightClientAddresses {
        mpt_verify,
        implementation,
        proxy,
    })
}

struct Step<'a> {
    deployer: &'a DeterministicDeployer,
    ledger: &'a Ledger,
    deployments: &'a mut Deployments,
    network: &'a str,
}

impl Step<'_> {
    /// Deploys one contract and persists its address. Returns the address and
    /// whether a deployment transaction was sent.
    async fn run(
        &mut self,
        slot: Slot,
        salt: &str,
        creation_code: &[u8],
        constructor_params: &[u8],
    ) -> Result<(Address, bool), Error> {
        let deployment = self
            .deployer
            .deploy_if_absent(salt, creation_code, constructor_params)
            .await?;

        let record = self.deployments.record_mut(self.network);
        let recorded = record.get(slot);
        if !recorded.is_empty() && recorded.parse::<Address>().ok() != Some(deployment.address) {
            tracing::warn!(
                ?slot,
                recorded,
                address = ?deployment.address,
                "ledger is out of date, replacing with the on-chain address"
            );
        }
        record.set(slot, deployment.address);
        self.ledger.save(self.deployments)?;
        Ok((deployment.address, deployment.redeployed))
    }
}

/// Submits `headers` one after the other, stopping at the first one the light
/// client does not accept.
pub async fn update_headers(client: &dyn LightClient, headers: &[Bytes]) -> Result<(), Error> {
    for (i, header) in headers.iter().enumerate() {
        match client.submit_header(header.clone()).await? {
            TxOutcome::Success(tx_hash) => {
                tracing::info!(index = i, ?tx_hash, "block header submitted")
            }
            TxOutcome::Reverted(tx_hash) => return Err(Error::HeaderUpdateFailed { tx_hash }),
            TxOutcome::Timeout { tx_hash, after } => {
                return Err(Error::ReceiptTimeout {
                    tx_hash,
                    timeout: after,
                });
            }
        }
    }
    Ok(())
}

/// Fetches the receipt proof of `tx_hash` from the chain at `rpc` and checks
/// it against the light client.
pub async fn verify(
    client: &dyn LightClient,
    proofs: &dyn ProofSource,
    tx_hash: TxHash,
    rpc: &Url,
) -> Result<ProofVerification, Error> {
    let proof = proofs.get_proof(tx_hash, rpc).await?;
    tracing::debug!(?tx_hash, proof = %proof, "retrieved proof");
    let verification = client.verify_proof(proof).await?;
    tracing::info!(
        ?tx_hash,
        success = verification.success,
        message = %verification.message,
        "verified proof"
    );
    Ok(verification)
}
