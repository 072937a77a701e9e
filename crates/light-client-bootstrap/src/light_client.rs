//! Interaction with the deployed light client once it sits behind its proxy.

use {
    crate::{
        error::Error,
        transaction::{self, TxOutcome},
    },
    alloy::{
        primitives::{Address, Bytes},
        providers::DynProvider,
    },
    anyhow::Context,
    contracts::alloy::LightNode,
    std::{path::Path, time::Duration},
};

/// Result of checking a receipt proof against the light client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofVerification {
    pub success: bool,
    pub message: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LightClient: Send + Sync {
    /// Feeds a block header into the light client's update protocol.
    async fn submit_header(&self, header: Bytes) -> Result<TxOutcome, Error>;

    /// Checks a serialized receipt proof. Read only.
    async fn verify_proof(&self, proof: Bytes) -> Result<ProofVerification, Error>;
}

pub struct OnchainLightClient {
    instance: LightNode::LightNodeInstance<DynProvider>,
    receipt_timeout: Duration,
}

impl OnchainLightClient {
    pub fn new(address: Address, provider: DynProvider, receipt_timeout: Duration) -> Self {
        Self {
            instance: LightNode::new(address, provider),
            receipt_timeout,
        }
    }
}

#[async_trait::async_trait]
impl LightClient for OnchainLightClient {
    async fn submit_header(&self, header: Bytes) -> Result<TxOutcome, Error> {
        let pending = self.instance.updateBlockHeader(header).send().await?;
        transaction::wait_for_outcome(pending, self.receipt_timeout).await
    }

    async fn verify_proof(&self, proof: Bytes) -> Result<ProofVerification, Error> {
        let result = self.instance.verifyProofData(proof).call().await?;
        Ok(ProofVerification {
            success: result.success,
            message: result.message,
        })
    }
}

/// Reads a hex encoded block header from `path`. Surrounding whitespace and a
/// `0x` prefix are accepted.
pub fn read_header_file(path: &Path) -> Result<Bytes, Error> {
    let read = || -> anyhow::Result<Bytes> {
        let content = std::fs::read_to_string(path).context("reading file")?;
        let header: Bytes = content.trim().parse().context("decoding hex")?;
        anyhow::ensure!(!header.is_empty(), "empty header");
        Ok(header)
    };
    read().map_err(|source| Error::Header {
        path: path.to_path_buf(),
        source,
    })
}
