use {
    alloy::primitives::{Address, TxHash},
    ethrpc::alloy::errors::ContractErrorExt,
    std::{path::PathBuf, time::Duration},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("deployment salt must not be empty")]
    EmptySalt,

    #[error("deployment with salt {salt:?} to {address} failed in transaction {tx_hash}")]
    DeploymentFailed {
        salt: String,
        address: Address,
        tx_hash: TxHash,
    },

    /// The deployment transaction could not be submitted, e.g. because gas
    /// estimation hit a constructor revert.
    #[error("deployment with salt {salt:?} to {address} rejected")]
    DeploymentRejected {
        salt: String,
        address: Address,
        #[source]
        source: Box<Error>,
    },

    /// The transaction was submitted but no receipt arrived in time. Rerunning
    /// is safe: a deployment whose receipt never arrived either left the
    /// derived address empty or filled it, and both cases are detected.
    #[error("no receipt for transaction {tx_hash} after {timeout:?}")]
    ReceiptTimeout { tx_hash: TxHash, timeout: Duration },

    #[error("header update failed in transaction {tx_hash}")]
    HeaderUpdateFailed { tx_hash: TxHash },

    #[error("node unavailable")]
    NetworkUnavailable(#[source] anyhow::Error),

    #[error("contract call failed")]
    Contract(#[source] anyhow::Error),

    #[error("deployment ledger {}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: PersistenceError,
    },

    #[error("contract artifact {name}")]
    Artifact {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("block header {}", path.display())]
    Header {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("proof unavailable")]
    ProofUnavailable(#[source] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("i/o error")]
    Io(#[from] std::io::Error),
    #[error("malformed content")]
    Malformed(#[from] serde_json::Error),
}

impl Error {
    /// Whether rerunning the failed step can succeed without operator
    /// intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ReceiptTimeout { .. } | Self::NetworkUnavailable(_) => true,
            Self::DeploymentRejected { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    pub(crate) fn persistence(path: &std::path::Path, source: impl Into<PersistenceError>) -> Self {
        Self::Persistence {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

impl From<alloy::contract::Error> for Error {
    fn from(err: alloy::contract::Error) -> Self {
        if err.is_node_error() {
            Self::NetworkUnavailable(err.into())
        } else {
            Self::Contract(err.into())
        }
    }
}

impl From<alloy::transports::TransportError> for Error {
    fn from(err: alloy::transports::TransportError) -> Self {
        Self::NetworkUnavailable(err.into())
    }
}
