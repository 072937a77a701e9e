//! Persisted record of which contracts have been deployed on which network.
//!
//! The ledger file is a JSON object mapping a network identifier to the
//! addresses of the light client contracts deployed there. It is written
//! tab-indented and with sorted keys so that deployment history can be reviewed
//! in version control. A missing file or a missing network entry is a valid
//! initial state, not an error.

use {
    crate::error::{Error, PersistenceError},
    alloy::primitives::Address,
    serde::{Deserialize, Serialize},
    std::{
        collections::BTreeMap,
        io::Write as _,
        path::{Path, PathBuf},
    },
};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt as _;

/// Addresses deployed on one network. An empty string means "not deployed
/// yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentRecord {
    #[serde(rename = "impl")]
    pub implementation: String,
    pub proxy: String,
    pub oracle: String,
}

/// The fields of a [`DeploymentRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Implementation,
    Proxy,
    Oracle,
}

impl DeploymentRecord {
    pub fn get(&self, slot: Slot) -> &str {
        match slot {
            Slot::Implementation => &self.implementation,
            Slot::Proxy => &self.proxy,
            Slot::Oracle => &self.oracle,
        }
    }

    /// Records `address` for `slot` in its checksummed form.
    pub fn set(&mut self, slot: Slot, address: Address) {
        let field = match slot {
            Slot::Implementation => &mut self.implementation,
            Slot::Proxy => &mut self.proxy,
            Slot::Oracle => &mut self.oracle,
        };
        *field = address.to_checksum(None);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deployments(BTreeMap<String, DeploymentRecord>);

impl Deployments {
    pub fn get(&self, network: &str) -> Option<&DeploymentRecord> {
        self.0.get(network)
    }

    /// Returns the record for `network`, inserting an empty one if needed.
    pub fn record_mut(&mut self, network: &str) -> &mut DeploymentRecord {
        self.0.entry(network.to_string()).or_default()
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all deployments, guaranteeing that the result contains an entry
    /// for `network`.
    pub fn load(&self, network: &str) -> Result<Deployments, Error> {
        let mut deployments = match std::fs::read(&self.path) {
            Ok(content) => serde_json::from_slice::<Deployments>(&content)
                .map_err(|err| Error::persistence(&self.path, err))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no deployment ledger yet");
                Deployments::default()
            }
            Err(err) => return Err(Error::persistence(&self.path, err)),
        };
        if deployments.get(network).is_none() {
            tracing::debug!(network, "adding empty ledger entry");
            deployments.record_mut(network);
        }
        Ok(deployments)
    }

    /// Replaces the ledger file with `deployments`.
    ///
    /// The content is written to a temporary file next to the ledger which is
    /// then renamed over it, so an interrupted write never leaves a truncated
    /// ledger behind. An existing ledger keeps its permissions, a new one is
    /// created world readable (subject to the umask).
    pub fn save(&self, deployments: &Deployments) -> Result<(), Error> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|err| Error::persistence(&self.path, err))?;

        let content = encode(deployments).map_err(|err| Error::persistence(&self.path, err))?;
        let write = || -> Result<(), PersistenceError> {
            let mut builder = tempfile::Builder::new();
            #[cfg(unix)]
            builder.permissions(std::fs::Permissions::from_mode(0o644));
            let mut file = builder.tempfile_in(dir)?;
            match std::fs::metadata(&self.path) {
                Ok(existing) => file.as_file().set_permissions(existing.permissions())?,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
            file.write_all(&content)?;
            file.as_file().sync_all()?;
            file.persist(&self.path).map_err(|err| err.error)?;
            Ok(())
        };
        write().map_err(|source| Error::Persistence {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "saved deployment ledger");
        Ok(())
    }
}

fn encode(deployments: &Deployments) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    deployments.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}
