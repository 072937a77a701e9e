//! Loads creation bytecode from the JSON artifacts emitted by the contract
//! build. Both the Hardhat (`"bytecode": "0x.."`) and the Foundry
//! (`"bytecode": {"object": "0x.."}`) layouts are understood.

use {
    alloy::primitives::Bytes,
    anyhow::{Context, Result, ensure},
    serde::Deserialize,
    std::path::{Path, PathBuf},
};

#[derive(Deserialize)]
struct Artifact {
    bytecode: Bytecode,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Bytecode {
    Hex(Bytes),
    Object { object: Bytes },
}

impl From<Bytecode> for Bytes {
    fn from(value: Bytecode) -> Self {
        match value {
            Bytecode::Hex(bytes) | Bytecode::Object { object: bytes } => bytes,
        }
    }
}

pub fn path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.json"))
}

/// Reads the creation bytecode of contract `name` from `dir`.
pub fn creation_code(dir: &Path, name: &str) -> Result<Bytes> {
    let path = path(dir, name);
    let content =
        std::fs::read(&path).with_context(|| format!("reading artifact {}", path.display()))?;
    let artifact: Artifact = serde_json::from_slice(&content)
        .with_context(|| format!("decoding artifact {}", path.display()))?;
    let bytecode = Bytes::from(artifact.bytecode);
    // Interfaces and abstract contracts compile to empty bytecode.
    ensure!(
        !bytecode.is_empty(),
        "artifact {} has no creation bytecode",
        path.display()
    );
    Ok(bytecode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(path(dir, name), content).unwrap();
    }

    #[test]
    fn reads_hardhat_layout() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "MPTVerify",
            r#"{"contractName": "MPTVerify", "abi": [], "bytecode": "0x6080604052"}"#,
        );
        let code = creation_code(dir.path(), "MPTVerify").unwrap();
        assert_eq!(code, Bytes::from_static(&[0x60, 0x80, 0x60, 0x40, 0x52]));
    }

    #[test]
    fn reads_foundry_layout() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "LightNode",
            r#"{"abi": [], "bytecode": {"object": "0x6001", "linkReferences": {}}}"#,
        );
        let code = creation_code(dir.path(), "LightNode").unwrap();
        assert_eq!(code, Bytes::from_static(&[0x60, 0x01]));
    }

    #[test]
    fn rejects_empty_bytecode() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ILightNode", r#"{"bytecode": "0x"}"#);
        assert!(creation_code(dir.path(), "ILightNode").is_err());
    }

    #[test]
    fn missing_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = creation_code(dir.path(), "LightNodeProxy").unwrap_err();
        assert!(format!("{err:#}").contains("LightNodeProxy.json"));
    }
}
