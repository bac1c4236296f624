//! Contract artifacts and deployment records.
//!
//! A contract is keyed by name: its ABI, creation bytecode and deployed
//! address live side by side. Transaction hashes and receipts are keyed by a
//! free-form label such as `deploy` or `last_setValue`.

use std::path::PathBuf;

use alloy::{
    hex,
    json_abi::JsonAbi,
    primitives::{Address, Bytes, B256},
};
use async_trait::async_trait;

use crate::{
    error::{AppError, Result},
    types::{ContractArtifact, ContractBinding, Receipt},
};

/// Persistence for compiled contracts and what was done with them.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn load_abi(&self, name: &str) -> Result<JsonAbi>;

    async fn save_abi(&self, name: &str, abi: &JsonAbi) -> Result<()>;

    async fn load_bytecode(&self, name: &str) -> Result<Bytes>;

    async fn save_bytecode(&self, name: &str, bytecode: &Bytes) -> Result<()>;

    /// Address the named contract was deployed at.
    async fn load_address(&self, name: &str) -> Result<Address>;

    async fn save_address(&self, name: &str, address: Address) -> Result<()>;

    async fn record_tx_hash(&self, label: &str, hash: B256) -> Result<()>;

    async fn load_tx_hash(&self, label: &str) -> Result<B256>;

    async fn save_receipt(&self, label: &str, receipt: &Receipt) -> Result<()>;
}

/// ABI and bytecode of `name`, ready to deploy.
pub async fn load_artifact(store: &dyn ArtifactStore, name: &str) -> Result<ContractArtifact> {
    let abi = store.load_abi(name).await?;
    let bytecode = store.load_bytecode(name).await?;
    Ok(ContractArtifact { name: name.to_string(), abi, bytecode })
}

/// ABI and deployed address of `name`.
pub async fn load_binding(store: &dyn ArtifactStore, name: &str) -> Result<ContractBinding> {
    let abi = store.load_abi(name).await?;
    let address = store.load_address(name).await?;
    Ok(ContractBinding::new(address, abi))
}

/// Parse creation bytecode as emitted by solc (hex, `0x` optional).
pub fn parse_bytecode(raw: &str) -> Result<Bytes> {
    let bytes = hex::decode(raw.trim())
        .map_err(|e| AppError::Artifact(format!("bytecode is not valid hex: {}", e)))?;
    if bytes.is_empty() {
        return Err(AppError::Artifact("bytecode is empty".into()));
    }
    Ok(bytes.into())
}

/// Stores artifacts as files in one directory.
///
/// Layout: `<name>_abi.json`, `<name>_bytecode.txt`, `<name>_address.txt`,
/// `<label>_tx_hash.txt`, `<label>_receipt.json`.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, key: &str, suffix: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key.contains(['/', '\\'])
            || key.starts_with('.')
        {
            return Err(AppError::Artifact(format!("invalid artifact name {:?}", key)));
        }
        Ok(self.root.join(format!("{}_{}", key, suffix)))
    }

    async fn read(&self, key: &str, suffix: &str) -> Result<String> {
        let path = self.path(key, suffix)?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| AppError::Artifact(format!("cannot read {}: {}", path.display(), e)))
    }

    async fn write(&self, key: &str, suffix: &str, contents: String) -> Result<()> {
        let path = self.path(key, suffix)?;
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::Artifact(format!("cannot create {}: {}", self.root.display(), e))
        })?;
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| AppError::Artifact(format!("cannot write {}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "Artifact written");
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn load_abi(&self, name: &str) -> Result<JsonAbi> {
        let raw = self.read(name, "abi.json").await?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Artifact(format!("ABI of {} is malformed: {}", name, e)))
    }

    async fn save_abi(&self, name: &str, abi: &JsonAbi) -> Result<()> {
        self.write(name, "abi.json", serde_json::to_string_pretty(abi)?).await
    }

    async fn load_bytecode(&self, name: &str) -> Result<Bytes> {
        parse_bytecode(&self.read(name, "bytecode.txt").await?)
    }

    async fn save_bytecode(&self, name: &str, bytecode: &Bytes) -> Result<()> {
        self.write(name, "bytecode.txt", hex::encode(bytecode)).await
    }

    async fn load_address(&self, name: &str) -> Result<Address> {
        let raw = self.read(name, "address.txt").await?;
        raw.trim().parse().map_err(|e| {
            AppError::Artifact(format!("stored address of {} is invalid: {}", name, e))
        })
    }

    async fn save_address(&self, name: &str, address: Address) -> Result<()> {
        self.write(name, "address.txt", address.to_checksum(None)).await
    }

    async fn record_tx_hash(&self, label: &str, hash: B256) -> Result<()> {
        self.write(label, "tx_hash.txt", hash.to_string()).await
    }

    async fn load_tx_hash(&self, label: &str) -> Result<B256> {
        let raw = self.read(label, "tx_hash.txt").await?;
        raw.trim().parse().map_err(|e| {
            AppError::Artifact(format!("stored hash for {} is invalid: {}", label, e))
        })
    }

    async fn save_receipt(&self, label: &str, receipt: &Receipt) -> Result<()> {
        self.write(label, "receipt.json", serde_json::to_string_pretty(receipt)?).await
    }
}
