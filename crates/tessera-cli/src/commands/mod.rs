pub mod did;
pub mod init;
pub mod keygen;
pub mod link;
pub mod sign;
pub mod verify;
pub mod voucher;

use anyhow::Context;
use std::path::{Path, PathBuf};
use tessera_identity::{ExportedKeyPair, Identity};

use crate::config::TesseraConfig;

/// The key file named on the command line, else the configured one.
pub fn key_path(explicit: Option<&PathBuf>, config: &TesseraConfig) -> PathBuf {
    explicit
        .cloned()
        .unwrap_or_else(|| config.identity.keypair_path.clone())
}

pub fn load_identity(path: &Path) -> anyhow::Result<Identity> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading key file {}", path.display()))?;
    let exported: ExportedKeyPair = serde_json::from_str(&contents)
        .with_context(|| format!("parsing key file {}", path.display()))?;
    Ok(exported.import()?)
}

/// Read JSON from a file path, or parse the argument itself as JSON.
pub fn read_json(input: &str) -> anyhow::Result<serde_json::Value> {
    let json_str = if Path::new(input).exists() {
        std::fs::read_to_string(input)?
    } else {
        input.to_string()
    };
    serde_json::from_str(&json_str).map_err(|e| anyhow::anyhow!("invalid JSON: {}", e))
}

pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let contents = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}
