//! `tessera keygen`: Generate a key pair and write it as JSON.

use clap::Args;
use std::path::PathBuf;
use tessera_identity::Identity;

use super::{key_path, write_json};
use crate::config::TesseraConfig;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Output file (defaults to the configured key path).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Overwrite an existing key file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &KeygenArgs, config: &TesseraConfig) -> anyhow::Result<()> {
    let path = key_path(args.out.as_ref(), config);
    if path.exists() && !args.force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let identity = Identity::generate()?;
    write_json(&path, &identity.export()?)?;
    tracing::info!(path = %path.display(), did = identity.did(), "key pair generated");

    println!("Key pair written to {}", path.display());
    println!("  DID:         {}", identity.did());
    println!("  Fingerprint: {}", identity.public_key().fingerprint());
    Ok(())
}
