//! `tessera did`: Derive, print or check a DID.

use clap::Args;
use std::path::PathBuf;
use tessera_crypto::PublicKey;
use tessera_identity::{did_from_public_key, extract_public_key_from_did, is_legacy_fake_did};

use super::{key_path, load_identity};
use crate::config::TesseraConfig;

#[derive(Args, Debug)]
pub struct DidArgs {
    /// Key file to read (defaults to the configured key path).
    #[arg(short, long, conflicts_with_all = ["public_key", "check"])]
    pub key: Option<PathBuf>,

    /// Derive the DID of a base64 raw public key instead.
    #[arg(long, conflicts_with = "check")]
    pub public_key: Option<String>,

    /// Check whether a DID string is a well-formed Ed25519 did:key.
    #[arg(long)]
    pub check: Option<String>,
}

pub fn run(args: &DidArgs, config: &TesseraConfig) -> anyhow::Result<()> {
    if let Some(did) = &args.check {
        return check(did);
    }

    let did = match &args.public_key {
        Some(encoded) => did_from_public_key(&PublicKey::from_base64(encoded)?),
        None => {
            let identity = load_identity(&key_path(args.key.as_ref(), config))?;
            identity.did().to_string()
        }
    };
    println!("{}", did);
    Ok(())
}

fn check(did: &str) -> anyhow::Result<()> {
    match extract_public_key_from_did(did) {
        Ok(key) => {
            let public_key = PublicKey::from_bytes(&key)?;
            println!("DID is well-formed");
            println!("  Public key:  {}", public_key.to_base64());
            println!("  Fingerprint: {}", public_key.fingerprint());
            Ok(())
        }
        Err(e) => {
            if is_legacy_fake_did(did) {
                println!("Legacy identifier: migrate it to a key-derived did:key");
            }
            anyhow::bail!("DID is NOT valid: {}", e)
        }
    }
}
