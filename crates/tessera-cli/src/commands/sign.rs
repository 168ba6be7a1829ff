//! `tessera sign`: Sign a JSON payload or entity as a compact JWS.

use clap::Args;
use std::path::PathBuf;
use tessera_crypto::{sign, sign_entity};

use super::{key_path, load_identity, read_json};
use crate::config::TesseraConfig;

#[derive(Args, Debug)]
pub struct SignArgs {
    /// JSON payload (as string or path to file).
    pub payload: String,

    /// Key file to sign with (defaults to the configured key path).
    #[arg(short, long)]
    pub key: Option<PathBuf>,

    /// Treat the payload as an entity: `signature` and `publicKey` are not signed.
    #[arg(long)]
    pub entity: bool,
}

pub fn run(args: &SignArgs, config: &TesseraConfig) -> anyhow::Result<()> {
    let payload = read_json(&args.payload)?;
    let identity = load_identity(&key_path(args.key.as_ref(), config))?;

    let compact = if args.entity {
        sign_entity(&payload, identity.keypair())?
    } else {
        sign(&payload, identity.keypair())?
    };
    tracing::debug!(did = identity.did(), entity = args.entity, "payload signed");
    println!("{}", compact);
    Ok(())
}
