//! `tessera verify`: Verify a compact JWS or a signed entity.

use clap::Args;
use tessera_crypto::{verify_entity_signature, verify_with_key, PublicKey};
use tessera_identity::{DidKeyResolver, KeyResolver};

use super::read_json;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Compact JWS, or with --entity a signed entity (as string or path to file).
    pub input: String,

    /// Signer's base64 raw public key.
    #[arg(long, conflicts_with = "did", required_unless_present = "did")]
    pub public_key: Option<String>,

    /// Signer's did:key; the public key is taken from the DID.
    #[arg(long)]
    pub did: Option<String>,

    /// Verify the input as a signed entity carrying its own `signature`.
    #[arg(long)]
    pub entity: bool,
}

pub async fn run(args: &VerifyArgs) -> anyhow::Result<()> {
    let key = match (&args.public_key, &args.did) {
        (Some(encoded), _) => PublicKey::from_base64(encoded)?,
        (None, Some(did)) => DidKeyResolver
            .resolve_key(did)
            .await
            .ok_or_else(|| anyhow::anyhow!("no Ed25519 key in {}", did))?,
        (None, None) => anyhow::bail!("one of --public-key or --did is required"),
    };

    let outcome = if args.entity {
        verify_entity_signature(&read_json(&args.input)?, &key)
    } else {
        let compact = match std::fs::read_to_string(&args.input) {
            Ok(contents) => contents,
            Err(_) => args.input.clone(),
        };
        verify_with_key(compact.trim(), &key)
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if !outcome.valid {
        anyhow::bail!(
            "signature is INVALID: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
