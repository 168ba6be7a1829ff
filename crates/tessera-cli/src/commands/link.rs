//! `tessera link`: Generate or parse verify links.

use clap::{Args, Subcommand};
use std::path::PathBuf;
use tessera_identity::VerifyLink;

use super::{key_path, load_identity};
use crate::config::TesseraConfig;

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// URL scheme (defaults to the configured link scheme).
    #[arg(long)]
    pub scheme: Option<String>,

    #[command(subcommand)]
    pub action: LinkAction,
}

#[derive(Subcommand, Debug)]
pub enum LinkAction {
    /// Build a verify link for a DID.
    Generate {
        /// DID to share (defaults to the DID of the key file).
        #[arg(long)]
        did: Option<String>,
        /// Key file used when --did is absent.
        #[arg(short, long)]
        key: Option<PathBuf>,
        /// URL of the user's profile document.
        #[arg(long)]
        user_doc: Option<String>,
        /// Display name to show the scanner.
        #[arg(long)]
        name: Option<String>,
    },
    /// Decode a verify link.
    Parse {
        url: String,
    },
}

pub fn run(args: &LinkArgs, config: &TesseraConfig) -> anyhow::Result<()> {
    let scheme = args.scheme.as_deref().unwrap_or(&config.core.link_scheme);

    match &args.action {
        LinkAction::Generate {
            did,
            key,
            user_doc,
            name,
        } => {
            let did = match did {
                Some(did) => did.clone(),
                None => load_identity(&key_path(key.as_ref(), config))?.did().to_string(),
            };
            let link = VerifyLink {
                did,
                user_doc_url: user_doc.clone(),
                name: name.clone(),
            };
            // Round-trip through the parser so a bad --did is caught here.
            VerifyLink::parse(&link.to_url(scheme), scheme)?;
            println!("{}", link.to_url(scheme));
        }
        LinkAction::Parse { url } => {
            let link = VerifyLink::parse(url, scheme)?;
            println!("DID:      {}", link.did);
            if let Some(doc) = &link.user_doc_url {
                println!("User doc: {}", doc);
            }
            if let Some(name) = &link.name {
                println!("Name:     {}", name);
            }
        }
    }
    Ok(())
}
