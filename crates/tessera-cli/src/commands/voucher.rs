//! `tessera voucher`: Issue, transfer and validate voucher files.

use anyhow::Context;
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tessera_core::{Clock, SystemClock};
use tessera_identity::{CompositeKeyResolver, ProfileKeyResolver};
use tessera_vouchers::{
    issue_voucher, transfer_voucher_with_note, validate_voucher, IssueRequest, Voucher,
};

use super::{key_path, load_identity, write_json};
use crate::config::TesseraConfig;

#[derive(Args, Debug)]
pub struct VoucherArgs {
    #[command(subcommand)]
    pub action: VoucherAction,
}

#[derive(Subcommand, Debug)]
pub enum VoucherAction {
    /// Issue a voucher signed by the local key.
    Issue {
        /// Recipient DID.
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: f64,
        /// Unit of account (e.g. "coffee", "hours").
        #[arg(long)]
        unit: String,
        /// Expire this many seconds after issuance.
        #[arg(long)]
        expires_in: Option<i64>,
        /// Where to write the voucher JSON.
        #[arg(short, long)]
        out: PathBuf,
        #[arg(short, long)]
        key: Option<PathBuf>,
    },
    /// Transfer a voucher held by the local key; rewrites the file.
    Transfer {
        file: PathBuf,
        /// Recipient DID.
        #[arg(long)]
        to: String,
        #[arg(long)]
        note: Option<String>,
        #[arg(short, long)]
        key: Option<PathBuf>,
    },
    /// Validate every signature and the custody chain of a voucher file.
    Validate {
        file: PathBuf,
        /// Print the full validation result as JSON.
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(args: &VoucherArgs, config: &TesseraConfig) -> anyhow::Result<()> {
    let clock = SystemClock;

    match &args.action {
        VoucherAction::Issue {
            to,
            amount,
            unit,
            expires_in,
            out,
            key,
        } => {
            let identity = load_identity(&key_path(key.as_ref(), config))?;
            let mut request = IssueRequest::new(identity.did(), to.clone(), *amount, unit.clone());
            if let Some(secs) = expires_in {
                let expires_at = clock
                    .now_millis()
                    .saturating_add(secs.saturating_mul(1_000));
                request = request.expiring_at(expires_at);
            }
            let voucher = issue_voucher(request, identity.keypair(), &clock)?;
            write_json(out, &voucher)?;
            println!("Voucher issued!");
            println!("  ID:     {}", voucher.id);
            println!("  Amount: {} {}", voucher.amount, voucher.unit);
            println!("  Holder: {}", voucher.current_holder_id);
            println!("  Status: {}", voucher.status);
        }
        VoucherAction::Transfer {
            file,
            to,
            note,
            key,
        } => {
            let identity = load_identity(&key_path(key.as_ref(), config))?;
            let mut voucher = read_voucher(file)?;
            let transfer = transfer_voucher_with_note(
                &mut voucher,
                identity.did(),
                to,
                note.clone(),
                identity.keypair(),
                &clock,
            )?;
            write_json(file, &voucher)?;
            println!("Voucher transferred!");
            println!("  Transfer: {}", transfer.id);
            println!("  Holder:   {}", voucher.current_holder_id);
            println!("  Status:   {}", voucher.status);
        }
        VoucherAction::Validate { file, json } => {
            let voucher = read_voucher(file)?;
            let resolver = CompositeKeyResolver::standard(Arc::new(ProfileKeyResolver::new()));
            let result =
                validate_voucher(&voucher, &resolver, &config.core, clock.now_millis()).await;

            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Voucher {} is {}", voucher.id, result.overall_status.to_string().to_uppercase());
                println!();
                println!("  [{}] issuer signature", result.issuer_signature_status);
                for (index, status) in result.transfer_signature_statuses.iter().enumerate() {
                    println!("  [{}] transfer {}", status, index);
                }
                println!("  [{}] chain continuity", result.chain_status);
                if let Some(error) = &result.error {
                    println!("  {}", error);
                }
            }
            if !result.is_valid() {
                anyhow::bail!("voucher {} did not validate", voucher.id);
            }
        }
    }
    Ok(())
}

fn read_voucher(path: &Path) -> anyhow::Result<Voucher> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading voucher file {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing voucher file {}", path.display()))
}
