//! Tessera Vouchers
//!
//! Signed bearer vouchers whose transfers form a chain: each transfer is
//! signed by its sender over the signature of the link before it. Includes
//! chain validation, a TTL validation cache and a ledger that applies
//! mutations through a document sink.

pub mod cache;
pub mod error;
pub mod ledger;
pub mod validation;
pub mod voucher;

pub use cache::ValidationCache;
pub use error::VoucherError;
pub use ledger::{VoucherDocument, VoucherLedger};
pub use validation::{chain_breaks, validate_voucher, ChainBreak, ChainBreakReason, ValidationResult};
pub use voucher::{
    issue_voucher, transfer_voucher, transfer_voucher_with_note, IssueRequest, Issuance,
    IssuerPayload, Transfer, TransferPayload, Voucher,
};
