//! Tessera Core: shared types, errors, configuration and the seams
//! (clock, document handles) used by the identity and voucher layers.

pub mod clock;
pub mod config;
pub mod document;
pub mod error;
pub mod types;
pub mod voucher_state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CoreConfig;
pub use document::{DocumentHandle, MemoryDocument};
pub use error::CoreError;
pub use types::{AttestationStatus, SignatureStatus};
pub use voucher_state::{VoucherEvent, VoucherStateMachine, VoucherStatus};
