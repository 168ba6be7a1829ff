use crate::voucher_state::VoucherStatus;

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid voucher state transition from {from} to {to}")]
    InvalidStateTransition {
        from: VoucherStatus,
        to: VoucherStatus,
    },

    #[error("document error: {0}")]
    Document(String),
}
