use tessera_core::VoucherStatus;

/// Voucher-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum VoucherError {
    #[error("voucher not found: {0}")]
    NotFound(String),

    #[error("{from_id} is not the current holder of voucher {voucher_id}")]
    NotHolder { voucher_id: String, from_id: String },

    #[error("voucher {voucher_id} is {status}, not active")]
    NotActive {
        voucher_id: String,
        status: VoucherStatus,
    },

    #[error("voucher already exists: {0}")]
    AlreadyExists(String),

    #[error("incoming copy of voucher {0} does not extend the stored transfer chain")]
    StaleCopy(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("signing key does not belong to {0}")]
    SignerMismatch(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] tessera_crypto::CryptoError),

    #[error("identity error: {0}")]
    Identity(#[from] tessera_identity::IdentityError),

    #[error("core error: {0}")]
    Core(#[from] tessera_core::CoreError),
}
