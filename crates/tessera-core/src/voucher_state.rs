use std::fmt;

use crate::error::CoreError;

/// Lifecycle states of a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    /// Voucher is in circulation and can be transferred.
    Active,
    /// Voucher has been returned to its issuer. Final state.
    Redeemed,
    /// Voucher passed its expiry without being redeemed. Final state.
    Expired,
}

impl VoucherStatus {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Redeemed | Self::Expired)
    }
}

impl fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Redeemed => write!(f, "redeemed"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Events that drive voucher state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherEvent {
    /// Custody moves to someone other than the issuer.
    Transfer,
    /// Custody moves back to the issuer.
    ReturnToIssuer,
    /// The expiry time has passed.
    Expire,
}

/// Valid transitions:
/// - Active → Active (Transfer)
/// - Active → Redeemed (ReturnToIssuer)
/// - Active → Expired (Expire)
///
/// Redeemed and Expired accept no events.
pub struct VoucherStateMachine;

impl VoucherStateMachine {
    pub fn transition(current: VoucherStatus, event: VoucherEvent) -> Result<VoucherStatus, CoreError> {
        let new_state = match (current, event) {
            (VoucherStatus::Active, VoucherEvent::Transfer) => VoucherStatus::Active,
            (VoucherStatus::Active, VoucherEvent::ReturnToIssuer) => VoucherStatus::Redeemed,
            (VoucherStatus::Active, VoucherEvent::Expire) => VoucherStatus::Expired,
            _ => {
                let target = match event {
                    VoucherEvent::Transfer => VoucherStatus::Active,
                    VoucherEvent::ReturnToIssuer => VoucherStatus::Redeemed,
                    VoucherEvent::Expire => VoucherStatus::Expired,
                };
                return Err(CoreError::InvalidStateTransition {
                    from: current,
                    to: target,
                });
            }
        };

        tracing::debug!(
            from = %current,
            to = %new_state,
            event = ?event,
            "voucher state transition"
        );

        Ok(new_state)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: VoucherStatus, event: VoucherEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
