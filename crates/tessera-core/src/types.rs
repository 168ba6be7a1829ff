use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of checking one signature.
///
/// `Unknown` means no key material could be found for the signer. It is not
/// evidence of forgery and must never be collapsed into `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureStatus {
    Valid,
    Invalid,
    Unknown,
}

impl SignatureStatus {
    /// Fold a sequence of statuses: any `Invalid` wins, then any `Unknown`,
    /// otherwise `Valid`. An empty sequence is `Valid`.
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = SignatureStatus>,
    {
        let mut overall = SignatureStatus::Valid;
        for status in statuses {
            match status {
                SignatureStatus::Invalid => return SignatureStatus::Invalid,
                SignatureStatus::Unknown => overall = SignatureStatus::Unknown,
                SignatureStatus::Valid => {}
            }
        }
        overall
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn from_valid(valid: bool) -> Self {
        if valid {
            Self::Valid
        } else {
            Self::Invalid
        }
    }
}

impl fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid => write!(f, "invalid"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Verification status of a trust attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationStatus {
    /// Signature verifies against the truster's key.
    Valid,
    /// Signature present but does not verify. Possible tampering.
    Invalid,
    /// No signature at all (legacy, pre-signing data).
    Missing,
    /// Signature present but no key could be resolved for the truster.
    Unknown,
}

impl AttestationStatus {
    /// Only a verified attestation counts as trust.
    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Whether this status must be surfaced prominently as a forgery signal,
    /// as opposed to degrading gracefully.
    pub fn signals_tampering(&self) -> bool {
        matches!(self, Self::Invalid)
    }
}

impl From<SignatureStatus> for AttestationStatus {
    fn from(status: SignatureStatus) -> Self {
        match status {
            SignatureStatus::Valid => Self::Valid,
            SignatureStatus::Invalid => Self::Invalid,
            SignatureStatus::Unknown => Self::Unknown,
        }
    }
}

impl fmt::Display for AttestationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid => write!(f, "invalid"),
            Self::Missing => write!(f, "missing"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_empty_is_valid() {
        assert_eq!(SignatureStatus::aggregate([]), SignatureStatus::Valid);
    }

    #[test]
    fn test_aggregate_invalid_wins_over_unknown() {
        let statuses = [
            SignatureStatus::Unknown,
            SignatureStatus::Valid,
            SignatureStatus::Invalid,
        ];
        assert_eq!(SignatureStatus::aggregate(statuses), SignatureStatus::Invalid);
    }

    #[test]
    fn test_aggregate_unknown_over_valid() {
        let statuses = [SignatureStatus::Valid, SignatureStatus::Unknown];
        assert_eq!(SignatureStatus::aggregate(statuses), SignatureStatus::Unknown);
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&SignatureStatus::Invalid).unwrap();
        assert_eq!(json, "\"invalid\"");
        let back: AttestationStatus = serde_json::from_str("\"missing\"").unwrap();
        assert_eq!(back, AttestationStatus::Missing);
    }

    #[test]
    fn test_attestation_status_flags() {
        assert!(AttestationStatus::Valid.is_trusted());
        assert!(!AttestationStatus::Unknown.is_trusted());
        assert!(AttestationStatus::Invalid.signals_tampering());
        assert!(!AttestationStatus::Missing.signals_tampering());
    }

    #[test]
    fn test_from_signature_status() {
        assert_eq!(
            AttestationStatus::from(SignatureStatus::Unknown),
            AttestationStatus::Unknown
        );
        assert_eq!(SignatureStatus::from_valid(false), SignatureStatus::Invalid);
    }
}
