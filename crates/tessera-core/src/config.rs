use serde::{Deserialize, Serialize};

/// Tunables shared by the identity and voucher layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// How long a voucher validation result stays fresh, in seconds.
    pub validation_ttl_secs: u64,
    /// Whether a broken `previousSignature` link makes a voucher invalid.
    pub enforce_chain_continuity: bool,
    /// URL scheme used for verify links (`<scheme>://verify/<did>`).
    pub link_scheme: String,
}

impl CoreConfig {
    pub fn validation_ttl(&self) -> chrono::Duration {
        let secs = i64::try_from(self.validation_ttl_secs)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1_000);
        chrono::Duration::seconds(secs)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            validation_ttl_secs: 300,
            enforce_chain_continuity: true,
            link_scheme: "tessera".into(),
        }
    }
}
