//! CLI configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tessera_core::CoreConfig;

/// Full configuration for the `tessera` binary.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TesseraConfig {
    /// Validation, chain and link settings shared with the libraries.
    #[serde(default)]
    pub core: CoreConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Identity settings.
    #[serde(default)]
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Path to the exported key pair (JSON).
    #[serde(default = "default_keypair_path")]
    pub keypair_path: PathBuf,
}

fn default_log_level() -> String {
    "warn".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_keypair_path() -> PathBuf {
    PathBuf::from("tessera-key.json")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            keypair_path: default_keypair_path(),
        }
    }
}

impl TesseraConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: TesseraConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TesseraConfig::default();
        assert_eq!(config.core.validation_ttl_secs, 300);
        assert!(config.core.enforce_chain_continuity);
        assert_eq!(config.core.link_scheme, "tessera");
        assert_eq!(config.logging.format, "text");
        assert_eq!(config.identity.keypair_path, PathBuf::from("tessera-key.json"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = TesseraConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let decoded: TesseraConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(decoded.core.validation_ttl_secs, config.core.validation_ttl_secs);
        assert_eq!(decoded.logging.level, config.logging.level);
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let config = TesseraConfig::load(Path::new("/nonexistent/tessera.toml")).unwrap();
        assert_eq!(config.core.validation_ttl_secs, 300);
    }

    #[test]
    fn test_config_from_toml_partial() {
        let toml_str = r#"
[core]
validation_ttl_secs = 60

[logging]
format = "json"
"#;
        let config: TesseraConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.core.validation_ttl_secs, 60);
        assert_eq!(config.logging.format, "json");
        // Defaults for unspecified
        assert!(config.core.enforce_chain_continuity);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("tessera-config-{}", std::process::id()));
        let path = dir.join("nested").join("tessera.toml");
        let mut config = TesseraConfig::default();
        config.core.link_scheme = "narrative".into();
        config.save(&path).unwrap();

        let loaded = TesseraConfig::load(&path).unwrap();
        assert_eq!(loaded.core.link_scheme, "narrative");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
