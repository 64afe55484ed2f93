use anyhow::{Context, Result};
use fusion::FusionWeights;
use network::{NetworkConfig, PatternConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_PATH_ENV: &str = "FRAUD_RISK_CONFIG";
pub const BIND_ADDR_ENV: &str = "FRAUD_RISK_BIND";

/// Sections missing from a config file take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub mode: SensitivityMode,
    pub server: ServerConfig,
    pub fusion: FusionWeights,
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityMode {
    Lenient,  // Fewer, larger penalties needed before patterns matter
    Standard, // Default thresholds
    Strict,   // Smaller outliers and every cycle weigh more
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub request_timeout_secs: u64,
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// EnvFilter directive used when RUST_LOG is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: SensitivityMode::Standard,
            server: ServerConfig::default(),
            fusion: FusionWeights::default(),
            network: NetworkConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn strict_mode() -> Self {
        Self {
            mode: SensitivityMode::Strict,
            network: NetworkConfig {
                patterns: PatternConfig {
                    cycle_penalty_per_cycle: 0.08,
                    cycle_penalty_cap: 0.30,
                    outlier_multiplier: 2.0,
                    outlier_penalty_per_transfer: 0.05,
                    outlier_penalty_cap: 0.25,
                    ..PatternConfig::default()
                },
                ..NetworkConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn lenient_mode() -> Self {
        Self {
            mode: SensitivityMode::Lenient,
            network: NetworkConfig {
                patterns: PatternConfig {
                    cycle_penalty_per_cycle: 0.03,
                    cycle_penalty_cap: 0.10,
                    outlier_multiplier: 5.0,
                    outlier_penalty_per_transfer: 0.02,
                    outlier_penalty_cap: 0.08,
                    ..PatternConfig::default()
                },
                ..NetworkConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Defaults, or the file named by FRAUD_RISK_CONFIG, then FRAUD_RISK_BIND
    /// on top.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(bind_addr) = std::env::var(BIND_ADDR_ENV) {
            config.server.bind_addr = bind_addr;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let config = AppConfig::strict_mode();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_presets_differ_in_sensitivity() {
        let strict = AppConfig::strict_mode().network.patterns;
        let lenient = AppConfig::lenient_mode().network.patterns;
        let standard = AppConfig::default().network.patterns;

        assert!(strict.outlier_multiplier < standard.outlier_multiplier);
        assert!(lenient.outlier_multiplier > standard.outlier_multiplier);
        assert!(strict.cycle_penalty_cap > lenient.cycle_penalty_cap);
    }

    #[test]
    fn test_partial_network_section_uses_defaults() {
        let json = serde_json::json!({
            "mode": "standard",
            "server": {"bind_addr": "127.0.0.1:8080", "request_timeout_secs": 5},
            "fusion": {"fraud": 0.25, "compliance": 0.25, "behavior": 0.25, "network": 0.25},
            "network": {"neutral_risk": 0.5},
            "logging": {"level": "debug", "format": "json"}
        });
        let config: AppConfig = serde_json::from_value(json).unwrap();

        assert_eq!(config.network.pagerank.damping_factor, 0.85);
        assert_eq!(config.network.patterns.max_cycles, 1000);
        assert_eq!(config.server.max_body_bytes, ServerConfig::default().max_body_bytes);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_sections_default() {
        let config: AppConfig = serde_json::from_str(r#"{"mode": "strict"}"#).unwrap();
        assert_eq!(config.mode, SensitivityMode::Strict);
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.fusion, FusionWeights::default());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("fraud-risk-config-{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_string(&AppConfig::lenient_mode()).unwrap()).unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.mode, SensitivityMode::Lenient);

        std::fs::remove_file(&path).unwrap();
        assert!(AppConfig::from_file(&path).is_err());
    }
}
