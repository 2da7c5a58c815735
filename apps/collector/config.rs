use crate::{
    api_client::ProviderPacing, models::price::TokenDescriptor, scoring::ScoringWeights,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use utils::errors::{CONFIG_PARSE_FAILED, CONFIG_READ_FAILED};

/// Per-run configuration, loaded from the JSON file named by the
/// `COLLECTOR_CONFIG` env var. Everything except the organization list has
/// a sensible default.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_threshold")]
    pub activist_threshold: f64,
    #[serde(default)]
    pub scoring: ScoringWeights,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_progress_file")]
    pub progress_file: PathBuf,
    /// Pacing overrides keyed by provider name; unlisted providers use the
    /// defaults.
    #[serde(default)]
    pub providers: HashMap<String, ProviderPacing>,
    #[serde(default)]
    pub include_tally: bool,
    #[serde(default)]
    pub organizations: Vec<OrgConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OrgConfig {
    pub organization: String,
    #[serde(default)]
    pub snapshot_space: Option<String>,
    #[serde(default)]
    pub discourse_base_url: Option<String>,
    #[serde(default)]
    pub boardroom_cname: Option<String>,
    #[serde(default)]
    pub token: TokenDescriptor,
}

fn default_threshold() -> f64 {
    0.4
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("collector_output")
}

fn default_progress_file() -> PathBuf {
    PathBuf::from("collection_progress.json")
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref()).context(CONFIG_READ_FAILED)?;
        serde_json::from_str(&raw).context(CONFIG_PARSE_FAILED)
    }

    pub fn token_for(&self, organization: &str) -> Option<&TokenDescriptor> {
        self.organizations
            .iter()
            .find(|org| org.organization == organization)
            .map(|org| &org.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.activist_threshold, 0.4);
        assert_eq!(config.output_dir, PathBuf::from("collector_output"));
        assert!(config.organizations.is_empty());
        assert!(!config.include_tally);
    }

    #[test]
    fn parses_organization_mappings() {
        let raw = r#"{
            "activist_threshold": 0.25,
            "organizations": [
                {
                    "organization": "ens.eth",
                    "snapshot_space": "ens.eth",
                    "token": {
                        "coingecko_id": "ethereum-name-service",
                        "exchange_symbol": "ENSUSDT",
                        "market_symbol": "ENS"
                    }
                },
                {
                    "organization": "colony.eth",
                    "token": { "coingecko_id": "colony" }
                }
            ]
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();

        assert_eq!(config.activist_threshold, 0.25);
        let token = config.token_for("ens.eth").unwrap();
        assert_eq!(token.coingecko_id.as_deref(), Some("ethereum-name-service"));
        // Providers the token isn't listed on stay unset and get skipped.
        let colony = config.token_for("colony.eth").unwrap();
        assert!(colony.exchange_symbol.is_none());
        assert!(config.token_for("unknown.eth").is_none());
    }

    #[test]
    fn load_reads_a_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "activist_threshold": 0.5 }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.activist_threshold, 0.5);

        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load(&path).is_err());
        assert!(Config::load(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn pacing_overrides_are_per_provider() {
        let raw = r#"{
            "providers": {
                "coingecko": { "min_delay_ms": 15000, "max_retries": 5 }
            }
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        let pacing = config.providers.get("coingecko").unwrap();
        assert_eq!(pacing.min_delay_ms, 15_000);
        assert_eq!(pacing.max_retries, 5);
        // Unspecified fields fall back to defaults.
        assert_eq!(pacing.timeout_secs, 30);
    }
}
