use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use thiserror::Error;
use xmas_game::constants::RULES_CONFIG_NAME;
use xmas_game::{AssetError, Catalog, DataLoader, EmbeddedData, RulesConfig};

#[derive(Debug, Error)]
pub enum TesterDataError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("rules override could not be re-encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Bundled catalog plus an optional rules file supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct TesterData {
    rules_override: Option<RulesConfig>,
}

impl TesterData {
    #[must_use]
    pub const fn with_rules(rules: RulesConfig) -> Self {
        Self {
            rules_override: Some(rules),
        }
    }

    /// Read and validate a rules file, or fall back to the bundled rules.
    pub fn from_rules_path(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read rules file {}", path.display()))?;
        let rules = RulesConfig::from_json(&json)
            .with_context(|| format!("failed to parse rules file {}", path.display()))?;
        rules
            .validate()
            .with_context(|| format!("invalid rules in {}", path.display()))?;
        Ok(Self::with_rules(rules))
    }

    #[must_use]
    pub const fn rules_override(&self) -> Option<&RulesConfig> {
        self.rules_override.as_ref()
    }
}

impl DataLoader for TesterData {
    type Error = TesterDataError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Ok(EmbeddedData.load_catalog()?)
    }

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        match (&self.rules_override, config_name) {
            (Some(rules), RULES_CONFIG_NAME) => {
                Ok(serde_json::from_value(serde_json::to_value(rules)?)?)
            }
            _ => Ok(EmbeddedData.load_config(config_name)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_replaces_bundled_rules() {
        let rules = RulesConfig {
            starting_reroll_tokens: 6,
            ..RulesConfig::default()
        };
        let data = TesterData::with_rules(rules.clone());
        let loaded: RulesConfig = data.load_config(RULES_CONFIG_NAME).unwrap();
        assert_eq!(loaded, rules);
    }

    #[test]
    fn missing_rules_file_is_reported() {
        let path = std::env::temp_dir().join("xmas-missing-rules-file.json");
        let err = TesterData::from_rules_path(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("failed to read rules file"));
    }

    #[test]
    fn invalid_rules_file_is_rejected() {
        let path = std::env::temp_dir().join("xmas-invalid-rules.json");
        fs::write(&path, r#"{ "challengeModifierRerollCost": 0 }"#).unwrap();
        let err = TesterData::from_rules_path(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid rules"));
    }

    #[test]
    fn defaults_to_bundled_data() {
        let data = TesterData::from_rules_path(None).unwrap();
        assert!(data.rules_override().is_none());
        let loaded: RulesConfig = data.load_config(RULES_CONFIG_NAME).unwrap();
        assert_eq!(loaded, RulesConfig::default());
    }
}
