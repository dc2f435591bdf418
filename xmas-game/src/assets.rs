//! Data loader backed by the JSON assets compiled into the crate.
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::DataLoader;
use crate::catalog::{Catalog, DEFAULT_CATALOG_DATA};
use crate::constants::RULES_CONFIG_NAME;

const DEFAULT_RULES_DATA: &str = include_str!("../data/rules.json");

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("no bundled config named '{0}'")]
    UnknownConfig(String),
    #[error("JSON parsing error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Serves the bundled catalog and rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedData;

impl DataLoader for EmbeddedData {
    type Error = AssetError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Ok(Catalog::from_json(DEFAULT_CATALOG_DATA)?)
    }

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        let raw = match config_name {
            RULES_CONFIG_NAME => DEFAULT_RULES_DATA,
            other => return Err(AssetError::UnknownConfig(other.to_string())),
        };
        Ok(serde_json::from_str(raw)?)
    }
}
