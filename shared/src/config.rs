//! Configuration management for the event functions.

use std::env;

use crate::models::EventIdStrategy;
use crate::{Error, Result};

/// Default Cosmos DB database name.
pub const DEFAULT_DATABASE_NAME: &str = "EventDB";
/// Default Cosmos DB container name.
pub const DEFAULT_CONTAINER_NAME: &str = "Events";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cosmos DB account endpoint, e.g. `https://account.documents.azure.com:443/`
    pub cosmos_url: String,
    /// Cosmos DB master key (base64)
    pub cosmos_key: String,
    /// Database name
    pub database_name: String,
    /// Container name
    pub container_name: String,
    /// How new event ids are generated
    pub id_strategy: EventIdStrategy,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| Error::Config(format!("{} not set", key)))
        };

        let id_strategy = match lookup("EVENT_ID_STRATEGY") {
            Some(value) => value.parse()?,
            None => EventIdStrategy::default(),
        };

        Ok(Self {
            cosmos_url: required("COSMOS_DB_URL")?,
            cosmos_key: required("COSMOS_DB_KEY")?,
            database_name: lookup("COSMOS_DB_NAME")
                .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
            container_name: lookup("COSMOS_CONTAINER_NAME")
                .unwrap_or_else(|| DEFAULT_CONTAINER_NAME.to_string()),
            id_strategy,
        })
    }
}
