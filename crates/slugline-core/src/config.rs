use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::{DEFAULT_LOG_LEVEL, DEFAULT_MAX_CONNECTIONS, DEFAULT_RESERVED_WORDS};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub slugs: SlugSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Process-wide slug defaults merged into every registered document type.
#[derive(Debug, Clone, Deserialize)]
pub struct SlugSettings {
    /// Words no slug may equal, in addition to each type's own reserved words.
    pub reserved: Vec<String>,
    /// Upper bound on candidate length, applied before uniqueness checks.
    pub max_length: Option<usize>,
}

impl Default for SlugSettings {
    fn default() -> Self {
        Self {
            reserved: DEFAULT_RESERVED_WORDS.iter().map(ToString::to_string).collect(),
            max_length: None,
        }
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from environment variables and an optional `config.toml`.
    /// Environment variables take precedence over file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default(
                "database.max_connections",
                i64::from(DEFAULT_MAX_CONNECTIONS),
            )?
            .set_default("logging.level", DEFAULT_LOG_LEVEL)?
            .set_default("slugs.reserved", DEFAULT_RESERVED_WORDS.to_vec())?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .list_separator(",")
                    .with_list_parse_key("slugs.reserved")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    tracing::debug!(
        reserved = settings.slugs.reserved.len(),
        max_length = ?settings.slugs.max_length,
        "Configuration loaded"
    );
    Ok(settings)
}
