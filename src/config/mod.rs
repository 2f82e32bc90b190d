use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use dotenv::dotenv;
use serde::Deserialize;
use std::convert::TryFrom;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    // Network configuration
    pub network: String,
    pub rpc_url: String,

    // Gateway behavior
    pub gateway_timeout_ms: u64,

    // Token catalog
    pub catalog_path: Option<String>,

    // Balance matching: when true, a balance update that matches more than
    // one tracked record is dropped instead of updating the first match
    pub strict_balance_match: bool,

    // Monitoring configuration
    pub log_level: String,
}

impl TryFrom<Config> for Settings {
    type Error = ConfigError;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        Ok(Settings {
            network: config.get_string("network")?,
            rpc_url: config.get_string("rpc_url")?,
            gateway_timeout_ms: config.get_int("gateway_timeout_ms").unwrap_or(10_000) as u64,
            catalog_path: config.get_string("catalog_path").ok(),
            strict_balance_match: config.get_bool("strict_balance_match").unwrap_or(false),
            log_level: config
                .get_string("log_level")
                .unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();
        let env = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = ConfigBuilder::<DefaultState>::default()
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("APP"))
            .build()?;

        Settings::try_from(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        let config = ConfigBuilder::<DefaultState>::default()
            .add_source(Environment::default())
            .build()?;

        Settings::try_from(config)
    }
}
