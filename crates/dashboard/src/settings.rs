//! Settings loading
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML/JSON
//! file, then `MARKET__*` environment variables (`MARKET__SEED__DAYS=14`,
//! `MARKET__DASHBOARD__TREND_COMMODITIES=Tomato,Onion`).

use anyhow::Context;
use config::{Config, Environment, File};
use std::env;
use tracing::debug;

use market_core::AppConfig;

/// Environment variable naming the settings file
pub const CONFIG_PATH_ENV: &str = "MARKET_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "market.toml";
pub const ENV_PREFIX: &str = "MARKET";

const LIST_KEYS: [&str; 4] = [
    "seed.commodities",
    "seed.regions",
    "seed.units",
    "dashboard.trend_commodities",
];

/// Load settings from the file named by `MARKET_CONFIG` (or `market.toml`)
pub fn load() -> anyhow::Result<AppConfig> {
    let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_from(&path)
}

/// Load settings with `path` as the file layer; a missing file is not an error
pub fn load_from(path: &str) -> anyhow::Result<AppConfig> {
    read_layers(path, Some(environment()))
}

/// `MARKET__*` variables, with comma-separated values for the list keys
fn environment() -> Environment {
    LIST_KEYS.iter().fold(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .list_separator(","),
        |source, key| source.with_list_parse_key(key),
    )
}

fn read_layers(path: &str, environment: Option<Environment>) -> anyhow::Result<AppConfig> {
    let mut builder = Config::builder().add_source(File::with_name(path).required(false));
    if let Some(environment) = environment {
        builder = builder.add_source(environment);
    }

    let settings = builder
        .build()
        .with_context(|| format!("Failed to read settings from {}", path))?;

    let app_config: AppConfig = settings
        .try_deserialize()
        .context("Invalid settings")?;

    app_config.validate().context("Invalid settings")?;
    debug!("Loaded settings: {:?}", app_config);

    Ok(app_config)
}
