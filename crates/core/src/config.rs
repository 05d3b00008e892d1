//! Configuration types

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Longest seed window accepted, in days
pub const MAX_SEED_DAYS: u32 = 36_500;

/// Demo dataset generated at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub enabled: bool,
    pub commodities: Vec<String>,
    pub regions: Vec<String>,
    pub units: Vec<String>,
    /// Length of the trailing window, including the anchor day
    pub days: u32,
    /// Inclusive lower bound of generated prices
    pub min_price: i64,
    /// Exclusive upper bound of generated prices
    pub max_price: i64,
    pub rng_seed: u64,
    /// Last day of the window; today (UTC) when unset
    pub anchor_date: Option<NaiveDate>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            commodities: [
                "Tomato", "Potato", "Onion", "Carrot", "Cabbage", "Spinach", "Cauliflower", "Brinjal",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            regions: ["Karachi", "Lahore", "Islamabad", "Peshawar", "Quetta"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            units: vec!["kg".to_string(), "dozen".to_string()],
            days: 7,
            min_price: 50,
            max_price: 250,
            rng_seed: 42,
            anchor_date: None,
        }
    }
}

impl SeedConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_price < 0 || self.min_price >= self.max_price {
            return Err(ConfigError::PriceRange {
                min: self.min_price,
                max: self.max_price,
            });
        }
        if self.days > MAX_SEED_DAYS {
            return Err(ConfigError::SeedWindow(self.days));
        }
        Ok(())
    }
}

/// Store behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Reject negative prices and empty labels at insert/update time
    pub strict_validation: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            strict_validation: true,
        }
    }
}

/// Dashboard surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Region used by the trend report; first known region when unset
    pub default_region: Option<String>,
    pub trend_commodities: Vec<String>,
    /// chrono format string for chart date labels
    pub chart_date_format: String,
    /// Unit assumed when a form leaves it blank
    pub default_unit: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_region: None,
            trend_commodities: vec!["Tomato".to_string(), "Onion".to_string()],
            chart_date_format: "%b %-d".to_string(),
            default_unit: "kg".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        let format = &self.chart_date_format;
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::DateFormat(format.clone()));
        }
        if self.default_unit.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultUnit);
        }
        Ok(())
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub seed: SeedConfig,
    pub store: StoreConfig,
    pub dashboard: DashboardConfig,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            seed: SeedConfig::default(),
            store: StoreConfig::default(),
            dashboard: DashboardConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reject settings that would fail later at seed or render time
    pub fn validate(&self) -> ConfigResult<()> {
        self.seed.validate()?;
        self.dashboard.validate()
    }
}
