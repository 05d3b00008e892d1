//! Demo dataset generation
//!
//! One observation per (commodity, region, day) over a trailing window that
//! ends at the anchor date. Prices and units come from a `StdRng` seeded from
//! the config, so the same config and anchor always produce the same data.

use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::{info, warn};

use market_core::{NewObservation, SeedConfig, StoreConfig, StoreResult};

use crate::store::PriceStore;

const FALLBACK_UNIT: &str = "kg";
const MAX_PREALLOCATED: usize = 1 << 16;

/// Last day of the seeded window
pub fn anchor_date(config: &SeedConfig) -> NaiveDate {
    config
        .anchor_date
        .unwrap_or_else(|| Utc::now().date_naive())
}

/// Observations for the configured cross-product, oldest day first
pub fn generate(config: &SeedConfig) -> Vec<NewObservation> {
    let anchor = anchor_date(config);
    let mut rng = StdRng::seed_from_u64(config.rng_seed);

    // Inclusive bounds; an empty range collapses onto the lower bound
    let (low, high) = if config.min_price < config.max_price {
        (config.min_price, config.max_price - 1)
    } else {
        warn!(
            "Seed price range [{}, {}) is empty, using the lower bound",
            config.min_price, config.max_price
        );
        (config.min_price, config.min_price)
    };

    let capacity = (config.days as usize)
        .saturating_mul(config.commodities.len())
        .saturating_mul(config.regions.len())
        .min(MAX_PREALLOCATED);
    let mut observations = Vec::with_capacity(capacity);

    for offset in (0..config.days).rev() {
        let Some(date) = anchor.checked_sub_signed(Duration::days(i64::from(offset))) else {
            warn!("Seed day {} before {} is out of range, skipping", offset, anchor);
            continue;
        };

        for commodity in &config.commodities {
            for region in &config.regions {
                let unit = config
                    .units
                    .choose(&mut rng)
                    .map(String::as_str)
                    .unwrap_or(FALLBACK_UNIT);
                let price = Decimal::from(rng.gen_range(low..=high));

                observations.push(NewObservation::new(commodity, price, region, date, unit));
            }
        }
    }

    observations
}

impl PriceStore {
    /// New store populated from `seed`, or empty when seeding is disabled
    pub fn seeded(seed: &SeedConfig, config: StoreConfig) -> StoreResult<Self> {
        seed.validate()?;
        let store = Self::with_config(config);

        if !seed.enabled {
            info!("Seeding disabled, starting with an empty store");
            return Ok(store);
        }

        for observation in generate(seed) {
            store.insert(observation)?;
        }

        info!(
            "Seeded {} observations: {} commodities x {} regions x {} days ending {}",
            store.len(),
            seed.commodities.len(),
            seed.regions.len(),
            seed.days,
            anchor_date(seed)
        );

        Ok(store)
    }
}
