//! Dashboard service: the CRUD, summary and trend surfaces over one store

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use market_core::{
    AppConfig, DashboardConfig, ObservationId, PriceFilter, PriceObservation, StoreError,
    StoreResult, ALL_REGIONS,
};
use market_price_store::{DashboardSummary, PriceStore};

use crate::views::{group_by_commodity, trend_chart, CommodityGroup, PriceForm, TrendChart};

/// Runtime status of the service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub uptime_seconds: u64,
    pub observations: usize,
    pub commodities: usize,
    pub regions: usize,
    pub mutations: u64,
    pub rejected_writes: u64,
}

/// Everything the landing dashboard shows at once
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub status: ServiceStatus,
    pub latest: Vec<PriceObservation>,
    pub summary: DashboardSummary,
    pub trend: Option<TrendChart>,
}

/// Dashboard service over a shared store
#[derive(Debug, Clone)]
pub struct DashboardService {
    store: Arc<PriceStore>,
    config: DashboardConfig,
    start_time: Instant,
    rejected_writes: Arc<AtomicU64>,
}

impl DashboardService {
    pub fn new(store: Arc<PriceStore>, config: DashboardConfig) -> Self {
        Self {
            store,
            config,
            start_time: Instant::now(),
            rejected_writes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared store reference
    pub fn store(&self) -> Arc<PriceStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Create an observation from a submitted form, dated today when blank
    pub fn create_price(&self, form: &PriceForm) -> StoreResult<PriceObservation> {
        self.create_price_on(form, Utc::now().date_naive())
    }

    /// Create an observation, using `today` for a blank date
    pub fn create_price_on(&self, form: &PriceForm, today: NaiveDate) -> StoreResult<PriceObservation> {
        let result = form
            .to_new_observation(today, &self.config.default_unit)
            .map_err(StoreError::from)
            .and_then(|new| self.store.insert(new));

        match &result {
            Ok(obs) => info!(
                target: "audit",
                event = "PRICE_CREATE",
                id = %obs.id,
                commodity = %obs.commodity_name,
                region = %obs.region,
                outcome = "success",
                "Price created"
            ),
            Err(e) => {
                self.rejected_writes.fetch_add(1, Ordering::Relaxed);
                warn!(
                    target: "audit",
                    event = "PRICE_CREATE",
                    outcome = "rejected",
                    error = %e,
                    "Price rejected"
                );
            }
        }

        result
    }

    /// Apply an edit form; blank fields are kept as they were
    pub fn edit_price(&self, id: ObservationId, form: &PriceForm) -> StoreResult<PriceObservation> {
        let result = form
            .to_patch()
            .map_err(StoreError::from)
            .and_then(|patch| self.store.update(id, &patch));

        match &result {
            Ok(_) => info!(
                target: "audit",
                event = "PRICE_EDIT",
                id = %id,
                outcome = "success",
                "Price edited"
            ),
            Err(e) => {
                self.rejected_writes.fetch_add(1, Ordering::Relaxed);
                warn!(
                    target: "audit",
                    event = "PRICE_EDIT",
                    id = %id,
                    outcome = "rejected",
                    error = %e,
                    "Price edit rejected"
                );
            }
        }

        result
    }

    pub fn delete_price(&self, id: ObservationId) -> bool {
        let removed = self.store.delete(id);

        info!(
            target: "audit",
            event = "PRICE_DELETE",
            id = %id,
            removed = removed,
            outcome = "success",
            "Price deleted"
        );

        removed
    }

    /// Latest price per (commodity, region), narrowed by `filter`
    pub fn list_latest(&self, filter: &PriceFilter) -> Vec<PriceObservation> {
        self.store.search_latest(filter)
    }

    /// Filtered latest prices grouped by commodity
    pub fn grouped_latest(&self, filter: &PriceFilter) -> Vec<CommodityGroup> {
        group_by_commodity(self.list_latest(filter))
    }

    /// Region dropdown entries: "All" followed by every known region
    pub fn region_options(&self) -> Vec<String> {
        std::iter::once(ALL_REGIONS.to_string())
            .chain(self.store.unique_regions())
            .collect()
    }

    pub fn commodity_options(&self) -> Vec<String> {
        self.store.unique_commodity_names()
    }

    pub fn summary(&self) -> DashboardSummary {
        self.store.summary()
    }

    /// Trend comparison of `commodities` in `region`
    pub fn trend<S: AsRef<str>>(&self, commodities: &[S], region: &str) -> TrendChart {
        let series = self.store.aligned_history(commodities, region);
        trend_chart(&series, &self.config.chart_date_format)
    }

    /// Trend for the configured commodities in the configured region (or the
    /// first known region). `None` when there is no region at all.
    pub fn default_trend(&self) -> Option<TrendChart> {
        let region = match &self.config.default_region {
            Some(region) => region.clone(),
            None => self.store.unique_regions().into_iter().next()?,
        };

        Some(self.trend(self.config.trend_commodities.as_slice(), &region))
    }

    pub fn status(&self) -> ServiceStatus {
        let stats = self.store.stats();

        ServiceStatus {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            observations: stats.observation_count,
            commodities: stats.commodity_count,
            regions: stats.region_count,
            mutations: stats.mutation_count,
            rejected_writes: self.rejected_writes.load(Ordering::Relaxed),
        }
    }

    pub fn report(&self) -> DashboardReport {
        DashboardReport {
            status: self.status(),
            latest: self.list_latest(&PriceFilter::default()),
            summary: self.summary(),
            trend: self.default_trend(),
        }
    }
}

/// Builder wiring settings, store and service together
pub struct DashboardServiceBuilder {
    config: AppConfig,
    store: Option<Arc<PriceStore>>,
}

impl DashboardServiceBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            store: None,
        }
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an existing store instead of seeding a new one
    pub fn store(mut self, store: Arc<PriceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Validate the settings, then seed (unless a store was given) and wire up
    pub fn build(self) -> StoreResult<DashboardService> {
        self.config.validate()?;

        let store = match self.store {
            Some(store) => store,
            None => Arc::new(PriceStore::seeded(&self.config.seed, self.config.store.clone())?),
        };

        Ok(DashboardService::new(store, self.config.dashboard))
    }
}

impl Default for DashboardServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
