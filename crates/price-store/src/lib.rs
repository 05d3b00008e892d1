//! In-memory market price store
//!
//! Features:
//! - Insert / patch / delete of price observations with stable ids
//! - Latest price per (commodity, region)
//! - Case-insensitive historical series and search
//! - Average-by-commodity, average-by-region and distribution aggregations
//! - Date-aligned multi-commodity trend tables
//! - Reproducible demo seeding

pub mod aggregations;
pub mod seed;
pub mod series;
pub mod store;

pub use aggregations::{CommodityAverage, DashboardSummary, DistributionSlice, RegionAverage};
pub use series::{AlignedRow, AlignedSeries, MISSING_PRICE};
pub use store::{PriceStore, StoreStats};
