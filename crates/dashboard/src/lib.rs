//! Dashboard surfaces for the market price tracker
//!
//! Wraps a shared `PriceStore` with the form-driven CRUD surface, the summary
//! aggregations and the multi-commodity trend chart.

pub mod service;
pub mod settings;
pub mod views;

pub use service::{DashboardReport, DashboardService, DashboardServiceBuilder, ServiceStatus};
pub use views::{CommodityGroup, PriceForm, TrendChart, TrendPoint};
