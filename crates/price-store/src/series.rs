//! Multi-commodity trend alignment
//!
//! Merges independent per-commodity histories onto one shared date index so a
//! chart can draw every line against the same x axis. Every row carries a
//! value for every requested commodity; missing days are filled with zero.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::store::PriceStore;

/// Value used when a commodity has no observation on a row's date
pub const MISSING_PRICE: Decimal = Decimal::ZERO;

/// One date on the shared index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRow {
    pub date: NaiveDate,
    /// Parallel to `AlignedSeries::commodities`
    pub values: Vec<Decimal>,
}

/// Aligned table for one region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedSeries {
    pub region: String,
    /// Column order, as requested
    pub commodities: Vec<String>,
    /// Ascending by date
    pub rows: Vec<AlignedRow>,
}

impl AlignedSeries {
    /// True when no requested commodity had any observation
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column of `commodity` (exact label as requested)
    pub fn column(&self, commodity: &str) -> Option<usize> {
        self.commodities.iter().position(|c| c == commodity)
    }

    /// Price of `commodity` on `date`, `None` if either is not in the table
    pub fn value(&self, commodity: &str, date: NaiveDate) -> Option<Decimal> {
        let col = self.column(commodity)?;
        self.rows
            .iter()
            .find(|row| row.date == date)
            .map(|row| row.values[col])
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|row| row.date).collect()
    }
}

impl PriceStore {
    /// Align the histories of `commodities` in `region` on a common date index
    pub fn aligned_history<S: AsRef<str>>(&self, commodities: &[S], region: &str) -> AlignedSeries {
        // Later records on the same day overwrite earlier ones
        let series: Vec<BTreeMap<NaiveDate, Decimal>> = commodities
            .iter()
            .map(|name| {
                self.historical_prices(name.as_ref(), region)
                    .into_iter()
                    .map(|obs| (obs.observed_date, obs.price))
                    .collect()
            })
            .collect();

        let dates: BTreeSet<NaiveDate> = series
            .iter()
            .flat_map(|prices| prices.keys().copied())
            .collect();

        let rows = dates
            .into_iter()
            .map(|date| AlignedRow {
                date,
                values: series
                    .iter()
                    .map(|prices| prices.get(&date).copied().unwrap_or(MISSING_PRICE))
                    .collect(),
            })
            .collect();

        AlignedSeries {
            region: region.to_string(),
            commodities: commodities.iter().map(|c| c.as_ref().to_string()).collect(),
            rows,
        }
    }
}
