//! Cross-dimension aggregations for the dashboard summary
//!
//! Every aggregation runs over the whole collection, not just the latest
//! prices. Groups use the normalized label; the first spelling seen is what
//! gets reported. Output is ordered by normalized label.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::store::{PriceStore, StoredObservation};

/// Mean price of one commodity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommodityAverage {
    pub commodity_name: String,
    pub avg_price: Decimal,
    pub count: usize,
}

/// Mean price in one region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionAverage {
    pub region: String,
    pub avg_price: Decimal,
    pub count: usize,
}

/// Share of observations belonging to one commodity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSlice {
    pub commodity_name: String,
    pub count: usize,
    /// count / total observations, in [0, 1]
    pub share: f64,
}

/// Everything the summary view renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub by_commodity: Vec<CommodityAverage>,
    pub by_region: Vec<RegionAverage>,
    pub distribution: Vec<DistributionSlice>,
    pub total_observations: usize,
}

/// Exact sum while it fits in a `Decimal`, plus a running mean that is
/// used once the sum overflows
#[derive(Debug)]
struct Accumulator<'a> {
    label: &'a str,
    total: Option<Decimal>,
    running_mean: Decimal,
    count: usize,
}

impl<'a> Accumulator<'a> {
    fn new(label: &'a str) -> Self {
        Self {
            label,
            total: Some(Decimal::ZERO),
            running_mean: Decimal::ZERO,
            count: 0,
        }
    }

    fn push(&mut self, price: Decimal) {
        self.count += 1;
        self.total = self.total.and_then(|total| total.checked_add(price));
        self.running_mean = price
            .checked_sub(self.running_mean)
            .and_then(|delta| delta.checked_div(Decimal::from(self.count)))
            .and_then(|step| self.running_mean.checked_add(step))
            .unwrap_or(self.running_mean);
    }

    fn mean(&self) -> Decimal {
        self.total
            .and_then(|total| total.checked_div(Decimal::from(self.count)))
            .unwrap_or(self.running_mean)
    }
}

/// Sum and count per normalized key
fn group_by<'a, F>(records: &'a [StoredObservation], pick: F) -> BTreeMap<&'a str, Accumulator<'a>>
where
    F: Fn(&'a StoredObservation) -> (&'a str, &'a str),
{
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();

    for record in records {
        let (key, label) = pick(record);
        groups
            .entry(key)
            .or_insert_with(|| Accumulator::new(label))
            .push(record.obs.price);
    }

    groups
}

fn by_commodity(records: &[StoredObservation]) -> BTreeMap<&str, Accumulator<'_>> {
    group_by(records, |r| (r.key.commodity.as_str(), r.obs.commodity_name.as_str()))
}

fn by_region(records: &[StoredObservation]) -> BTreeMap<&str, Accumulator<'_>> {
    group_by(records, |r| (r.key.region.as_str(), r.obs.region.as_str()))
}

impl PriceStore {
    /// Mean price and observation count per commodity
    pub fn average_price_by_commodity(&self) -> Vec<CommodityAverage> {
        self.with_records(|records| {
            by_commodity(records)
                .into_values()
                .map(|acc| CommodityAverage {
                    commodity_name: acc.label.to_string(),
                    avg_price: acc.mean(),
                    count: acc.count,
                })
                .collect()
        })
    }

    /// Mean price and observation count per region
    pub fn average_price_by_region(&self) -> Vec<RegionAverage> {
        self.with_records(|records| {
            by_region(records)
                .into_values()
                .map(|acc| RegionAverage {
                    region: acc.label.to_string(),
                    avg_price: acc.mean(),
                    count: acc.count,
                })
                .collect()
        })
    }

    /// Observation count per commodity with its share of the total
    pub fn commodity_distribution(&self) -> Vec<DistributionSlice> {
        self.with_records(|records| {
            let total = records.len();
            by_commodity(records)
                .into_values()
                .map(|acc| DistributionSlice {
                    commodity_name: acc.label.to_string(),
                    count: acc.count,
                    share: acc.count as f64 / total as f64,
                })
                .collect()
        })
    }

    /// All three aggregations from one consistent read
    pub fn summary(&self) -> DashboardSummary {
        self.with_records(|records| {
            let total = records.len();
            let commodities = by_commodity(records);

            let by_commodity = commodities
                .values()
                .map(|acc| CommodityAverage {
                    commodity_name: acc.label.to_string(),
                    avg_price: acc.mean(),
                    count: acc.count,
                })
                .collect();

            let distribution = commodities
                .values()
                .map(|acc| DistributionSlice {
                    commodity_name: acc.label.to_string(),
                    count: acc.count,
                    share: acc.count as f64 / total as f64,
                })
                .collect();

            let by_region = by_region(records)
                .into_values()
                .map(|acc| RegionAverage {
                    region: acc.label.to_string(),
                    avg_price: acc.mean(),
                    count: acc.count,
                })
                .collect();

            DashboardSummary {
                by_commodity,
                by_region,
                distribution,
                total_observations: total,
            }
        })
    }
}
