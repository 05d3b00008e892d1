//! Conversions between store types and what the dashboard pages consume

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

use market_core::validation::{parse_date, parse_price};
use market_core::{
    normalize_label, NewObservation, ObservationPatch, PriceObservation, ValidationError,
    ValidationResult,
};
use market_price_store::AlignedSeries;

/// Price entry form, fields exactly as typed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceForm {
    pub name: String,
    pub price: String,
    pub region: String,
    /// `YYYY-MM-DD`; blank means today
    pub date: String,
    /// Blank means the configured default unit
    pub unit: String,
}

impl PriceForm {
    /// Parse a create submission
    pub fn to_new_observation(&self, today: NaiveDate, default_unit: &str) -> ValidationResult<NewObservation> {
        let name = required("name", &self.name)?;
        let region = required("region", &self.region)?;
        let price = parse_price(&self.price)?;
        let date = if self.date.trim().is_empty() {
            today
        } else {
            parse_date(&self.date)?
        };
        let unit = match self.unit.trim() {
            "" => default_unit,
            unit => unit,
        };

        Ok(NewObservation::new(name, price, region, date, unit))
    }

    /// Parse an edit submission; blank fields are left unchanged
    pub fn to_patch(&self) -> ValidationResult<ObservationPatch> {
        let mut patch = ObservationPatch::default();

        if let Some(name) = non_blank(&self.name) {
            patch = patch.commodity_name(name);
        }
        if let Some(region) = non_blank(&self.region) {
            patch = patch.region(region);
        }
        if let Some(unit) = non_blank(&self.unit) {
            patch = patch.unit(unit);
        }
        if non_blank(&self.price).is_some() {
            patch = patch.price(parse_price(&self.price)?);
        }
        if non_blank(&self.date).is_some() {
            patch = patch.observed_date(parse_date(&self.date)?);
        }

        Ok(patch)
    }
}

/// Pre-fill the edit form
impl From<&PriceObservation> for PriceForm {
    fn from(obs: &PriceObservation) -> Self {
        Self {
            name: obs.commodity_name.clone(),
            price: obs.price.to_string(),
            region: obs.region.clone(),
            date: obs.observed_date.to_string(),
            unit: obs.unit.clone(),
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn required<'a>(field: &'static str, value: &'a str) -> ValidationResult<&'a str> {
    non_blank(value).ok_or(ValidationError::EmptyField(field))
}

/// Latest prices of one commodity across regions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommodityGroup {
    pub commodity_name: String,
    pub prices: Vec<PriceObservation>,
}

/// Group observations by commodity, keeping their relative order
pub fn group_by_commodity(observations: Vec<PriceObservation>) -> Vec<CommodityGroup> {
    let mut groups: BTreeMap<String, CommodityGroup> = BTreeMap::new();

    for obs in observations {
        groups
            .entry(normalize_label(&obs.commodity_name))
            .or_insert_with(|| CommodityGroup {
                commodity_name: obs.commodity_name.clone(),
                prices: Vec::new(),
            })
            .prices
            .push(obs);
    }

    groups.into_values().collect()
}

/// One x-axis point of the trend chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// Axis label, e.g. "Mar 4"
    pub label: String,
    pub values: BTreeMap<String, Decimal>,
}

/// Chart-ready trend comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChart {
    pub region: String,
    /// Line order
    pub commodities: Vec<String>,
    pub points: Vec<TrendPoint>,
}

impl TrendChart {
    /// Nothing to draw: callers show a "no data" message instead
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Axis label for `date`; ISO `YYYY-MM-DD` when `date_format` does not render
fn axis_label(date: NaiveDate, date_format: &str) -> String {
    let mut label = String::new();
    match write!(label, "{}", date.format(date_format)) {
        Ok(()) => label,
        Err(_) => date.to_string(),
    }
}

/// Convert an aligned table into chart points with formatted labels
pub fn trend_chart(series: &AlignedSeries, date_format: &str) -> TrendChart {
    let points = series
        .rows
        .iter()
        .map(|row| TrendPoint {
            date: row.date,
            label: axis_label(row.date, date_format),
            values: series
                .commodities
                .iter()
                .cloned()
                .zip(row.values.iter().copied())
                .collect(),
        })
        .collect();

    TrendChart {
        region: series.region.clone(),
        commodities: series.commodities.clone(),
        points,
    }
}
