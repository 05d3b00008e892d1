//! Core type definitions

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a price observation, never reused within a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationId(pub u64);

impl ObservationId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obs_{}", self.0)
    }
}

/// One reported price for one commodity, in one region, on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub id: ObservationId,
    pub commodity_name: String,
    pub price: Decimal,
    pub region: String,
    pub observed_date: NaiveDate,
    pub unit: String,
}

impl PriceObservation {
    /// Grouping key with case normalized
    pub fn key(&self) -> ObservationKey {
        ObservationKey::new(&self.commodity_name, &self.region)
    }
}

/// Observation fields supplied on insert; the store assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewObservation {
    pub commodity_name: String,
    pub price: Decimal,
    pub region: String,
    pub observed_date: NaiveDate,
    pub unit: String,
}

impl NewObservation {
    pub fn new(
        commodity_name: &str,
        price: Decimal,
        region: &str,
        observed_date: NaiveDate,
        unit: &str,
    ) -> Self {
        Self {
            commodity_name: commodity_name.to_string(),
            price,
            region: region.to_string(),
            observed_date,
            unit: unit.to_string(),
        }
    }

    pub fn with_id(self, id: ObservationId) -> PriceObservation {
        PriceObservation {
            id,
            commodity_name: self.commodity_name,
            price: self.price,
            region: self.region,
            observed_date: self.observed_date,
            unit: self.unit,
        }
    }
}

/// Partial update: only `Some` fields are applied. There is no id field,
/// so an update can never re-key a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationPatch {
    pub commodity_name: Option<String>,
    pub price: Option<Decimal>,
    pub region: Option<String>,
    pub observed_date: Option<NaiveDate>,
    pub unit: Option<String>,
}

impl ObservationPatch {
    pub fn is_empty(&self) -> bool {
        self.commodity_name.is_none()
            && self.price.is_none()
            && self.region.is_none()
            && self.observed_date.is_none()
            && self.unit.is_none()
    }

    pub fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn commodity_name(mut self, name: impl Into<String>) -> Self {
        self.commodity_name = Some(name.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn observed_date(mut self, date: NaiveDate) -> Self {
        self.observed_date = Some(date);
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Apply the supplied fields over `obs`
    pub fn apply_to(&self, obs: &mut PriceObservation) {
        if let Some(name) = &self.commodity_name {
            obs.commodity_name = name.clone();
        }
        if let Some(price) = self.price {
            obs.price = price;
        }
        if let Some(region) = &self.region {
            obs.region = region.clone();
        }
        if let Some(date) = self.observed_date {
            obs.observed_date = date;
        }
        if let Some(unit) = &self.unit {
            obs.unit = unit.clone();
        }
    }
}

/// Normalize a free-text label for grouping and lookups: surrounding
/// whitespace is dropped and the rest is lowercased
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Key for latest-price deduplication: (commodity, region), case-folded.
///
/// Surrounding whitespace is ignored, so `"Tomato "` and `" tomato"` share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObservationKey {
    pub commodity: String,
    pub region: String,
}

impl ObservationKey {
    pub fn new(commodity: &str, region: &str) -> Self {
        Self {
            commodity: normalize_label(commodity),
            region: normalize_label(region),
        }
    }
}
