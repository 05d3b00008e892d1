//! Input validation for observation writes
//!
//! Form input arrives as strings; `parse_price` and `parse_date` turn it into
//! typed values, and `validate_new` / `validate_patch` check the invariants a
//! stored observation must hold.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::{NewObservation, ObservationPatch, ValidationError, ValidationResult};

pub fn validate_new(obs: &NewObservation) -> ValidationResult<()> {
    require_label("commodity_name", &obs.commodity_name)?;
    require_label("region", &obs.region)?;
    require_label("unit", &obs.unit)?;
    require_non_negative(obs.price)
}

/// Only the supplied fields are checked
pub fn validate_patch(patch: &ObservationPatch) -> ValidationResult<()> {
    if let Some(name) = &patch.commodity_name {
        require_label("commodity_name", name)?;
    }
    if let Some(region) = &patch.region {
        require_label("region", region)?;
    }
    if let Some(unit) = &patch.unit {
        require_label("unit", unit)?;
    }
    if let Some(price) = patch.price {
        require_non_negative(price)?;
    }
    Ok(())
}

pub fn parse_price(input: &str) -> ValidationResult<Decimal> {
    let trimmed = input.trim();
    let price = Decimal::from_str(trimmed)
        .map_err(|_| ValidationError::InvalidPrice(input.to_string()))?;
    require_non_negative(price)?;
    Ok(price)
}

pub fn parse_date(input: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}

fn require_label(field: &'static str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

fn require_non_negative(price: Decimal) -> ValidationResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::NegativePrice(price.to_string()));
    }
    Ok(())
}
