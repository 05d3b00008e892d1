//! Error types

use thiserror::Error;

use crate::ObservationId;

/// Malformed observation input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Price must not be negative: {0}")]
    NegativePrice(String),

    #[error("Required field is empty: {0}")]
    EmptyField(&'static str),

    #[error("Invalid price: {0:?}")]
    InvalidPrice(String),

    #[error("Invalid date (expected YYYY-MM-DD): {0:?}")]
    InvalidDate(String),
}

/// Settings that would fail at seed or render time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Seed price range [{min}, {max}) must be non-empty and non-negative")]
    PriceRange { min: i64, max: i64 },

    #[error("Seed window of {0} days is too long")]
    SeedWindow(u32),

    #[error("Invalid chart date format: {0:?}")]
    DateFormat(String),

    #[error("Default unit must not be empty")]
    EmptyDefaultUnit,
}

/// Price store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Observation not found: {0}")]
    NotFound(ObservationId),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result type alias
pub type StoreResult<T> = Result<T, StoreError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
