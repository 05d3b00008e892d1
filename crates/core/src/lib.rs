//! Core types and utilities for the market price tracker
//!
//! This crate provides shared types used across all components:
//! - Price observations and their write inputs
//! - Error types
//! - Configuration
//! - Input validation and listing filters

pub mod types;
pub mod config;
pub mod errors;
pub mod filters;
pub mod validation;

pub use types::*;
pub use config::*;
pub use errors::*;
pub use filters::*;
