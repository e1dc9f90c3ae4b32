//! Shared types, errors, and configuration for Moneta.
//!
//! This crate provides the leaf types used by the money core:
//! - The `Currency` value type and the currency directory it is resolved from
//! - Named rounding modes
//! - The error taxonomy shared by every layer
//! - Configuration loading for process-wide defaults

pub mod config;
pub mod error;
pub mod types;

pub use config::MoneyConfig;
pub use error::{MoneyError, MoneyResult};
pub use types::{
    Currency, CurrencyDirectory, CurrencyRef, IsoDirectory, Rounder, RoundingMode, round_to_subunit,
};
