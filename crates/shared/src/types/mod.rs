//! Common types used across the workspace.

pub mod currency;
pub mod rounding;

pub use currency::{Currency, CurrencyDirectory, CurrencyRef, IsoDirectory};
pub use rounding::{Rounder, RoundingMode, round_to_subunit};
