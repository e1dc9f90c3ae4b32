//! Money arithmetic and currency exchange for Moneta.
//!
//! This crate contains the monetary value type and the exchange subsystem it
//! converts through. Currency metadata, errors, and configuration come from
//! `moneta-shared`.
//!
//! # Modules
//!
//! - `money` - The `Money` value type and its arithmetic
//! - `exchange` - Rate store, rate codecs, and banks
//! - `rounding` - Per-call rounding and the rounding precedence
//! - `policy` - Process-wide defaults with thread-scoped overrides

pub mod exchange;
pub mod money;
pub mod policy;
pub mod rounding;

pub use exchange::{
    Bank, CodecRegistry, ExchangeRate, RateCodec, RateSnapshot, RateStore, RateTable,
    RateTransaction, VariableExchange, default_bank,
};
pub use money::{Coerced, DivMod, Monetary, Money, Operand, Quotient};
pub use policy::{
    ConversionPolicy, Policy, PolicyGuard, allow_currency_conversion,
    disallow_currency_conversion,
};
pub use rounding::Rounding;

pub use moneta_shared::{
    Currency, CurrencyDirectory, CurrencyRef, IsoDirectory, MoneyConfig, MoneyError, MoneyResult,
    Rounder, RoundingMode,
};
