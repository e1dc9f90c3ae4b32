//! Exchange rate entries and their import/export keys.

use rust_decimal::Decimal;

use moneta_shared::{Currency, MoneyError, MoneyResult};

/// Separator between the two codes of a rate key, as in `USD_TO_EUR`.
pub const KEY_SEPARATOR: &str = "_TO_";

/// Exchange rate between two currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeRate {
    /// Source currency.
    pub from: Currency,
    /// Target currency.
    pub to: Currency,
    /// Exchange rate (1 from = rate to).
    pub rate: Decimal,
}

impl ExchangeRate {
    /// Creates a new exchange rate.
    #[must_use]
    pub const fn new(from: Currency, to: Currency, rate: Decimal) -> Self {
        Self { from, to, rate }
    }

    /// Key used by the rate codecs.
    #[must_use]
    pub fn key(&self) -> String {
        rate_key(self.from.code(), self.to.code())
    }

    /// Returns the inverse rate.
    ///
    /// # Errors
    ///
    /// Returns `DivisionByZero` for a zero rate; stored rates are always positive.
    pub fn inverse(&self) -> MoneyResult<Self> {
        let rate = Decimal::ONE
            .checked_div(self.rate)
            .ok_or(MoneyError::DivisionByZero)?;
        Ok(Self::new(self.to, self.from, rate))
    }
}

/// Builds the `FROM_TO_TO` key for a currency pair, uppercasing both codes.
#[must_use]
pub fn rate_key(from: &str, to: &str) -> String {
    format!(
        "{}{KEY_SEPARATOR}{}",
        from.to_uppercase(),
        to.to_uppercase()
    )
}

/// Splits a `FROM_TO_TO` key into its two codes.
pub fn parse_rate_key(key: &str) -> MoneyResult<(&str, &str)> {
    match key.split_once(KEY_SEPARATOR) {
        Some((from, to)) if !from.is_empty() && !to.is_empty() => Ok((from, to)),
        _ => Err(MoneyError::Codec(format!("malformed rate key '{key}'"))),
    }
}
