//! The bank abstraction money converts through.

use std::fmt;

use rust_decimal::Decimal;

use moneta_shared::{Currency, CurrencyDirectory, CurrencyRef, MoneyResult, Rounder};

use crate::money::Money;
use crate::policy::Policy;
use crate::rounding::Rounding;

/// Converts money between currencies.
///
/// Implementations must be shareable across threads; any mutable state
/// (such as a rate table) synchronizes internally.
pub trait Bank: fmt::Debug + Send + Sync {
    /// Converts `from` into `to`, rounding the full-precision result.
    ///
    /// Converting into the value's own currency returns it unchanged.
    ///
    /// # Errors
    ///
    /// `UnknownCurrency` if `to` does not resolve, `UnknownRate` if the pair
    /// has no rate.
    fn exchange_with(
        &self,
        from: &Money,
        to: CurrencyRef<'_>,
        rounding: Rounding<'_>,
    ) -> MoneyResult<Money>;

    /// Directory used to resolve currency identifiers.
    fn directory(&self) -> &dyn CurrencyDirectory;

    /// Rounder supplied when the bank was built, if any.
    fn rounding_method(&self) -> Option<&dyn Rounder> {
        None
    }

    /// Returns true if both references resolve to the same currency.
    fn same_currency(&self, a: CurrencyRef<'_>, b: CurrencyRef<'_>) -> MoneyResult<bool> {
        self.directory().same_currency(a, b)
    }

    /// Applies the rounding precedence with this bank's rounder as fallback.
    fn round(&self, value: Decimal, currency: &Currency, rounding: Rounding<'_>) -> Decimal {
        rounding.resolve(value, currency, self.rounding_method(), &Policy::current())
    }
}
