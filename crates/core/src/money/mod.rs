//! The money value type.
//!
//! `Money` pairs an exact decimal amount (in major units) with a currency and
//! the bank it converts through. Amounts sit on the currency's subunit grid
//! unless the policy enables infinite precision. Operations live on the
//! `Monetary` trait so wrapper types get them with their own return type.

mod allocation;
mod monetary;
mod operand;
mod ops;

#[cfg(test)]
mod props;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;

use moneta_shared::types::currency::{EUR, GBP, JPY, USD};
use moneta_shared::{Currency, CurrencyRef, MoneyError, MoneyResult, Rounder};

use crate::exchange::Bank;
use crate::policy::{ConversionPolicy, Policy};
use crate::rounding::{Rounding, native_round};

pub use monetary::Monetary;
pub use operand::{DivMod, Operand, Quotient};

/// An immutable amount of a currency.
#[derive(Clone)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
    bank: Arc<dyn Bank>,
}

impl Money {
    /// Creates money using the current policy's default bank.
    ///
    /// The amount is rounded onto the currency's subunit grid with the
    /// policy's default mode (truncation if none) unless infinite precision
    /// is enabled.
    pub fn new(amount: impl Into<Decimal>, currency: Currency) -> Self {
        let policy = Policy::current();
        let bank = Arc::clone(policy.default_bank());
        Self::build(amount.into(), currency, bank, &policy)
    }

    /// Creates money that converts through `bank`.
    pub fn with_bank(amount: impl Into<Decimal>, currency: Currency, bank: Arc<dyn Bank>) -> Self {
        Self::build(amount.into(), currency, bank, &Policy::current())
    }

    /// Creates money from a currency identifier, resolved by the default bank.
    pub fn from_code(amount: impl Into<Decimal>, code: &str) -> MoneyResult<Self> {
        let policy = Policy::current();
        let bank = Arc::clone(policy.default_bank());
        let currency = bank.directory().resolve(code)?;
        Ok(Self::build(amount.into(), currency, bank, &policy))
    }

    /// Creates money from a count of subunits (cents for USD).
    pub fn from_subunits(subunits: impl Into<Decimal>, currency: Currency) -> MoneyResult<Self> {
        let amount = subunits
            .into()
            .checked_div(currency.subunit_scale())
            .ok_or(MoneyError::DivisionByZero)?;
        Ok(Self::new(amount, currency))
    }

    /// Zero of `currency`.
    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// US dollars.
    pub fn usd(amount: impl Into<Decimal>) -> Self {
        Self::new(amount, USD)
    }

    /// Euros.
    pub fn eur(amount: impl Into<Decimal>) -> Self {
        Self::new(amount, EUR)
    }

    /// Pounds sterling.
    pub fn gbp(amount: impl Into<Decimal>) -> Self {
        Self::new(amount, GBP)
    }

    /// Japanese yen.
    pub fn jpy(amount: impl Into<Decimal>) -> Self {
        Self::new(amount, JPY)
    }

    /// Amount in major units.
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Currency of the amount.
    pub const fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Bank used for conversions involving this value.
    pub fn bank(&self) -> &Arc<dyn Bank> {
        &self.bank
    }

    /// Amount in subunits.
    pub fn subunits(&self) -> MoneyResult<Decimal> {
        self.amount
            .checked_mul(self.currency.subunit_scale())
            .ok_or(MoneyError::Overflow)
    }

    /// Wraps a bare number appearing on the left of a monetary operation.
    ///
    /// Every operation on the result fails: numbers never act as the left
    /// operand of money arithmetic or comparison.
    pub fn coerce(lhs: impl Into<Decimal>) -> Coerced {
        Coerced { value: lhs.into() }
    }

    /// Same bank and currency, different amount.
    pub(crate) fn with_amount(&self, amount: Decimal) -> Self {
        self.with_amount_in(amount, self.currency)
    }

    /// Same bank, new amount and currency.
    pub(crate) fn with_amount_in(&self, amount: Decimal, currency: Currency) -> Self {
        Self::build(amount, currency, Arc::clone(&self.bank), &Policy::current())
    }

    pub(crate) fn with_subunits(&self, subunits: Decimal) -> MoneyResult<Self> {
        let amount = subunits
            .checked_div(self.currency.subunit_scale())
            .ok_or(MoneyError::DivisionByZero)?;
        Ok(self.with_amount(amount))
    }

    /// `other` expressed in this value's currency, converted with `other`'s bank.
    pub(crate) fn counterpart(&self, other: &Self) -> MoneyResult<Self> {
        if other.currency == self.currency {
            return Ok(other.clone());
        }
        if Policy::current().conversions() == ConversionPolicy::Disallowed {
            return Err(MoneyError::different_currency(
                self.currency.code(),
                other.currency.code(),
            ));
        }
        other
            .bank
            .exchange_with(other, CurrencyRef::Currency(self.currency), Rounding::none())
    }

    fn build(amount: Decimal, currency: Currency, bank: Arc<dyn Bank>, policy: &Policy) -> Self {
        let amount = if policy.infinite_precision() {
            amount
        } else {
            match policy.rounding_mode() {
                Some(mode) => mode.apply(amount, &currency),
                None => native_round(amount, &currency),
            }
        };
        Self {
            amount,
            currency,
            bank,
        }
    }
}

impl fmt::Debug for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Money")
            .field("amount", &self.amount)
            .field("currency", &self.currency.code())
            .finish_non_exhaustive()
    }
}

/// Equal amounts of the same currency, or two zero amounts of any currencies.
impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        (self.currency == other.currency && self.amount == other.amount)
            || (self.amount.is_zero() && other.amount.is_zero())
    }
}

/// Money never equals a bare number.
impl PartialEq<Decimal> for Money {
    fn eq(&self, _other: &Decimal) -> bool {
        false
    }
}

impl Monetary for Money {
    fn as_money(&self) -> &Money {
        self
    }

    fn rebuild(&self, money: Money) -> Self {
        money
    }
}

/// A bare number standing on the left of a monetary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coerced {
    value: Decimal,
}

impl Coerced {
    /// The wrapped number.
    pub const fn value(&self) -> Decimal {
        self.value
    }

    /// Always fails with `Type`; likewise the other arithmetic methods.
    pub fn add(&self, rhs: &Money) -> MoneyResult<Money> {
        Err(self.type_error("+", rhs))
    }

    pub fn subtract(&self, rhs: &Money) -> MoneyResult<Money> {
        Err(self.type_error("-", rhs))
    }

    pub fn multiply(&self, rhs: &Money) -> MoneyResult<Money> {
        Err(self.type_error("*", rhs))
    }

    pub fn divide(&self, rhs: &Money) -> MoneyResult<Money> {
        Err(self.type_error("/", rhs))
    }

    pub fn modulo(&self, rhs: &Money) -> MoneyResult<Money> {
        Err(self.type_error("%", rhs))
    }

    /// Always fails with `InvalidArgument`.
    pub fn compare(&self, rhs: &Money) -> MoneyResult<Ordering> {
        Err(MoneyError::InvalidArgument(format!(
            "comparison of {} with {} {} failed",
            self.value,
            rhs.amount,
            rhs.currency.code()
        )))
    }

    fn type_error(&self, op: &str, rhs: &Money) -> MoneyError {
        MoneyError::Type(format!(
            "{} {op} {} {}: a number cannot be the left operand of money",
            self.value,
            rhs.amount,
            rhs.currency.code()
        ))
    }
}
