//! Operations shared by `Money` and any type wrapping it.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use moneta_shared::{CurrencyRef, MoneyError, MoneyResult};

use super::Money;
use super::allocation;
use super::operand::{DivMod, Operand, Quotient};
use crate::policy::Policy;
use crate::rounding::Rounding;

/// A value that is money, or wraps money.
///
/// Implementors supply `as_money` and `rebuild`; every operation is provided
/// and returns `Self`, so a wrapper's operations return the wrapper.
///
/// Numeric divisors in `divmod`, `modulo`, and `remainder` apply to the
/// amount in subunits, as in `0.13 USD divmod 4 = (0.03 USD, 0.01 USD)`.
pub trait Monetary: Clone {
    /// The wrapped money.
    fn as_money(&self) -> &Money;

    /// Wraps an operation's result in the implementing type.
    fn rebuild(&self, money: Money) -> Self;

    /// The amount with its sign flipped; `-0` is `0`.
    fn negate(&self) -> Self {
        let money = self.as_money();
        self.rebuild(money.with_amount(-money.amount()))
    }

    /// Absolute value.
    fn abs(&self) -> Self {
        let money = self.as_money();
        self.rebuild(money.with_amount(money.amount().abs()))
    }

    /// Returns true if the amount is zero.
    fn is_zero(&self) -> bool {
        self.as_money().amount().is_zero()
    }

    /// Returns true if the amount is greater than zero.
    fn is_positive(&self) -> bool {
        self.as_money().amount() > Decimal::ZERO
    }

    /// Returns true if the amount is less than zero.
    fn is_negative(&self) -> bool {
        self.as_money().amount() < Decimal::ZERO
    }

    /// `Some(self)` unless the amount is zero.
    fn nonzero(&self) -> Option<&Self> {
        (!self.is_zero()).then_some(self)
    }

    /// Sum in this value's currency.
    ///
    /// # Errors
    ///
    /// `Type` for a numeric operand; `DifferentCurrency` or `UnknownRate`
    /// when a differing currency cannot be converted.
    fn add<'o>(&self, other: impl Into<Operand<'o>>) -> MoneyResult<Self> {
        let money = self.as_money();
        let other = money_operand(other.into(), "add")?;
        let other = money.counterpart(other)?;
        let sum = money
            .amount()
            .checked_add(other.amount())
            .ok_or(MoneyError::Overflow)?;
        Ok(self.rebuild(money.with_amount(sum)))
    }

    /// Difference in this value's currency; errors as `add`.
    fn subtract<'o>(&self, other: impl Into<Operand<'o>>) -> MoneyResult<Self> {
        let money = self.as_money();
        let other = money_operand(other.into(), "subtract")?;
        let other = money.counterpart(other)?;
        let difference = money
            .amount()
            .checked_sub(other.amount())
            .ok_or(MoneyError::Overflow)?;
        Ok(self.rebuild(money.with_amount(difference)))
    }

    /// Scales by a number. Multiplying money by money is a `Type` error.
    fn multiply<'o>(&self, factor: impl Into<Operand<'o>>) -> MoneyResult<Self> {
        let money = self.as_money();
        let factor = match factor.into() {
            Operand::Number(factor) => factor,
            Operand::Money(other) => {
                return Err(MoneyError::Type(format!(
                    "can't multiply {} by {}: money times money is not money",
                    money.currency(),
                    other.currency()
                )));
            }
        };
        let product = money
            .amount()
            .checked_mul(factor)
            .ok_or(MoneyError::Overflow)?;
        Ok(self.rebuild(money.with_amount(product)))
    }

    /// `divide_with` and no per-call rounding.
    fn divide<'o>(&self, divisor: impl Into<Operand<'o>>) -> MoneyResult<Quotient<Self>> {
        self.divide_with(divisor, Rounding::none())
    }

    /// Alias of `divide`.
    fn div<'o>(&self, divisor: impl Into<Operand<'o>>) -> MoneyResult<Quotient<Self>> {
        self.divide(divisor)
    }

    /// Divides by a number (giving money) or by money (giving a ratio).
    ///
    /// A numeric quotient is rounded onto the subunit grid by `rounding`,
    /// then the policy's default mode, then truncation. Under infinite
    /// precision only an explicit `rounding` applies; otherwise it is kept
    /// exact.
    fn divide_with<'o>(
        &self,
        divisor: impl Into<Operand<'o>>,
        rounding: Rounding<'_>,
    ) -> MoneyResult<Quotient<Self>> {
        let money = self.as_money();
        match divisor.into() {
            Operand::Number(divisor) => {
                let raw = checked_div(money.amount(), divisor)?;
                let amount = rounding.resolve(raw, money.currency(), None, &Policy::current());
                Ok(Quotient::Money(self.rebuild(money.with_amount(amount))))
            }
            Operand::Money(other) => {
                let other = money.counterpart(other)?;
                Ok(Quotient::Ratio(checked_div(money.amount(), other.amount())?))
            }
        }
    }

    /// Floored division: the remainder takes the divisor's sign.
    fn divmod<'o>(&self, divisor: impl Into<Operand<'o>>) -> MoneyResult<DivMod<Self>> {
        let money = self.as_money();
        let units = money.subunits()?;
        match divisor.into() {
            Operand::Number(divisor) => {
                let (quotient, remainder) = floor_divmod(units, divisor)?;
                Ok(DivMod::Money {
                    quotient: self.rebuild(money.with_subunits(quotient)?),
                    remainder: self.rebuild(money.with_subunits(remainder)?),
                })
            }
            Operand::Money(other) => {
                let other = money.counterpart(other)?;
                let (quotient, remainder) = floor_divmod(units, other.subunits()?)?;
                Ok(DivMod::Count {
                    quotient: quotient.to_i128().ok_or(MoneyError::Overflow)?,
                    remainder: self.rebuild(money.with_subunits(remainder)?),
                })
            }
        }
    }

    /// Remainder of `divmod`; also available as the `%` operator.
    fn modulo<'o>(&self, divisor: impl Into<Operand<'o>>) -> MoneyResult<Self> {
        Ok(self.divmod(divisor)?.into_remainder())
    }

    /// Truncated division remainder: takes the dividend's sign.
    fn remainder<'o>(&self, divisor: impl Into<Operand<'o>>) -> MoneyResult<Self> {
        let money = self.as_money();
        let units = money.subunits()?;
        let divisor = match divisor.into() {
            Operand::Number(divisor) => divisor,
            Operand::Money(other) => money.counterpart(other)?.subunits()?,
        };
        let remainder = truncated_rem(units, divisor)?;
        Ok(self.rebuild(money.with_subunits(remainder)?))
    }

    /// Orders two amounts after converting `other` into this currency.
    ///
    /// `Ok(None)` when `other` is a number or no rate is known. Other
    /// failures, including `DifferentCurrency`, are returned.
    fn compare<'o>(&self, other: impl Into<Operand<'o>>) -> MoneyResult<Option<Ordering>> {
        let money = self.as_money();
        let Operand::Money(other) = other.into() else {
            return Ok(None);
        };
        match money.counterpart(other) {
            Ok(other) => Ok(Some(money.amount().cmp(&other.amount()))),
            Err(MoneyError::UnknownRate { from, to }) => {
                debug!(%from, %to, "amounts are incomparable without a rate");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// `==` semantics: zero equals zero in any currency.
    fn equals(&self, other: &impl Monetary) -> bool {
        self.as_money() == other.as_money()
    }

    /// Strict equality: same currency and amount, zero included.
    fn eql(&self, other: &impl Monetary) -> bool {
        let (a, b) = (self.as_money(), other.as_money());
        a.currency() == b.currency() && a.amount() == b.amount()
    }

    /// Converts through this value's bank.
    fn exchange_to<'c>(&self, target: impl Into<CurrencyRef<'c>>) -> MoneyResult<Self> {
        self.exchange_to_with(target, Rounding::none())
    }

    /// `exchange_to` with per-call rounding.
    fn exchange_to_with<'c>(
        &self,
        target: impl Into<CurrencyRef<'c>>,
        rounding: Rounding<'_>,
    ) -> MoneyResult<Self> {
        let money = self.as_money();
        let converted = money.bank().exchange_with(money, target.into(), rounding)?;
        Ok(self.rebuild(converted))
    }

    /// Splits the amount in proportion to `ratios`; the parts sum exactly to it.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `ratios` is empty, has a negative entry, or sums to zero.
    fn allocate(&self, ratios: &[Decimal]) -> MoneyResult<Vec<Self>> {
        let money = self.as_money();
        let amounts = if Policy::current().infinite_precision() {
            allocation::allocate_exact(money.amount(), ratios)?
        } else {
            allocation::allocate_units(money.subunits()?, ratios)?
                .into_iter()
                .map(|units| money.with_subunits(units).map(|part| part.amount()))
                .collect::<MoneyResult<_>>()?
        };
        Ok(amounts
            .into_iter()
            .map(|amount| self.rebuild(money.with_amount(amount)))
            .collect())
    }

    /// Splits into `parts` equal shares, earlier shares taking any extra subunits.
    fn split(&self, parts: usize) -> MoneyResult<Vec<Self>> {
        if parts == 0 {
            return Err(MoneyError::InvalidArgument(
                "cannot split money into zero parts".to_string(),
            ));
        }
        self.allocate(&vec![Decimal::ONE; parts])
    }
}

fn money_operand<'o>(operand: Operand<'o>, op: &str) -> MoneyResult<&'o Money> {
    match operand {
        Operand::Money(money) => Ok(money),
        Operand::Number(number) => Err(MoneyError::Type(format!(
            "can't {op} a bare number ({number}) and money"
        ))),
    }
}

fn checked_div(dividend: Decimal, divisor: Decimal) -> MoneyResult<Decimal> {
    if divisor.is_zero() {
        return Err(MoneyError::DivisionByZero);
    }
    dividend.checked_div(divisor).ok_or(MoneyError::Overflow)
}

fn truncated_rem(dividend: Decimal, divisor: Decimal) -> MoneyResult<Decimal> {
    if divisor.is_zero() {
        return Err(MoneyError::DivisionByZero);
    }
    dividend.checked_rem(divisor).ok_or(MoneyError::Overflow)
}

fn floor_divmod(dividend: Decimal, divisor: Decimal) -> MoneyResult<(Decimal, Decimal)> {
    let mut remainder = truncated_rem(dividend, divisor)?;
    if !remainder.is_zero() && remainder.is_sign_negative() != divisor.is_sign_negative() {
        remainder = remainder.checked_add(divisor).ok_or(MoneyError::Overflow)?;
    }
    let quotient = dividend
        .checked_sub(remainder)
        .and_then(|exact| exact.checked_div(divisor))
        .ok_or(MoneyError::Overflow)?
        .round();
    Ok((quotient, remainder))
}
