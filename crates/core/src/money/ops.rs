//! Operator sugar over `Monetary`.
//!
//! Operators are implemented on `&Money` and return `MoneyResult`, so the
//! same contracts apply as the named methods: `&a + &b`, `&a * 3`,
//! `&a / dec!(2)`, `&a % 4`. A number on the left (`dec!(2) * &a`) is always a
//! `Type` error.

use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

use rust_decimal::Decimal;

use moneta_shared::MoneyResult;

use super::monetary::Monetary;
use super::operand::{Operand, Quotient};
use super::Money;

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        self.negate()
    }
}

impl Neg for &Money {
    type Output = Money;

    fn neg(self) -> Money {
        self.negate()
    }
}

impl<'o, R: Into<Operand<'o>>> Add<R> for &Money {
    type Output = MoneyResult<Money>;

    fn add(self, rhs: R) -> Self::Output {
        Monetary::add(self, rhs)
    }
}

impl<'o, R: Into<Operand<'o>>> Sub<R> for &Money {
    type Output = MoneyResult<Money>;

    fn sub(self, rhs: R) -> Self::Output {
        self.subtract(rhs)
    }
}

impl<'o, R: Into<Operand<'o>>> Mul<R> for &Money {
    type Output = MoneyResult<Money>;

    fn mul(self, rhs: R) -> Self::Output {
        self.multiply(rhs)
    }
}

impl<'o, R: Into<Operand<'o>>> Div<R> for &Money {
    type Output = MoneyResult<Quotient<Money>>;

    fn div(self, rhs: R) -> Self::Output {
        self.divide(rhs)
    }
}

impl<'o, R: Into<Operand<'o>>> Rem<R> for &Money {
    type Output = MoneyResult<Money>;

    fn rem(self, rhs: R) -> Self::Output {
        self.modulo(rhs)
    }
}

macro_rules! number_on_the_left {
    ($($trait:ident :: $method:ident => $coerced:ident),* $(,)?) => {
        $(
            impl $trait<&Money> for Decimal {
                type Output = MoneyResult<Money>;

                fn $method(self, rhs: &Money) -> Self::Output {
                    Money::coerce(self).$coerced(rhs)
                }
            }
        )*
    };
}

number_on_the_left!(
    Add::add => add,
    Sub::sub => subtract,
    Mul::mul => multiply,
    Div::div => divide,
    Rem::rem => modulo,
);
