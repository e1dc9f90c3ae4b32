//! Right-hand operands and the results of division.

use rust_decimal::Decimal;

use super::Money;
use super::monetary::Monetary;

/// The right-hand side of a monetary operation.
///
/// Built implicitly from `&Money` (or any `Monetary`) and from numbers, so
/// `a.add(&b)`, `a.multiply(3)`, and `a.divide(dec!(2.5))` all type-check;
/// each operation then rejects the kinds it does not accept.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    /// A monetary amount.
    Money(&'a Money),
    /// A dimensionless number.
    Number(Decimal),
}

impl<'a, M: Monetary> From<&'a M> for Operand<'a> {
    fn from(money: &'a M) -> Self {
        Self::Money(money.as_money())
    }
}

impl From<Decimal> for Operand<'_> {
    fn from(number: Decimal) -> Self {
        Self::Number(number)
    }
}

macro_rules! operand_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Operand<'_> {
                fn from(number: $ty) -> Self {
                    Self::Number(Decimal::from(number))
                }
            }
        )*
    };
}

operand_from_int!(i32, i64, u32, u64, usize);

/// Result of `divide`: money for a numeric divisor, a ratio for a money divisor.
#[derive(Debug, Clone, PartialEq)]
pub enum Quotient<M> {
    /// Money divided by a number.
    Money(M),
    /// Money divided by money; carries no currency.
    Ratio(Decimal),
}

impl<M> Quotient<M> {
    /// The monetary quotient, if the divisor was a number.
    pub fn money(self) -> Option<M> {
        match self {
            Self::Money(money) => Some(money),
            Self::Ratio(_) => None,
        }
    }

    /// The ratio, if the divisor was money.
    pub fn ratio(self) -> Option<Decimal> {
        match self {
            Self::Ratio(ratio) => Some(ratio),
            Self::Money(_) => None,
        }
    }
}

/// Result of `divmod` under floored division.
#[derive(Debug, Clone, PartialEq)]
pub enum DivMod<M> {
    /// Numeric divisor: quotient and remainder are money.
    Money {
        /// Floored quotient.
        quotient: M,
        /// Remainder, with the sign of the divisor.
        remainder: M,
    },
    /// Money divisor: the quotient is a plain count.
    Count {
        /// Floored quotient.
        quotient: i128,
        /// Remainder, with the sign of the divisor.
        remainder: M,
    },
}

impl<M> DivMod<M> {
    /// The remainder, whichever the divisor kind.
    pub fn remainder(&self) -> &M {
        match self {
            Self::Money { remainder, .. } | Self::Count { remainder, .. } => remainder,
        }
    }

    /// Consumes the result, keeping the remainder.
    pub fn into_remainder(self) -> M {
        match self {
            Self::Money { remainder, .. } | Self::Count { remainder, .. } => remainder,
        }
    }
}
