//! Named rounding modes and the rounding strategy interface.
//!
//! Each mode maps onto a `rust_decimal::RoundingStrategy`. "Half" modes only
//! differ on exact midpoints; the others are directional.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::currency::Currency;

/// A named strategy for mapping a value onto the nearest representable subunit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Toward positive infinity.
    Ceiling,
    /// Toward negative infinity.
    Floor,
    /// Nearest, midpoints away from zero.
    HalfUp,
    /// Nearest, midpoints toward zero.
    HalfDown,
    /// Nearest, midpoints to the even neighbour (banker's rounding).
    HalfEven,
    /// Away from zero.
    Up,
    /// Toward zero (truncation).
    Down,
}

impl RoundingMode {
    /// Returns the matching `rust_decimal` strategy.
    #[must_use]
    pub const fn strategy(self) -> RoundingStrategy {
        match self {
            Self::Ceiling => RoundingStrategy::ToPositiveInfinity,
            Self::Floor => RoundingStrategy::ToNegativeInfinity,
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Self::HalfDown => RoundingStrategy::MidpointTowardZero,
            Self::HalfEven => RoundingStrategy::MidpointNearestEven,
            Self::Up => RoundingStrategy::AwayFromZero,
            Self::Down => RoundingStrategy::ToZero,
        }
    }

    /// Returns the snake_case name used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ceiling => "ceiling",
            Self::Floor => "floor",
            Self::HalfUp => "half_up",
            Self::HalfDown => "half_down",
            Self::HalfEven => "half_even",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl std::fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoundingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "ceiling" | "ceil" => Ok(Self::Ceiling),
            "floor" => Ok(Self::Floor),
            "half_up" => Ok(Self::HalfUp),
            "half_down" => Ok(Self::HalfDown),
            "half_even" | "bankers" => Ok(Self::HalfEven),
            "up" => Ok(Self::Up),
            "down" | "truncate" => Ok(Self::Down),
            _ => Err(format!("Unknown rounding mode: {s}")),
        }
    }
}

/// Maps a full-precision value onto a currency's representable amounts.
///
/// Implemented by every `RoundingMode` and by any
/// `Fn(Decimal, &Currency) -> Decimal` closure, which is the escape hatch for
/// caller-supplied rounding.
pub trait Rounder: Send + Sync {
    /// Rounds `value` for `currency`.
    fn apply(&self, value: Decimal, currency: &Currency) -> Decimal;
}

impl Rounder for RoundingMode {
    fn apply(&self, value: Decimal, currency: &Currency) -> Decimal {
        round_to_subunit(value, currency, self.strategy())
    }
}

impl<F> Rounder for F
where
    F: Fn(Decimal, &Currency) -> Decimal + Send + Sync,
{
    fn apply(&self, value: Decimal, currency: &Currency) -> Decimal {
        self(value, currency)
    }
}

/// Rounds `value` onto the grid of `1 / subunit_to_unit` using `strategy`.
///
/// For power-of-ten currencies this is rounding to `decimal_places`. Values
/// too large to scale fall back to rounding at `decimal_places`.
#[must_use]
pub fn round_to_subunit(value: Decimal, currency: &Currency, strategy: RoundingStrategy) -> Decimal {
    let places = currency.decimal_places();
    let scale = currency.subunit_scale();
    let power_of_ten = 10u64
        .checked_pow(places)
        .is_some_and(|p| p == u64::from(currency.subunit_to_unit()));

    if power_of_ten || scale.is_zero() {
        return value.round_dp_with_strategy(places, strategy);
    }

    value
        .checked_mul(scale)
        .map(|scaled| scaled.round_dp_with_strategy(0, strategy))
        .and_then(|units| units.checked_div(scale))
        .unwrap_or_else(|| value.round_dp_with_strategy(places, strategy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::currency::{BHD, JPY, MGA, USD};
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[rstest]
    #[case(RoundingMode::Ceiling, dec!(0.125), dec!(0.13))]
    #[case(RoundingMode::Ceiling, dec!(-0.125), dec!(-0.12))]
    #[case(RoundingMode::Floor, dec!(0.125), dec!(0.12))]
    #[case(RoundingMode::Floor, dec!(-0.125), dec!(-0.13))]
    #[case(RoundingMode::HalfUp, dec!(0.125), dec!(0.13))]
    #[case(RoundingMode::HalfUp, dec!(-0.125), dec!(-0.13))]
    #[case(RoundingMode::HalfDown, dec!(0.125), dec!(0.12))]
    #[case(RoundingMode::HalfEven, dec!(0.125), dec!(0.12))]
    #[case(RoundingMode::HalfEven, dec!(0.135), dec!(0.14))]
    #[case(RoundingMode::Up, dec!(0.121), dec!(0.13))]
    #[case(RoundingMode::Down, dec!(0.129), dec!(0.12))]
    fn test_strategy_rounding(
        #[case] mode: RoundingMode,
        #[case] value: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(value.round_dp_with_strategy(2, mode.strategy()), expected);
    }

    #[test]
    fn test_from_str_round_trip() {
        for mode in [
            RoundingMode::Ceiling,
            RoundingMode::Floor,
            RoundingMode::HalfUp,
            RoundingMode::HalfDown,
            RoundingMode::HalfEven,
            RoundingMode::Up,
            RoundingMode::Down,
        ] {
            assert_eq!(RoundingMode::from_str(&mode.to_string()).unwrap(), mode);
        }
        assert_eq!(RoundingMode::from_str("HALF-UP").unwrap(), RoundingMode::HalfUp);
        assert!(RoundingMode::from_str("sideways").is_err());
    }

    #[rstest]
    #[case(RoundingMode::HalfEven, dec!(1.005), dec!(1.00))]
    #[case(RoundingMode::HalfUp, dec!(1.005), dec!(1.01))]
    #[case(RoundingMode::Down, dec!(-1.009), dec!(-1.00))]
    #[case(RoundingMode::Floor, dec!(-1.001), dec!(-1.01))]
    fn test_mode_as_rounder(
        #[case] mode: RoundingMode,
        #[case] value: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(mode.apply(value, &USD), expected);
    }

    #[test]
    fn test_round_to_subunit_grids() {
        let half_up = RoundingStrategy::MidpointAwayFromZero;
        assert_eq!(round_to_subunit(dec!(2.5), &JPY, half_up), dec!(3));
        assert_eq!(round_to_subunit(dec!(1.2345), &BHD, half_up), dec!(1.235));
        // MGA has five subunits per unit: the grid is 0.2
        assert_eq!(round_to_subunit(dec!(1.29), &MGA, half_up), dec!(1.2));
        assert_eq!(round_to_subunit(dec!(1.31), &MGA, half_up), dec!(1.4));
        assert_eq!(
            round_to_subunit(dec!(1.39), &MGA, RoundingStrategy::ToZero),
            dec!(1.2)
        );
    }

    #[test]
    fn test_closure_rounder() {
        let plus_one_subunit = |value: Decimal, currency: &Currency| {
            value.round_dp_with_strategy(currency.decimal_places(), RoundingStrategy::ToZero)
                + Decimal::new(1, currency.decimal_places())
        };
        let rounder: &dyn Rounder = &plus_one_subunit;
        assert_eq!(rounder.apply(dec!(0.141), &USD), dec!(0.15));
    }
}
