//! Per-call rounding arguments and the rounding precedence.
//!
//! Precedence, highest first: an explicit mode, a caller-supplied rounder, the
//! bank's own rounder, the policy's default mode, truncation onto the
//! currency's subunit grid.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};

use moneta_shared::{Currency, Rounder, RoundingMode, round_to_subunit};

use crate::policy::Policy;

/// Rounding requested for a single division or exchange.
///
/// The default carries nothing and defers to the bank and the policy.
#[derive(Clone, Copy, Default)]
pub struct Rounding<'a> {
    mode: Option<RoundingMode>,
    rounder: Option<&'a dyn Rounder>,
}

impl<'a> Rounding<'a> {
    /// No per-call rounding.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            mode: None,
            rounder: None,
        }
    }

    /// Rounds with an explicit mode.
    #[must_use]
    pub const fn mode(mode: RoundingMode) -> Self {
        Self {
            mode: Some(mode),
            rounder: None,
        }
    }

    /// Rounds with a caller-supplied strategy.
    #[must_use]
    pub fn custom(rounder: &'a dyn Rounder) -> Self {
        Self {
            mode: None,
            rounder: Some(rounder),
        }
    }

    /// Adds a caller-supplied strategy; an explicit mode still wins over it.
    #[must_use]
    pub fn with_rounder(mut self, rounder: &'a dyn Rounder) -> Self {
        self.rounder = Some(rounder);
        self
    }

    /// Explicit mode, if any.
    pub const fn explicit_mode(&self) -> Option<RoundingMode> {
        self.mode
    }

    /// Returns true if neither a mode nor a rounder was given.
    pub const fn is_empty(&self) -> bool {
        self.mode.is_none() && self.rounder.is_none()
    }

    /// Rounds `value` for `currency` following the precedence chain.
    ///
    /// `fallback` is the bank's construction-time rounder. Under infinite
    /// precision a value with no per-call or bank rounding is kept as is.
    pub fn resolve(
        &self,
        value: Decimal,
        currency: &Currency,
        fallback: Option<&dyn Rounder>,
        policy: &Policy,
    ) -> Decimal {
        if let Some(mode) = self.mode {
            return mode.apply(value, currency);
        }
        if let Some(rounder) = self.rounder.or(fallback) {
            return rounder.apply(value, currency);
        }
        if policy.infinite_precision() {
            return value;
        }
        match policy.rounding_mode() {
            Some(mode) => mode.apply(value, currency),
            None => native_round(value, currency),
        }
    }
}

impl From<RoundingMode> for Rounding<'_> {
    fn from(mode: RoundingMode) -> Self {
        Self::mode(mode)
    }
}

impl fmt::Debug for Rounding<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rounding")
            .field("mode", &self.mode)
            .field("custom", &self.rounder.is_some())
            .finish()
    }
}

/// Currency-native rounding: truncation onto the subunit grid.
#[must_use]
pub fn native_round(value: Decimal, currency: &Currency) -> Decimal {
    round_to_subunit(value, currency, RoundingStrategy::ToZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use moneta_shared::types::currency::{JPY, USD};
    use rust_decimal_macros::dec;

    fn truncating_policy() -> Policy {
        Policy::default().with_rounding_mode(None)
    }

    #[test]
    fn test_explicit_mode_wins_over_rounder() {
        let up = |v: Decimal, c: &Currency| RoundingMode::Ceiling.apply(v, c);
        let rounding = Rounding::mode(RoundingMode::Floor).with_rounder(&up);
        let policy = Policy::default();
        assert_eq!(
            rounding.resolve(dec!(0.125), &USD, None, &policy),
            dec!(0.12)
        );
    }

    #[test]
    fn test_custom_rounder_wins_over_fallback() {
        let floor = RoundingMode::Floor;
        let ceiling = RoundingMode::Ceiling;
        let policy = Policy::default();
        assert_eq!(
            Rounding::custom(&ceiling).resolve(dec!(0.121), &USD, Some(&floor), &policy),
            dec!(0.13)
        );
        assert_eq!(
            Rounding::none().resolve(dec!(0.129), &USD, Some(&floor), &policy),
            dec!(0.12)
        );
    }

    #[test]
    fn test_policy_mode_then_native_truncation() {
        let policy = Policy::default().with_rounding_mode(Some(RoundingMode::HalfUp));
        assert_eq!(
            Rounding::none().resolve(dec!(0.125), &USD, None, &policy),
            dec!(0.13)
        );
        assert_eq!(
            Rounding::none().resolve(dec!(0.129), &USD, None, &truncating_policy()),
            dec!(0.12)
        );
        assert_eq!(
            Rounding::none().resolve(dec!(-7.9), &JPY, None, &truncating_policy()),
            dec!(-7)
        );
    }

    #[test]
    fn test_infinite_precision_keeps_value_without_rounding_args() {
        let policy = Policy::default().with_infinite_precision(true);
        assert_eq!(
            Rounding::none().resolve(dec!(0.123456), &USD, None, &policy),
            dec!(0.123456)
        );
        assert_eq!(
            Rounding::mode(RoundingMode::HalfUp).resolve(dec!(0.125), &USD, None, &policy),
            dec!(0.13)
        );
    }

    #[test]
    fn test_from_mode() {
        let rounding: Rounding<'_> = RoundingMode::Ceiling.into();
        assert_eq!(rounding.explicit_mode(), Some(RoundingMode::Ceiling));
        assert!(!rounding.is_empty());
        assert!(Rounding::default().is_empty());
    }
}
