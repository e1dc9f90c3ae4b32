//! Property-based tests for money arithmetic.
//!
//! - Negation and absolute value are consistent
//! - Addition and subtraction are inverse
//! - Allocation never creates or loses a subunit
//! - divmod reconstructs its dividend

use proptest::prelude::*;
use rust_decimal::Decimal;

use moneta_shared::types::currency::USD;

use super::{DivMod, Monetary, Money};

/// Strategy to generate cent amounts within +/- 10 billion dollars.
fn cents() -> impl Strategy<Value = i64> {
    -1_000_000_000_000i64..1_000_000_000_000i64
}

fn money(cents: i64) -> Money {
    Money::from_subunits(cents, USD).unwrap()
}

/// Strategy to generate allocation ratios with at least one positive entry.
fn ratios() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(0u32..1_000, 1..8)
        .prop_filter("ratios must not all be zero", |r| r.iter().any(|&x| x > 0))
        .prop_map(|r| r.into_iter().map(Decimal::from).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_double_negation_is_identity(a in cents()) {
        let m = money(a);
        prop_assert!(m.negate().negate().eql(&m));
    }

    #[test]
    fn prop_abs_is_non_negative(a in cents()) {
        let m = money(a);
        let abs = m.abs();
        prop_assert!(!abs.is_negative());
        prop_assert!(abs == m || abs == m.negate());
    }

    #[test]
    fn prop_subtract_undoes_add(a in cents(), b in cents()) {
        let (a, b) = (money(a), money(b));
        let round_trip = a.add(&b).unwrap().subtract(&b).unwrap();
        prop_assert!(round_trip.eql(&a));
    }

    /// Allocation preserves the total, in the total's currency.
    #[test]
    fn prop_allocation_preserves_total(a in cents(), ratios in ratios()) {
        let total = money(a);
        let parts = total.allocate(&ratios).unwrap();
        prop_assert_eq!(parts.len(), ratios.len());

        let sum: Decimal = parts.iter().map(Money::amount).sum();
        prop_assert_eq!(sum, total.amount());
        prop_assert!(parts.iter().all(|p| p.currency() == &USD));
    }

    /// Shares of an even split differ by at most one subunit.
    #[test]
    fn prop_split_is_even(a in cents(), n in 1usize..12) {
        let parts = money(a).split(n).unwrap();
        let units: Vec<Decimal> = parts.iter().map(|p| p.subunits().unwrap()).collect();
        let max = units.iter().max().copied().unwrap();
        let min = units.iter().min().copied().unwrap();
        prop_assert!(max - min <= Decimal::ONE);
    }

    /// `quotient * divisor + remainder` is the dividend, and the remainder
    /// takes the divisor's sign.
    #[test]
    fn prop_divmod_reconstructs_dividend(
        a in cents(),
        d in prop_oneof![-500i64..-1, 1i64..500],
    ) {
        let DivMod::Money { quotient, remainder } = money(a).divmod(d).unwrap() else {
            return Err(TestCaseError::fail("numeric divmod must yield money"));
        };
        let q = quotient.subunits().unwrap();
        let r = remainder.subunits().unwrap();
        prop_assert_eq!(q * Decimal::from(d) + r, Decimal::from(a));
        prop_assert!(r.is_zero() || r.is_sign_negative() == (d < 0));
        prop_assert!(r.abs() < Decimal::from(d).abs());
    }
}
