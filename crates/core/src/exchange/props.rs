//! Property-based tests for the rate store and codecs.
//!
//! - Import/export reproduces any rate table exactly, in every format
//! - A failed import leaves the store untouched

use proptest::prelude::*;
use rust_decimal::Decimal;

use moneta_shared::types::currency::ISO_CURRENCIES;

use super::variable::VariableExchange;

/// Strategy to generate positive rates with up to 12 decimal places.
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000_000i64, 0u32..=12).prop_map(|(m, scale)| Decimal::new(m, scale))
}

/// Strategy to generate a currency code pair from the ISO table.
fn currency_pair() -> impl Strategy<Value = (&'static str, &'static str)> {
    let n = ISO_CURRENCIES.len();
    (0..n, 0..n).prop_map(|(a, b)| (ISO_CURRENCIES[a].code(), ISO_CURRENCIES[b].code()))
}

fn rate_entries() -> impl Strategy<Value = Vec<((&'static str, &'static str), Decimal)>> {
    prop::collection::vec((currency_pair(), positive_rate()), 0..20)
}

fn loaded_bank(entries: &[((&'static str, &'static str), Decimal)]) -> VariableExchange {
    let bank = VariableExchange::new();
    for ((from, to), rate) in entries {
        bank.add_rate(*from, *to, *rate).unwrap();
    }
    bank
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Exporting then importing into an empty bank reproduces every rate.
    #[test]
    fn prop_export_import_round_trip(
        entries in rate_entries(),
        format in prop::sample::select(vec!["json", "yaml", "native"]),
    ) {
        let source = loaded_bank(&entries);
        let exported = source.export_rates(format).unwrap();

        let target = VariableExchange::new();
        let imported = target.import_rates(format, &exported).unwrap();

        let expected = source.store().each_rate();
        prop_assert_eq!(imported, expected.len());
        prop_assert_eq!(
            target.store().each_rate().iter().collect::<Vec<_>>(),
            expected.iter().collect::<Vec<_>>()
        );
    }

    /// An import with one bad row changes nothing.
    #[test]
    fn prop_failed_import_is_atomic(entries in rate_entries()) {
        let bank = loaded_bank(&entries);
        let before = bank.store().each_rate().to_table();

        let result = bank.import_rates(
            "json",
            br#"{"USD_TO_EUR": 2, "EUR_TO_GBP": 3, "GBP_TO_ZZZ": 4}"#,
        );

        prop_assert!(result.is_err());
        prop_assert_eq!(bank.store().each_rate().to_table(), before);
    }
}
