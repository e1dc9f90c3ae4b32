//! Currency value type and the directory currencies are resolved from.
//!
//! Currency metadata is consumed, not managed: a `CurrencyDirectory` maps an
//! identifier to its attributes. `IsoDirectory` ships a static table of common
//! ISO 4217 currencies for callers that need nothing more.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::{LazyLock, Mutex, PoisonError};

use rust_decimal::Decimal;

use crate::error::{MoneyError, MoneyResult};

/// Immutable currency attributes.
///
/// Two currencies are equal iff their canonical codes match; the remaining
/// attributes are metadata and never participate in comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Currency {
    code: &'static str,
    name: &'static str,
    decimal_places: u32,
    subunit_to_unit: u32,
}

impl Currency {
    /// Creates a currency definition.
    ///
    /// `subunit_to_unit` must be positive; it need not be a power of ten
    /// (e.g. 5 for the Malagasy ariary).
    #[must_use]
    pub const fn new(
        code: &'static str,
        name: &'static str,
        decimal_places: u32,
        subunit_to_unit: u32,
    ) -> Self {
        Self {
            code,
            name,
            decimal_places,
            subunit_to_unit,
        }
    }

    /// Creates a currency from strings only known at runtime, such as a
    /// directory loaded from a file or a database.
    ///
    /// The code is trimmed and uppercased. Both strings are interned: each
    /// distinct string is stored once for the life of the process, however
    /// often it is defined.
    #[must_use]
    pub fn interned(code: &str, name: &str, decimal_places: u32, subunit_to_unit: u32) -> Self {
        Self::new(
            intern(&code.trim().to_ascii_uppercase()),
            intern(name),
            decimal_places,
            subunit_to_unit,
        )
    }

    /// Canonical (uppercase) currency code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Number of fractional digits of the smallest unit.
    #[must_use]
    pub const fn decimal_places(&self) -> u32 {
        self.decimal_places
    }

    /// Number of subunits in one major unit.
    #[must_use]
    pub const fn subunit_to_unit(&self) -> u32 {
        self.subunit_to_unit
    }

    /// `subunit_to_unit` as a decimal, for scaling amounts to subunits.
    #[must_use]
    pub fn subunit_scale(&self) -> Decimal {
        Decimal::from(self.subunit_to_unit)
    }
}

fn intern(text: &str) -> &'static str {
    static INTERNED: LazyLock<Mutex<HashSet<&'static str>>> =
        LazyLock::new(|| Mutex::new(HashSet::new()));

    let mut interned = INTERNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = interned.get(text) {
        return *existing;
    }
    let stored: &'static str = Box::leak(text.to_owned().into_boxed_str());
    interned.insert(stored);
    stored
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Currency {}

impl Hash for Currency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl PartialOrd for Currency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Currency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code.cmp(other.code)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code)
    }
}

impl std::str::FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IsoDirectory::new().resolve(s)
    }
}

/// US Dollar
pub const USD: Currency = Currency::new("USD", "United States Dollar", 2, 100);
/// Euro
pub const EUR: Currency = Currency::new("EUR", "Euro", 2, 100);
/// British Pound
pub const GBP: Currency = Currency::new("GBP", "British Pound", 2, 100);
/// Japanese Yen
pub const JPY: Currency = Currency::new("JPY", "Japanese Yen", 0, 1);
/// Australian Dollar
pub const AUD: Currency = Currency::new("AUD", "Australian Dollar", 2, 100);
/// Canadian Dollar
pub const CAD: Currency = Currency::new("CAD", "Canadian Dollar", 2, 100);
/// Swiss Franc
pub const CHF: Currency = Currency::new("CHF", "Swiss Franc", 2, 100);
/// Chinese Renminbi Yuan
pub const CNY: Currency = Currency::new("CNY", "Chinese Renminbi Yuan", 2, 100);
/// Indonesian Rupiah
pub const IDR: Currency = Currency::new("IDR", "Indonesian Rupiah", 2, 100);
/// Singapore Dollar
pub const SGD: Currency = Currency::new("SGD", "Singapore Dollar", 2, 100);
/// Korean Won
pub const KRW: Currency = Currency::new("KRW", "South Korean Won", 0, 1);
/// Bahraini Dinar
pub const BHD: Currency = Currency::new("BHD", "Bahraini Dinar", 3, 1000);
/// Kuwaiti Dinar
pub const KWD: Currency = Currency::new("KWD", "Kuwaiti Dinar", 3, 1000);
/// Malagasy Ariary
pub const MGA: Currency = Currency::new("MGA", "Malagasy Ariary", 1, 5);

/// Currencies known to `IsoDirectory::new()`.
pub const ISO_CURRENCIES: &[Currency] = &[
    USD, EUR, GBP, JPY, AUD, CAD, CHF, CNY, IDR, SGD, KRW, BHD, KWD, MGA,
];

/// A currency given either by identifier or as an already resolved value.
#[derive(Debug, Clone, Copy)]
pub enum CurrencyRef<'a> {
    /// Identifier to be resolved (case-insensitive).
    Code(&'a str),
    /// Already resolved currency.
    Currency(Currency),
}

impl<'a> From<&'a str> for CurrencyRef<'a> {
    fn from(code: &'a str) -> Self {
        Self::Code(code)
    }
}

impl<'a> From<&'a String> for CurrencyRef<'a> {
    fn from(code: &'a String) -> Self {
        Self::Code(code.as_str())
    }
}

impl From<Currency> for CurrencyRef<'_> {
    fn from(currency: Currency) -> Self {
        Self::Currency(currency)
    }
}

impl From<&Currency> for CurrencyRef<'_> {
    fn from(currency: &Currency) -> Self {
        Self::Currency(*currency)
    }
}

/// Maps currency identifiers to currency attributes.
pub trait CurrencyDirectory: std::fmt::Debug + Send + Sync {
    /// Resolves an identifier, failing with `UnknownCurrency` if it is not known.
    fn resolve(&self, identifier: &str) -> MoneyResult<Currency>;

    /// Resolves a code or passes an already resolved currency through.
    fn wrap(&self, currency: CurrencyRef<'_>) -> MoneyResult<Currency> {
        match currency {
            CurrencyRef::Code(code) => self.resolve(code),
            CurrencyRef::Currency(currency) => Ok(currency),
        }
    }

    /// Returns true if both references resolve to the same currency.
    fn same_currency(&self, a: CurrencyRef<'_>, b: CurrencyRef<'_>) -> MoneyResult<bool> {
        Ok(self.wrap(a)? == self.wrap(b)?)
    }
}

/// Directory backed by a static currency table.
#[derive(Debug, Clone, Copy)]
pub struct IsoDirectory {
    table: &'static [Currency],
}

impl IsoDirectory {
    /// Creates a directory over the built-in ISO table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            table: ISO_CURRENCIES,
        }
    }

    /// Creates a directory over a caller-supplied table.
    #[must_use]
    pub const fn with_table(table: &'static [Currency]) -> Self {
        Self { table }
    }

    /// All currencies in this directory.
    #[must_use]
    pub const fn currencies(&self) -> &'static [Currency] {
        self.table
    }
}

impl Default for IsoDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrencyDirectory for IsoDirectory {
    fn resolve(&self, identifier: &str) -> MoneyResult<Currency> {
        let wanted = identifier.trim();
        self.table
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| MoneyError::UnknownCurrency(identifier.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_currency_display() {
        assert_eq!(USD.to_string(), "USD");
        assert_eq!(JPY.to_string(), "JPY");
        assert_eq!(format!("{KWD}"), "KWD");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("USD").unwrap(), USD);
        assert_eq!(Currency::from_str("usd").unwrap(), USD);
        assert_eq!(Currency::from_str(" eur ").unwrap(), EUR);
        assert!(matches!(
            Currency::from_str("XXX"),
            Err(MoneyError::UnknownCurrency(code)) if code == "XXX"
        ));
        assert!(Currency::from_str("").is_err());
    }

    #[test]
    fn test_equality_is_by_code() {
        let renamed = Currency::new("USD", "Greenback", 2, 100);
        assert_eq!(renamed, USD);
        assert_ne!(USD, EUR);
    }

    #[test]
    fn test_subunit_metadata() {
        assert_eq!(USD.subunit_to_unit(), 100);
        assert_eq!(JPY.decimal_places(), 0);
        assert_eq!(BHD.subunit_to_unit(), 1000);
        assert_eq!(MGA.subunit_to_unit(), 5);
        assert_eq!(MGA.decimal_places(), 1);
    }

    #[test]
    fn test_wrap_and_same_currency() {
        let dir = IsoDirectory::new();
        assert_eq!(dir.wrap("gbp".into()).unwrap(), GBP);
        assert_eq!(dir.wrap(GBP.into()).unwrap(), GBP);
        assert!(dir.same_currency("usd".into(), "USD".into()).unwrap());
        assert!(dir.same_currency("usd".into(), USD.into()).unwrap());
        assert!(!dir.same_currency("usd".into(), "EUR".into()).unwrap());
        assert!(dir.same_currency("usd".into(), "AAA".into()).is_err());
    }

    #[test]
    fn test_custom_table() {
        static TOKENS: &[Currency] = &[Currency::new("XTS", "Test Token", 4, 10_000)];
        let dir = IsoDirectory::with_table(TOKENS);
        assert_eq!(dir.resolve("xts").unwrap().decimal_places(), 4);
        assert!(dir.resolve("USD").is_err());
    }

    // A directory whose definitions arrive as owned strings.
    #[derive(Debug)]
    struct LoadedDirectory {
        table: Vec<Currency>,
    }

    impl LoadedDirectory {
        fn load(rows: &[(String, String, u32, u32)]) -> Self {
            Self {
                table: rows
                    .iter()
                    .map(|(code, name, places, subunits)| {
                        Currency::interned(code, name, *places, *subunits)
                    })
                    .collect(),
            }
        }
    }

    impl CurrencyDirectory for LoadedDirectory {
        fn resolve(&self, identifier: &str) -> MoneyResult<Currency> {
            let wanted = identifier.trim();
            self.table
                .iter()
                .find(|c| c.code().eq_ignore_ascii_case(wanted))
                .copied()
                .ok_or_else(|| MoneyError::UnknownCurrency(identifier.to_string()))
        }
    }

    #[test]
    fn test_runtime_loaded_directory() {
        let rows = vec![
            (" xbt ".to_string(), "Bitcoin".to_string(), 8, 100_000_000),
            ("usd".to_string(), "Dollar".to_string(), 2, 100),
        ];
        let first = LoadedDirectory::load(&rows);
        let second = LoadedDirectory::load(&rows);
        drop(rows);

        let bitcoin = first.resolve("XBT").unwrap();
        assert_eq!(bitcoin.code(), "XBT");
        assert_eq!(bitcoin.name(), "Bitcoin");
        assert_eq!(bitcoin.decimal_places(), 8);
        assert_eq!(first.resolve("usd").unwrap(), USD);

        // Reloading reuses the stored strings.
        let again = second.resolve("xbt").unwrap();
        assert!(std::ptr::eq(bitcoin.code(), again.code()));
        assert!(std::ptr::eq(bitcoin.name(), again.name()));
    }
}
