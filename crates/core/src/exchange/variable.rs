//! The default bank: exchange through a mutable table of rates.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::{Arc, LazyLock};

use rust_decimal::Decimal;
use tracing::{debug, info};

use moneta_shared::{
    CurrencyDirectory, CurrencyRef, MoneyError, MoneyResult, Rounder, RoundingMode,
};

use super::bank::Bank;
use super::codec::CodecRegistry;
use super::rate::parse_rate_key;
use super::store::RateStore;
use crate::money::{Monetary, Money};
use crate::rounding::Rounding;

static DEFAULT_BANK: LazyLock<Arc<VariableExchange>> =
    LazyLock::new(|| Arc::new(VariableExchange::new()));

/// The shared bank injected into money built without an explicit one.
pub fn default_bank() -> Arc<VariableExchange> {
    Arc::clone(&DEFAULT_BANK)
}

/// Bank backed by a `RateStore` whose rates can change at any time.
///
/// The bank holds no locks: all synchronization lives in the store, which
/// may be shared between several banks.
///
/// ```
/// use moneta_core::{Money, Monetary, VariableExchange};
/// use moneta_shared::types::currency::{EUR, USD};
/// use rust_decimal_macros::dec;
/// use std::sync::Arc;
///
/// let bank = Arc::new(VariableExchange::new());
/// bank.add_rate("USD", "EUR", dec!(1.33)).unwrap();
///
/// let dollars = Money::with_bank(100, USD, bank.clone());
/// assert_eq!(dollars.exchange_to("EUR").unwrap(), Money::new(133, EUR));
/// ```
pub struct VariableExchange {
    store: Arc<RateStore>,
    rounder: Option<Arc<dyn Rounder>>,
    codecs: CodecRegistry,
}

impl Default for VariableExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VariableExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableExchange")
            .field("store", &self.store)
            .field("rounding_method", &self.rounder.is_some())
            .field("codecs", &self.codecs)
            .finish()
    }
}

impl VariableExchange {
    /// A bank over a fresh store resolving through the ISO directory.
    pub fn new() -> Self {
        Self::with_store(Arc::new(RateStore::default()))
    }

    /// A bank over an existing, possibly shared, store.
    pub fn with_store(store: Arc<RateStore>) -> Self {
        Self {
            store,
            rounder: None,
            codecs: CodecRegistry::with_builtin(),
        }
    }

    /// Replaces the store with a fresh one resolving through `directory`.
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn CurrencyDirectory>) -> Self {
        self.store = Arc::new(RateStore::new(directory));
        self
    }

    /// Rounds every exchange without per-call rounding through `rounder`.
    #[must_use]
    pub fn with_rounder(mut self, rounder: impl Rounder + 'static) -> Self {
        self.rounder = Some(Arc::new(rounder));
        self
    }

    /// `with_rounder` for a named mode.
    #[must_use]
    pub fn with_rounding_mode(self, mode: RoundingMode) -> Self {
        self.with_rounder(mode)
    }

    /// Replaces the codec registry used for import and export.
    #[must_use]
    pub fn with_codecs(mut self, codecs: CodecRegistry) -> Self {
        self.codecs = codecs;
        self
    }

    /// Overrides (or clears) the construction-time rounder.
    pub fn set_rounding_method(&mut self, rounder: Option<Arc<dyn Rounder>>) {
        self.rounder = rounder;
    }

    /// The underlying rate store.
    pub fn store(&self) -> &Arc<RateStore> {
        &self.store
    }

    /// Registered rate codecs.
    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// Registered rate codecs, for adding formats.
    pub fn codecs_mut(&mut self) -> &mut CodecRegistry {
        &mut self.codecs
    }

    /// Stores a rate; see `RateStore::add_rate`.
    pub fn add_rate<'a>(
        &self,
        from: impl Into<CurrencyRef<'a>>,
        to: impl Into<CurrencyRef<'a>>,
        rate: Decimal,
    ) -> MoneyResult<Decimal> {
        self.store.add_rate(from, to, rate)
    }

    /// Alias of `add_rate`.
    pub fn set_rate<'a>(
        &self,
        from: impl Into<CurrencyRef<'a>>,
        to: impl Into<CurrencyRef<'a>>,
        rate: Decimal,
    ) -> MoneyResult<Decimal> {
        self.add_rate(from, to, rate)
    }

    /// Stored rate, or `None` without an entry.
    pub fn get_rate<'a>(
        &self,
        from: impl Into<CurrencyRef<'a>>,
        to: impl Into<CurrencyRef<'a>>,
    ) -> MoneyResult<Option<Decimal>> {
        self.store.get_rate(from, to)
    }

    /// Stored rate, failing with `UnknownRate` without an entry.
    pub fn rate<'a>(
        &self,
        from: impl Into<CurrencyRef<'a>>,
        to: impl Into<CurrencyRef<'a>>,
    ) -> MoneyResult<Decimal> {
        let from = self.directory().wrap(from.into())?;
        let to = self.directory().wrap(to.into())?;
        self.store
            .get_rate(from, to)?
            .ok_or_else(|| MoneyError::unknown_rate(from.code(), to.code()))
    }

    /// `exchange_with` for any `Monetary`, returning the same type.
    pub fn exchange<'c, M: Monetary>(
        &self,
        from: &M,
        to: impl Into<CurrencyRef<'c>>,
        rounding: Rounding<'_>,
    ) -> MoneyResult<M> {
        let converted = self.exchange_with(from.as_money(), to.into(), rounding)?;
        Ok(from.rebuild(converted))
    }

    /// Serializes every rate with the codec registered as `format`.
    ///
    /// Runs inside a store transaction, so the table is consistent.
    pub fn export_rates(&self, format: &str) -> MoneyResult<Vec<u8>> {
        let codec = self.codecs.get(format)?;
        let (count, bytes) = self.store.transaction(|tx| {
            let table = tx.to_table();
            Ok((table.len(), codec.encode(&table)?))
        })?;
        info!(format, count, bytes = bytes.len(), "exported exchange rates");
        Ok(bytes)
    }

    /// Writes the serialized rates to `writer` instead of returning them.
    pub fn export_rates_to(&self, format: &str, writer: &mut impl Write) -> MoneyResult<()> {
        let bytes = self.export_rates(format)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the serialized rates to a file, replacing its contents.
    pub fn export_rates_to_file(&self, format: &str, path: impl AsRef<Path>) -> MoneyResult<()> {
        let mut file = BufWriter::new(File::create(path)?);
        self.export_rates_to(format, &mut file)
    }

    /// Loads rates in one transaction and returns how many were read.
    ///
    /// A malformed key, an unknown currency, or a non-positive rate leaves the
    /// store unchanged.
    pub fn import_rates(&self, format: &str, data: &[u8]) -> MoneyResult<usize> {
        let codec = self.codecs.get(format)?;
        let count = self.store.transaction(|tx| {
            let table = codec.decode(data)?;
            for (key, rate) in &table {
                let (from, to) = parse_rate_key(key)?;
                tx.add_rate(from, to, *rate)?;
            }
            Ok(table.len())
        })?;
        info!(format, count, "imported exchange rates");
        Ok(count)
    }

    /// `import_rates` over everything `reader` yields.
    pub fn import_rates_from(&self, format: &str, reader: &mut impl Read) -> MoneyResult<usize> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.import_rates(format, &data)
    }
}

impl Bank for VariableExchange {
    fn exchange_with(
        &self,
        from: &Money,
        to: CurrencyRef<'_>,
        rounding: Rounding<'_>,
    ) -> MoneyResult<Money> {
        let target = self.directory().wrap(to)?;
        let source = *from.currency();
        if source == target {
            return Ok(from.clone());
        }

        let rate = self.rate(source, target)?;
        let value = from
            .amount()
            .checked_mul(rate)
            .ok_or(MoneyError::Overflow)?;
        let amount = self.round(value, &target, rounding);
        debug!(
            from = source.code(),
            to = target.code(),
            %rate,
            %amount,
            "exchanged money"
        );
        Ok(from.with_amount_in(amount, target))
    }

    fn directory(&self) -> &dyn CurrencyDirectory {
        self.store.directory().as_ref()
    }

    fn rounding_method(&self) -> Option<&dyn Rounder> {
        self.rounder.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moneta_shared::types::currency::{EUR, USD};
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_bank_is_shared() {
        assert!(Arc::ptr_eq(&default_bank(), &default_bank()));
    }

    #[test]
    fn test_rate_requires_entry() {
        let bank = VariableExchange::new();
        bank.set_rate("USD", "EUR", dec!(1.33)).unwrap();
        assert_eq!(bank.rate("usd", EUR).unwrap(), dec!(1.33));
        assert!(matches!(
            bank.rate(EUR, USD),
            Err(MoneyError::UnknownRate { from, to }) if from == "EUR" && to == "USD"
        ));
        assert_eq!(bank.get_rate(EUR, USD).unwrap(), None);
    }

    #[test]
    fn test_banks_can_share_a_store() {
        let store = Arc::new(RateStore::default());
        let first = VariableExchange::with_store(Arc::clone(&store));
        let second = VariableExchange::with_store(store).with_rounding_mode(RoundingMode::Ceiling);
        first.add_rate("USD", "EUR", dec!(1.5)).unwrap();
        assert_eq!(second.get_rate("USD", "EUR").unwrap(), Some(dec!(1.5)));
        assert!(second.rounding_method().is_some());
        assert!(first.rounding_method().is_none());
    }

    #[test]
    fn test_set_rounding_method_overrides_builder() {
        let mut bank = VariableExchange::new().with_rounding_mode(RoundingMode::Floor);
        bank.set_rounding_method(Some(Arc::new(RoundingMode::Ceiling)));
        let rounder = bank.rounding_method().unwrap();
        assert_eq!(rounder.apply(dec!(1.001), &USD), dec!(1.01));
        bank.set_rounding_method(None);
        assert!(bank.rounding_method().is_none());
    }

    #[test]
    fn test_import_reader() {
        let bank = VariableExchange::new();
        let mut reader: &[u8] = br#"{"USD_TO_EUR": 1.25}"#;
        assert_eq!(bank.import_rates_from("json", &mut reader).unwrap(), 1);
        assert_eq!(bank.get_rate("USD", "EUR").unwrap(), Some(dec!(1.25)));
    }
}
