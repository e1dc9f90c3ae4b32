//! Thread-safe rate store.
//!
//! The rate table is published as an immutable `Arc<RateMap>` behind a
//! `RwLock`. Single writes copy-on-write into the table; transactions stage a
//! private copy under the write lock and publish it in one swap, so readers
//! only ever observe complete tables. The published table is never mutated
//! partially, which makes a poisoned lock safe to recover.
//!
//! While a transaction is open, every call the same thread makes on that
//! store (including nested transactions) works on the staged copy.

use std::cell::RefCell;
use std::collections::{BTreeMap, btree_map};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use moneta_shared::{Currency, CurrencyDirectory, CurrencyRef, IsoDirectory, MoneyError, MoneyResult};

use super::codec::RateTable;
use super::rate::{ExchangeRate, rate_key};

type RateMap = BTreeMap<(Currency, Currency), Decimal>;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    // Tables staged by the transactions open on this thread, one per store.
    static STAGED: RefCell<Vec<Staging>> = const { RefCell::new(Vec::new()) };
}

#[derive(Default)]
struct Staging {
    store: u64,
    rates: RateMap,
    writes: usize,
}

fn with_staging<R>(store: u64, edit: impl FnOnce(&mut Staging) -> R) -> Option<R> {
    STAGED.with(|staged| {
        staged
            .borrow_mut()
            .iter_mut()
            .find(|staging| staging.store == store)
            .map(edit)
    })
}

/// Mapping from an ordered currency pair to a positive rate.
#[derive(Debug)]
pub struct RateStore {
    id: u64,
    directory: Arc<dyn CurrencyDirectory>,
    rates: RwLock<Arc<RateMap>>,
}

impl Default for RateStore {
    fn default() -> Self {
        Self::new(Arc::new(IsoDirectory::new()))
    }
}

impl RateStore {
    /// Creates an empty store that canonicalizes codes through `directory`.
    pub fn new(directory: Arc<dyn CurrencyDirectory>) -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            directory,
            rates: RwLock::new(Arc::new(RateMap::new())),
        }
    }

    /// Directory used to canonicalize currency identifiers.
    pub fn directory(&self) -> &Arc<dyn CurrencyDirectory> {
        &self.directory
    }

    /// Stores (or overwrites) the rate for a pair and returns it.
    ///
    /// Inside a transaction on this thread the rate is staged instead.
    ///
    /// # Errors
    ///
    /// `UnknownCurrency` if either identifier does not resolve, `InvalidRate`
    /// if the rate is not positive. Nothing is stored on error.
    pub fn add_rate<'a>(
        &self,
        from: impl Into<CurrencyRef<'a>>,
        to: impl Into<CurrencyRef<'a>>,
        rate: Decimal,
    ) -> MoneyResult<Decimal> {
        let pair = resolve_pair(self.directory.as_ref(), from.into(), to.into())?;
        validate_rate(rate)?;

        let staged = with_staging(self.id, |staging| {
            staging.rates.insert(pair, rate);
            staging.writes += 1;
        });
        if staged.is_some() {
            debug!(from = pair.0.code(), to = pair.1.code(), %rate, "staged exchange rate");
            return Ok(rate);
        }

        let mut guard = self.rates.write().unwrap_or_else(PoisonError::into_inner);
        Arc::make_mut(&mut *guard).insert(pair, rate);
        debug!(from = pair.0.code(), to = pair.1.code(), %rate, "stored exchange rate");
        Ok(rate)
    }

    /// Returns the stored rate, or `None` if the pair has no entry.
    pub fn get_rate<'a>(
        &self,
        from: impl Into<CurrencyRef<'a>>,
        to: impl Into<CurrencyRef<'a>>,
    ) -> MoneyResult<Option<Decimal>> {
        let pair = resolve_pair(self.directory.as_ref(), from.into(), to.into())?;
        if let Some(staged) = with_staging(self.id, |staging| staging.rates.get(&pair).copied()) {
            return Ok(staged);
        }
        Ok(self.published().get(&pair).copied())
    }

    /// Snapshot of every stored rate, sorted by pair.
    pub fn each_rate(&self) -> RateSnapshot {
        RateSnapshot {
            rates: self.current(),
        }
    }

    /// Number of stored rates.
    pub fn len(&self) -> usize {
        self.current().len()
    }

    /// Returns true if no rate is stored.
    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    /// Runs `body` with exclusive access to a staged copy of the table.
    ///
    /// The staged table replaces the published one only if `body` returns
    /// `Ok`; on error the store is left exactly as it was. Readers on other
    /// threads wait for the swap, they never see a half-applied batch.
    ///
    /// Called again from inside `body` (directly, or through a bank built on
    /// this store), the inner call joins the open staging as a savepoint: its
    /// writes are kept if it succeeds and discarded if it fails, and nothing
    /// is published until the outermost body returns.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `body`.
    pub fn transaction<R>(
        &self,
        body: impl FnOnce(&mut RateTransaction<'_>) -> MoneyResult<R>,
    ) -> MoneyResult<R> {
        let mut tx = RateTransaction { store: self };
        if let Some(savepoint) = Savepoint::take(self.id) {
            return body(&mut tx).inspect_err(|_| savepoint.restore());
        }

        let mut guard = self.rates.write().unwrap_or_else(PoisonError::into_inner);
        let open = OpenStaging::enter(self.id, RateMap::clone(&guard));
        let outcome = body(&mut tx);
        let staging = open.close().unwrap_or_default();

        match outcome {
            Ok(value) => {
                if staging.writes > 0 {
                    info!(
                        writes = staging.writes,
                        rates = staging.rates.len(),
                        "committed rate transaction"
                    );
                    *guard = Arc::new(staging.rates);
                }
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, writes = staging.writes, "rolled back rate transaction");
                Err(err)
            }
        }
    }

    fn published(&self) -> Arc<RateMap> {
        let guard = self.rates.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    // Staged table when a transaction is open on this thread.
    fn current(&self) -> Arc<RateMap> {
        with_staging(self.id, |staging| Arc::new(staging.rates.clone()))
            .unwrap_or_else(|| self.published())
    }
}

// Registers a staging for the duration of one outermost transaction. Dropping
// it (also on unwind) unregisters whatever is left.
struct OpenStaging(u64);

impl OpenStaging {
    fn enter(store: u64, rates: RateMap) -> Self {
        STAGED.with(|staged| {
            staged.borrow_mut().push(Staging {
                store,
                rates,
                writes: 0,
            });
        });
        Self(store)
    }

    fn close(&self) -> Option<Staging> {
        STAGED.with(|staged| {
            let mut staged = staged.borrow_mut();
            let pos = staged.iter().position(|staging| staging.store == self.0)?;
            Some(staged.remove(pos))
        })
    }
}

impl Drop for OpenStaging {
    fn drop(&mut self) {
        self.close();
    }
}

struct Savepoint {
    store: u64,
    rates: RateMap,
    writes: usize,
}

impl Savepoint {
    fn take(store: u64) -> Option<Self> {
        with_staging(store, |staging| Self {
            store,
            rates: staging.rates.clone(),
            writes: staging.writes,
        })
    }

    fn restore(self) {
        with_staging(self.store, |staging| {
            staging.rates = self.rates;
            staging.writes = self.writes;
        });
    }
}

/// Exclusive, staged view of a store inside `RateStore::transaction`.
///
/// Every method works on the staging; calling the store itself from the same
/// thread is equivalent.
pub struct RateTransaction<'s> {
    store: &'s RateStore,
}

impl RateTransaction<'_> {
    /// Stages a rate; see `RateStore::add_rate`.
    pub fn add_rate<'a>(
        &mut self,
        from: impl Into<CurrencyRef<'a>>,
        to: impl Into<CurrencyRef<'a>>,
        rate: Decimal,
    ) -> MoneyResult<Decimal> {
        self.store.add_rate(from, to, rate)
    }

    /// Reads a rate, including writes staged so far.
    pub fn get_rate<'a>(
        &self,
        from: impl Into<CurrencyRef<'a>>,
        to: impl Into<CurrencyRef<'a>>,
    ) -> MoneyResult<Option<Decimal>> {
        self.store.get_rate(from, to)
    }

    /// Every staged rate, sorted by pair.
    pub fn each_rate(&self) -> RateSnapshot {
        self.store.each_rate()
    }

    /// Number of staged rates.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Nested transaction on the same staging.
    ///
    /// Runs inline without taking the lock again. If `body` fails, the writes
    /// it staged are discarded and the error is returned to the outer body.
    pub fn transaction<R>(
        &mut self,
        body: impl FnOnce(&mut Self) -> MoneyResult<R>,
    ) -> MoneyResult<R> {
        let savepoint = Savepoint::take(self.store.id);
        body(self).inspect_err(|_| {
            if let Some(savepoint) = savepoint {
                savepoint.restore();
            }
        })
    }

    pub(crate) fn to_table(&self) -> RateTable {
        self.each_rate().to_table()
    }
}

/// Immutable view of the rate table at one point in time.
///
/// Cheap to clone; iterate it as many times as needed.
#[derive(Debug, Clone)]
pub struct RateSnapshot {
    rates: Arc<RateMap>,
}

impl RateSnapshot {
    /// Rates sorted by pair.
    pub fn iter(&self) -> Rates<'_> {
        Rates {
            inner: self.rates.iter(),
        }
    }

    /// Number of rates captured.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns true if no rates were captured.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Rate for an already resolved pair.
    pub fn get(&self, from: &Currency, to: &Currency) -> Option<Decimal> {
        self.rates.get(&(*from, *to)).copied()
    }

    /// The table keyed by `FROM_TO_TO`, as handed to codecs.
    pub fn to_table(&self) -> RateTable {
        table_of(&self.rates)
    }
}

impl<'a> IntoIterator for &'a RateSnapshot {
    type Item = ExchangeRate;
    type IntoIter = Rates<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over stored rates.
#[derive(Debug, Clone)]
pub struct Rates<'a> {
    inner: btree_map::Iter<'a, (Currency, Currency), Decimal>,
}

impl Iterator for Rates<'_> {
    type Item = ExchangeRate;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(&(from, to), &rate)| ExchangeRate::new(from, to, rate))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Rates<'_> {}

fn resolve_pair(
    directory: &dyn CurrencyDirectory,
    from: CurrencyRef<'_>,
    to: CurrencyRef<'_>,
) -> MoneyResult<(Currency, Currency)> {
    Ok((directory.wrap(from)?, directory.wrap(to)?))
}

fn validate_rate(rate: Decimal) -> MoneyResult<()> {
    if rate <= Decimal::ZERO {
        return Err(MoneyError::InvalidRate(rate));
    }
    Ok(())
}

fn table_of(rates: &RateMap) -> RateTable {
    rates
        .iter()
        .map(|((from, to), rate)| (rate_key(from.code(), to.code()), *rate))
        .collect()
}
