//! Process-wide money policy.
//!
//! One `Policy` is installed for the whole process; any thread may push a
//! scoped override that shadows it until the returned guard is dropped.
//! `Money` reads the effective policy when it is constructed or operated on,
//! so a change affects subsequent calls only.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use moneta_shared::{MoneyConfig, RoundingMode};
use tracing::info;

use crate::exchange::{Bank, default_bank};

static GLOBAL: LazyLock<RwLock<Policy>> = LazyLock::new(|| RwLock::new(Policy::default()));

thread_local! {
    static SCOPED: RefCell<Vec<Policy>> = const { RefCell::new(Vec::new()) };
}

/// Whether cross-currency operations may convert through a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionPolicy {
    /// Differing currencies are converted with the other operand's bank.
    #[default]
    Allowed,
    /// Differing currencies fail with `DifferentCurrency`, zero amounts included.
    Disallowed,
}

/// Defaults applied to money construction, division, and exchange.
#[derive(Clone)]
pub struct Policy {
    rounding_mode: Option<RoundingMode>,
    infinite_precision: bool,
    conversions: ConversionPolicy,
    default_bank: Arc<dyn Bank>,
}

impl Default for Policy {
    fn default() -> Self {
        Self::from_config(&MoneyConfig::default())
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("rounding_mode", &self.rounding_mode)
            .field("infinite_precision", &self.infinite_precision)
            .field("conversions", &self.conversions)
            .finish_non_exhaustive()
    }
}

impl Policy {
    /// Builds a policy from loaded configuration, using the shared default bank.
    #[must_use]
    pub fn from_config(config: &MoneyConfig) -> Self {
        Self {
            rounding_mode: config.rounding_mode,
            infinite_precision: config.infinite_precision,
            conversions: if config.allow_conversions {
                ConversionPolicy::Allowed
            } else {
                ConversionPolicy::Disallowed
            },
            default_bank: default_bank(),
        }
    }

    /// Default rounding mode; `None` means truncation onto the subunit grid.
    pub const fn rounding_mode(&self) -> Option<RoundingMode> {
        self.rounding_mode
    }

    /// Whether amounts keep full decimal precision.
    pub const fn infinite_precision(&self) -> bool {
        self.infinite_precision
    }

    /// Cross-currency conversion policy.
    pub const fn conversions(&self) -> ConversionPolicy {
        self.conversions
    }

    /// Bank injected into money constructed without an explicit one.
    pub fn default_bank(&self) -> &Arc<dyn Bank> {
        &self.default_bank
    }

    /// Replaces the default rounding mode.
    #[must_use]
    pub fn with_rounding_mode(mut self, mode: Option<RoundingMode>) -> Self {
        self.rounding_mode = mode;
        self
    }

    /// Enables or disables infinite precision.
    #[must_use]
    pub fn with_infinite_precision(mut self, enabled: bool) -> Self {
        self.infinite_precision = enabled;
        self
    }

    /// Allows or disallows cross-currency conversion.
    #[must_use]
    pub fn with_conversions(mut self, conversions: ConversionPolicy) -> Self {
        self.conversions = conversions;
        self
    }

    /// Replaces the bank injected into new money.
    #[must_use]
    pub fn with_default_bank(mut self, bank: Arc<dyn Bank>) -> Self {
        self.default_bank = bank;
        self
    }

    /// The effective policy for the calling thread.
    pub fn current() -> Self {
        SCOPED
            .with(|stack| stack.borrow().last().cloned())
            .unwrap_or_else(Self::global)
    }

    /// The process-wide policy, ignoring scoped overrides.
    pub fn global() -> Self {
        GLOBAL.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replaces the process-wide policy.
    pub fn install(policy: Self) {
        info!(
            rounding_mode = ?policy.rounding_mode,
            infinite_precision = policy.infinite_precision,
            conversions = ?policy.conversions,
            "installing money policy"
        );
        *GLOBAL.write().unwrap_or_else(PoisonError::into_inner) = policy;
    }

    /// Restores the process-wide policy to its defaults.
    pub fn reset() {
        Self::install(Self::default());
    }

    /// Edits a copy of the process-wide policy, then installs it.
    ///
    /// `edit` runs without any lock held, so it may read the policy or build
    /// money values.
    pub fn update(edit: impl FnOnce(&mut Self)) {
        let mut policy = Self::global();
        edit(&mut policy);
        Self::install(policy);
    }

    /// Overrides the policy for the calling thread until the guard drops.
    ///
    /// Guards nest; dropping one restores whatever was effective before it.
    #[must_use = "the override ends when the guard is dropped"]
    pub fn scoped(policy: Self) -> PolicyGuard {
        SCOPED.with(|stack| stack.borrow_mut().push(policy));
        PolicyGuard {
            _not_send: PhantomData,
        }
    }

    /// Scoped override derived from the current effective policy.
    #[must_use = "the override ends when the guard is dropped"]
    pub fn scoped_with(edit: impl FnOnce(Self) -> Self) -> PolicyGuard {
        Self::scoped(edit(Self::current()))
    }
}

/// Restores the previous thread policy when dropped.
#[derive(Debug)]
pub struct PolicyGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for PolicyGuard {
    fn drop(&mut self) {
        SCOPED.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Makes cross-currency operations fail with `DifferentCurrency` process-wide.
pub fn disallow_currency_conversion() {
    Policy::update(|policy| policy.conversions = ConversionPolicy::Disallowed);
}

/// Re-enables cross-currency conversion process-wide.
pub fn allow_currency_conversion() {
    Policy::update(|policy| policy.conversions = ConversionPolicy::Allowed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = Policy::default();
        assert_eq!(policy.rounding_mode(), Some(RoundingMode::HalfEven));
        assert!(!policy.infinite_precision());
        assert_eq!(policy.conversions(), ConversionPolicy::Allowed);
    }

    #[test]
    fn test_from_config() {
        let config = MoneyConfig {
            rounding_mode: None,
            infinite_precision: true,
            allow_conversions: false,
        };
        let policy = Policy::from_config(&config);
        assert_eq!(policy.rounding_mode(), None);
        assert!(policy.infinite_precision());
        assert_eq!(policy.conversions(), ConversionPolicy::Disallowed);
    }

    #[test]
    fn test_scoped_overrides_nest_and_restore() {
        let before = Policy::current().rounding_mode();
        {
            let _outer = Policy::scoped_with(|p| p.with_rounding_mode(Some(RoundingMode::Floor)));
            assert_eq!(Policy::current().rounding_mode(), Some(RoundingMode::Floor));
            {
                let _inner = Policy::scoped_with(|p| p.with_infinite_precision(true));
                let current = Policy::current();
                assert_eq!(current.rounding_mode(), Some(RoundingMode::Floor));
                assert!(current.infinite_precision());
            }
            assert!(!Policy::current().infinite_precision());
        }
        assert_eq!(Policy::current().rounding_mode(), before);
    }

    #[test]
    fn test_scoped_override_is_thread_local() {
        let _guard = Policy::scoped_with(|p| p.with_conversions(ConversionPolicy::Disallowed));
        assert_eq!(Policy::current().conversions(), ConversionPolicy::Disallowed);
        let other = std::thread::spawn(|| Policy::current().conversions())
            .join()
            .unwrap();
        assert_eq!(other, Policy::global().conversions());
    }
}
