//! Error types shared by the currency directory, rate store, bank, and money layers.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias using `MoneyError`.
pub type MoneyResult<T> = Result<T, MoneyError>;

/// Errors raised by monetary operations.
///
/// Every error propagates to the caller unchanged. The only place an error is
/// absorbed is ordering comparison, where an unknown rate makes two values
/// incomparable instead of failing.
#[derive(Debug, Error)]
pub enum MoneyError {
    // ========== Lookup Errors ==========
    /// A currency identifier could not be resolved.
    #[error("Unknown currency '{0}'")]
    UnknownCurrency(String),

    /// No conversion rate is stored for a valid currency pair.
    #[error("No conversion rate known for '{from}' -> '{to}'")]
    UnknownRate {
        /// Source currency code.
        from: String,
        /// Target currency code.
        to: String,
    },

    /// An unsupported codec was requested for rate import or export.
    #[error("Unknown rate format '{0}'")]
    UnknownRateFormat(String),

    // ========== Policy Errors ==========
    /// Cross-currency operation attempted while conversions are disallowed.
    #[error("Currency conversion is disabled: {left} and {right} differ")]
    DifferentCurrency {
        /// Currency of the receiving operand.
        left: String,
        /// Currency of the other operand.
        right: String,
    },

    // ========== Operand Errors ==========
    /// An operand of the wrong kind was supplied.
    #[error("Type error: {0}")]
    Type(String),

    /// An argument has the right kind but an unusable value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Exchange rates must be strictly positive.
    #[error("Exchange rate must be positive, got {0}")]
    InvalidRate(Decimal),

    /// Division by a zero numeric or a zero amount.
    #[error("Division by zero")]
    DivisionByZero,

    /// The result does not fit in a 28-digit decimal.
    #[error("Arithmetic overflow")]
    Overflow,

    // ========== Import/Export Errors ==========
    /// Rate data could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Writing exported rates failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MoneyError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCurrency(_) => "UNKNOWN_CURRENCY",
            Self::UnknownRate { .. } => "UNKNOWN_RATE",
            Self::UnknownRateFormat(_) => "UNKNOWN_RATE_FORMAT",
            Self::DifferentCurrency { .. } => "DIFFERENT_CURRENCY",
            Self::Type(_) => "TYPE_ERROR",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::InvalidRate(_) => "INVALID_RATE",
            Self::DivisionByZero => "DIVISION_BY_ZERO",
            Self::Overflow => "OVERFLOW",
            Self::Codec(_) => "CODEC_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Builds an `UnknownRate` error from two currency codes.
    #[must_use]
    pub fn unknown_rate(from: &str, to: &str) -> Self {
        Self::UnknownRate {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Builds a `DifferentCurrency` error from two currency codes.
    #[must_use]
    pub fn different_currency(left: &str, right: &str) -> Self {
        Self::DifferentCurrency {
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}
