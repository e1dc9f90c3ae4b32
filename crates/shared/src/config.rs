//! Process-wide money configuration.

use serde::Deserialize;

use crate::types::RoundingMode;

/// Defaults applied to money arithmetic and exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MoneyConfig {
    /// Rounding mode used when no per-call rounding is given.
    /// `None` falls back to truncation onto the currency's subunit grid.
    #[serde(default = "default_rounding_mode")]
    pub rounding_mode: Option<RoundingMode>,
    /// Keep amounts at full decimal precision instead of rounding to subunits.
    #[serde(default)]
    pub infinite_precision: bool,
    /// Whether cross-currency operations may convert through a bank.
    #[serde(default = "default_allow_conversions")]
    pub allow_conversions: bool,
}

#[allow(clippy::unnecessary_wraps)]
fn default_rounding_mode() -> Option<RoundingMode> {
    Some(RoundingMode::HalfEven)
}

fn default_allow_conversions() -> bool {
    true
}

impl Default for MoneyConfig {
    fn default() -> Self {
        Self {
            rounding_mode: default_rounding_mode(),
            infinite_precision: false,
            allow_conversions: default_allow_conversions(),
        }
    }
}

impl MoneyConfig {
    /// Loads configuration from `config/money.*` and `MONETA__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed or a value has the wrong type.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config/money")
    }

    /// Loads configuration from the given file stem, then the environment.
    ///
    /// The file is optional; environment variables take precedence.
    pub fn load_from(file_stem: &str) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(
                config::Environment::with_prefix("MONETA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
