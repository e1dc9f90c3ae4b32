//! Currency exchange: the rate store, rate codecs, and banks.

pub mod bank;
pub mod codec;
pub mod rate;
pub mod store;
pub mod variable;

#[cfg(test)]
mod props;

pub use bank::Bank;
pub use codec::{CodecRegistry, JsonCodec, NativeCodec, RateCodec, RateTable, YamlCodec};
pub use rate::{ExchangeRate, parse_rate_key, rate_key};
pub use store::{RateSnapshot, RateStore, RateTransaction};
pub use variable::{VariableExchange, default_bank};
