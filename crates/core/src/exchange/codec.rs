//! Rate table codecs and the registry they are selected from.
//!
//! A rate table is a flat map from `FROM_TO_TO` keys to rates. Every codec
//! must reproduce a table exactly: rates are never passed through a float
//! unless the float prints back to the same decimal.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::{Buf, BufMut, BytesMut};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use moneta_shared::{MoneyError, MoneyResult};

/// Rates keyed by `FROM_TO_TO`.
pub type RateTable = BTreeMap<String, Decimal>;

/// Encodes and decodes a complete rate table.
pub trait RateCodec: fmt::Debug + Send + Sync {
    /// Serializes the table.
    fn encode(&self, table: &RateTable) -> MoneyResult<Vec<u8>>;

    /// Parses a table previously produced by `encode` (or a compatible writer).
    fn decode(&self, data: &[u8]) -> MoneyResult<RateTable>;
}

/// JSON object of exact JSON numbers: `{"USD_TO_EUR":1.25}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl RateCodec for JsonCodec {
    fn encode(&self, table: &RateTable) -> MoneyResult<Vec<u8>> {
        let mut object = serde_json::Map::new();
        for (key, rate) in table {
            let number = serde_json::Number::from_str(&rate.normalize().to_string())
                .map_err(|e| MoneyError::Codec(format!("rate {rate} for '{key}': {e}")))?;
            object.insert(key.clone(), serde_json::Value::Number(number));
        }
        serde_json::to_vec(&serde_json::Value::Object(object))
            .map_err(|e| MoneyError::Codec(e.to_string()))
    }

    fn decode(&self, data: &[u8]) -> MoneyResult<RateTable> {
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(data).map_err(|e| MoneyError::Codec(e.to_string()))?;

        object
            .into_iter()
            .map(|(key, value)| {
                let rate = match &value {
                    serde_json::Value::Number(number) => parse_rate(&key, &number.to_string()),
                    serde_json::Value::String(text) => parse_rate(&key, text),
                    other => Err(MoneyError::Codec(format!(
                        "rate for '{key}' is not a number: {other}"
                    ))),
                }?;
                Ok((key, rate))
            })
            .collect()
    }
}

/// YAML mapping: `USD_TO_EUR: 1.25`.
///
/// Rates are written as YAML numbers. A rate whose float form would not print
/// back to the same decimal is written as a quoted string instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl YamlCodec {
    fn scalar(rate: Decimal) -> serde_yaml::Value {
        let rate = rate.normalize();
        if rate.fract().is_zero()
            && let Some(whole) = rate.to_u64()
        {
            return serde_yaml::Value::Number(whole.into());
        }
        match rate.to_f64() {
            Some(float) if Decimal::from_str(&float.to_string()).ok() == Some(rate) => {
                serde_yaml::Value::Number(float.into())
            }
            _ => serde_yaml::Value::String(rate.to_string()),
        }
    }
}

impl RateCodec for YamlCodec {
    fn encode(&self, table: &RateTable) -> MoneyResult<Vec<u8>> {
        let mapping: BTreeMap<&str, serde_yaml::Value> = table
            .iter()
            .map(|(key, rate)| (key.as_str(), Self::scalar(*rate)))
            .collect();
        serde_yaml::to_string(&mapping)
            .map(String::into_bytes)
            .map_err(|e| MoneyError::Codec(e.to_string()))
    }

    fn decode(&self, data: &[u8]) -> MoneyResult<RateTable> {
        let mapping: BTreeMap<String, serde_yaml::Value> =
            serde_yaml::from_slice(data).map_err(|e| MoneyError::Codec(e.to_string()))?;

        mapping
            .into_iter()
            .map(|(key, value)| {
                let rate = match &value {
                    serde_yaml::Value::Number(number) => {
                        if let Some(whole) = number.as_u64() {
                            Ok(Decimal::from(whole))
                        } else if let Some(whole) = number.as_i64() {
                            Ok(Decimal::from(whole))
                        } else {
                            parse_rate(&key, &number.to_string())
                        }
                    }
                    serde_yaml::Value::String(text) => parse_rate(&key, text),
                    _ => Err(MoneyError::Codec(format!("rate for '{key}' is not a number"))),
                }?;
                Ok((key, rate))
            })
            .collect()
    }
}

/// Compact binary image of the table using `Decimal`'s 16-byte form.
///
/// Layout: magic `MNR1`, entry count (u32 BE), then per entry the key length
/// (u16 BE), the UTF-8 key, and the serialized decimal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodec;

impl NativeCodec {
    const MAGIC: &'static [u8; 4] = b"MNR1";
    const DECIMAL_LEN: usize = 16;
}

impl RateCodec for NativeCodec {
    fn encode(&self, table: &RateTable) -> MoneyResult<Vec<u8>> {
        let count = u32::try_from(table.len())
            .map_err(|_| MoneyError::Codec("too many rates for native format".to_string()))?;
        let mut buf = BytesMut::with_capacity(8 + table.len() * 32);
        buf.put_slice(Self::MAGIC);
        buf.put_u32(count);

        for (key, rate) in table {
            let len = u16::try_from(key.len())
                .map_err(|_| MoneyError::Codec(format!("rate key too long: '{key}'")))?;
            buf.put_u16(len);
            buf.put_slice(key.as_bytes());
            buf.put_slice(&rate.serialize());
        }

        Ok(buf.to_vec())
    }

    fn decode(&self, data: &[u8]) -> MoneyResult<RateTable> {
        let truncated = || MoneyError::Codec("truncated native rate data".to_string());
        let mut buf = data;

        if buf.remaining() < Self::MAGIC.len() + 4 || &buf[..Self::MAGIC.len()] != Self::MAGIC {
            return Err(MoneyError::Codec("not a native rate table".to_string()));
        }
        buf.advance(Self::MAGIC.len());
        let count = buf.get_u32();

        let mut table = RateTable::new();
        for _ in 0..count {
            if buf.remaining() < 2 {
                return Err(truncated());
            }
            let len = usize::from(buf.get_u16());
            if buf.remaining() < len + Self::DECIMAL_LEN {
                return Err(truncated());
            }
            let key = std::str::from_utf8(&buf[..len])
                .map_err(|e| MoneyError::Codec(format!("rate key is not UTF-8: {e}")))?
                .to_string();
            buf.advance(len);

            let mut raw = [0u8; Self::DECIMAL_LEN];
            buf.copy_to_slice(&mut raw);
            table.insert(key, Decimal::deserialize(raw));
        }

        if buf.has_remaining() {
            return Err(MoneyError::Codec(format!(
                "{} trailing bytes after native rate table",
                buf.remaining()
            )));
        }
        Ok(table)
    }
}

/// Named codecs available for import and export.
///
/// Names are case-insensitive.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn RateCodec>>,
}

impl CodecRegistry {
    /// A registry with no codecs.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// A registry with `json`, `yaml`, `yml`, and `native`.
    pub fn with_builtin() -> Self {
        let yaml: Arc<dyn RateCodec> = Arc::new(YamlCodec);
        let mut registry = Self::empty();
        registry.register_shared("json", Arc::new(JsonCodec));
        registry.register_shared("yaml", Arc::clone(&yaml));
        registry.register_shared("yml", yaml);
        registry.register_shared("native", Arc::new(NativeCodec));
        registry
    }

    /// Registers (or replaces) a codec under `name`.
    pub fn register(&mut self, name: &str, codec: impl RateCodec + 'static) {
        self.register_shared(name, Arc::new(codec));
    }

    /// `register` for an already shared codec.
    pub fn register_shared(&mut self, name: &str, codec: Arc<dyn RateCodec>) {
        self.codecs.insert(name.to_lowercase(), codec);
    }

    /// Looks up a codec, failing with `UnknownRateFormat`.
    pub fn get(&self, format: &str) -> MoneyResult<&dyn RateCodec> {
        self.codecs
            .get(&format.to_lowercase())
            .map(|codec| codec.as_ref())
            .ok_or_else(|| MoneyError::UnknownRateFormat(format.to_string()))
    }

    /// Registered names, sorted.
    pub fn formats(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.codecs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}

fn parse_rate(key: &str, text: &str) -> MoneyResult<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|e| MoneyError::Codec(format!("invalid rate '{text}' for '{key}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn sample() -> RateTable {
        RateTable::from([
            ("USD_TO_EUR".to_string(), dec!(1.25)),
            ("USD_TO_JPY".to_string(), dec!(2.55)),
        ])
    }

    #[test]
    fn test_json_layout() {
        let bytes = JsonCodec.encode(&sample()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"USD_TO_EUR":1.25,"USD_TO_JPY":2.55}"#
        );
    }

    #[test]
    fn test_yaml_layout() {
        let text = String::from_utf8(YamlCodec.encode(&sample()).unwrap()).unwrap();
        assert_eq!(text, "USD_TO_EUR: 1.25\nUSD_TO_JPY: 2.55\n");
    }

    #[test]
    fn test_yaml_keeps_unrepresentable_rates_exact() {
        let table = RateTable::from([
            ("USD_TO_EUR".to_string(), dec!(0.1234567890123456789012345678)),
            ("USD_TO_IDR".to_string(), dec!(100000000000000000000)),
        ]);
        let decoded = YamlCodec.decode(&YamlCodec.encode(&table).unwrap()).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn test_decode_accepts_foreign_input() {
        let json = br#"{"USD_TO_EUR": "1.33", "EUR_TO_USD": 7.5e-1}"#;
        let table = JsonCodec.decode(json).unwrap();
        assert_eq!(table["USD_TO_EUR"], dec!(1.33));
        assert_eq!(table["EUR_TO_USD"], dec!(0.75));

        let yaml = b"---\nUSD_TO_EUR: 1.33\nUSD_TO_JPY: 110\n";
        let table = YamlCodec.decode(yaml).unwrap();
        assert_eq!(table["USD_TO_EUR"], dec!(1.33));
        assert_eq!(table["USD_TO_JPY"], dec!(110));
    }

    #[test]
    fn test_native_round_trip_preserves_scale() {
        let table = RateTable::from([("USD_TO_EUR".to_string(), dec!(1.2500))]);
        let decoded = NativeCodec.decode(&NativeCodec.encode(&table).unwrap()).unwrap();
        assert_eq!(decoded["USD_TO_EUR"].to_string(), "1.2500");
    }

    #[rstest]
    #[case::json("json", b"[1, 2]".as_slice())]
    #[case::json_bad_rate("json", br#"{"USD_TO_EUR": true}"#.as_slice())]
    #[case::yaml("yaml", b"- USD_TO_EUR".as_slice())]
    #[case::native_magic("native", b"JUNKJUNK".as_slice())]
    #[case::native_short("native", b"MNR1\x00\x00\x00\x01\x00".as_slice())]
    fn test_malformed_input(#[case] format: &str, #[case] data: &[u8]) {
        let registry = CodecRegistry::default();
        let codec = registry.get(format).unwrap();
        assert!(matches!(codec.decode(data), Err(MoneyError::Codec(_))));
    }

    #[test]
    fn test_native_rejects_trailing_bytes() {
        let mut bytes = NativeCodec.encode(&sample()).unwrap();
        bytes.push(0);
        assert!(NativeCodec.decode(&bytes).is_err());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = CodecRegistry::default();
        assert_eq!(registry.formats(), vec!["json", "native", "yaml", "yml"]);
        assert!(registry.get("JSON").is_ok());
        assert!(matches!(
            registry.get("xml"),
            Err(MoneyError::UnknownRateFormat(name)) if name == "xml"
        ));
    }

    #[test]
    fn test_register_custom_codec() {
        #[derive(Debug)]
        struct Lines;

        impl RateCodec for Lines {
            fn encode(&self, table: &RateTable) -> MoneyResult<Vec<u8>> {
                Ok(table
                    .iter()
                    .map(|(k, v)| format!("{k}={v}\n"))
                    .collect::<String>()
                    .into_bytes())
            }

            fn decode(&self, data: &[u8]) -> MoneyResult<RateTable> {
                String::from_utf8_lossy(data)
                    .lines()
                    .map(|line| {
                        let (k, v) = line
                            .split_once('=')
                            .ok_or_else(|| MoneyError::Codec(line.to_string()))?;
                        Ok((k.to_string(), parse_rate(k, v)?))
                    })
                    .collect()
            }
        }

        let mut registry = CodecRegistry::empty();
        registry.register("lines", Lines);
        let codec = registry.get("lines").unwrap();
        assert_eq!(codec.decode(&codec.encode(&sample()).unwrap()).unwrap(), sample());
        assert!(registry.get("json").is_err());
    }
}
