//! Environment variable overrides.
//!
//! `PALABRA_<SECTION>_<KEY>=value` sets `<section>.<key>` before the YAML
//! value is deserialized, e.g. `PALABRA_QUALITY_MIN_CONFIDENCE=0.7`.

use crate::error::{ConfigError, ConfigResult};
use serde_yml::{Mapping, Number, Value};

pub const ENV_PREFIX: &str = "PALABRA_";

/// Apply every matching `(name, value)` pair to the raw YAML document.
pub fn apply_overrides<I, K, V>(mut document: Value, vars: I) -> ConfigResult<Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    if document.is_null() {
        document = Value::Mapping(Mapping::new());
    }

    let root = match &mut document {
        Value::Mapping(map) => map,
        _ => {
            return Err(ConfigError::invalid(
                "<root>",
                "configuration document must be a mapping",
            ))
        }
    };

    for (name, raw) in vars {
        let Some(key) = name.as_ref().strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let key = key.to_lowercase();
        let Some((section, field)) = key.split_once('_') else {
            continue;
        };

        let section_key = Value::String(section.to_string());
        let entry = root
            .entry(section_key)
            .or_insert(Value::Mapping(Mapping::new()));
        if entry.is_null() {
            *entry = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(section_map) = entry else {
            return Err(ConfigError::invalid(
                section,
                "section must be a mapping to accept environment overrides",
            ));
        };

        tracing::debug!(section, field, "config_env_override");
        section_map.insert(Value::String(field.to_string()), coerce(raw.as_ref()));
    }

    Ok(document)
}

/// bool, then integer, then float, then string.
fn coerce(raw: &str) -> Value {
    match raw.to_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(Number::from(int));
    }
    if let Ok(float) = raw.parse::<f64>() {
        return Value::Number(Number::from(float));
    }
    Value::String(raw.to_string())
}
