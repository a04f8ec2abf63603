//! Duplicate-key guard
//!
//! `serde_json` keeps the last value when an object repeats a key. Config files
//! must not do that silently, so [`parse_json_strict`] decodes every object as
//! an ordered list of pairs and runs [`reject_duplicate_keys`] on it.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value};

use crate::error::ConfigError;

/// Mapping literal repeated one or more keys
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("duplicate keys in config: {keys:?}")]
pub struct DuplicateKeyError {
    /// Each repeated key once, in order of first appearance
    pub keys: Vec<String>,
}

/// Build an ordered mapping, failing if any key appears twice
///
/// # Errors
/// Returns [`DuplicateKeyError`] listing every repeated key
///
/// # Examples
/// ```
/// # use cfgkit_model::reject_duplicate_keys;
/// let map = reject_duplicate_keys(vec![("x".to_string(), 1), ("y".to_string(), 2)]).unwrap();
/// assert_eq!(map.get("y"), Some(&2));
///
/// let err = reject_duplicate_keys(vec![("x".to_string(), 1), ("x".to_string(), 2)]).unwrap_err();
/// assert_eq!(err.keys, vec!["x".to_string()]);
/// ```
pub fn reject_duplicate_keys<V>(
    pairs: Vec<(String, V)>,
) -> Result<IndexMap<String, V>, DuplicateKeyError> {
    let mut counts: IndexMap<&str, usize> = IndexMap::with_capacity(pairs.len());
    for (key, _) in &pairs {
        *counts.entry(key.as_str()).or_insert(0) += 1;
    }

    if counts.len() != pairs.len() {
        let keys = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(key, _)| key.to_string())
            .collect();
        return Err(DuplicateKeyError { keys });
    }

    Ok(pairs.into_iter().collect())
}

/// Decode JSON text, rejecting repeated keys in any object
///
/// # Errors
/// - [`ConfigError::InvalidJson`] if the text is not JSON
/// - [`ConfigError::DuplicateKeys`] if an object repeats a key
pub fn parse_json_strict(text: &str) -> Result<Value, ConfigError> {
    let literal: Literal = serde_json::from_str(text)?;
    Ok(literal.into_value()?)
}

/// JSON tree with objects kept as raw pair lists
#[derive(Debug)]
enum Literal {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Literal>),
    Object(Vec<(String, Literal)>),
}

impl Literal {
    /// Inner objects are checked before the ones containing them
    fn into_value(self) -> Result<Value, DuplicateKeyError> {
        Ok(match self {
            Self::Null => Value::Null,
            Self::Bool(flag) => Value::Bool(flag),
            Self::Number(number) => Value::Number(number),
            Self::String(text) => Value::String(text),
            Self::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Literal::into_value)
                    .collect::<Result<_, _>>()?,
            ),
            Self::Object(pairs) => {
                let pairs = pairs
                    .into_iter()
                    .map(|(key, item)| Ok((key, item.into_value()?)))
                    .collect::<Result<Vec<_>, DuplicateKeyError>>()?;
                let map: Map<String, Value> = reject_duplicate_keys(pairs)?.into_iter().collect();
                Value::Object(map)
            }
        })
    }
}

impl<'de> Deserialize<'de> for Literal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LiteralVisitor)
    }
}

struct LiteralVisitor;

impl<'de> Visitor<'de> for LiteralVisitor {
    type Value = Literal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Literal, E> {
        Ok(Literal::Bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Literal, E> {
        Ok(Literal::Number(value.into()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Literal, E> {
        Ok(Literal::Number(value.into()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Literal, E> {
        Number::from_f64(value)
            .map(Literal::Number)
            .ok_or_else(|| E::custom("non-finite number"))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Literal, E> {
        Ok(Literal::String(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Literal, E> {
        Ok(Literal::String(value))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Literal, E> {
        Ok(Literal::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Literal, E> {
        Ok(Literal::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Literal, D::Error> {
        Literal::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Literal, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Literal::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Literal, A::Error> {
        let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, item)) = map.next_entry::<String, Literal>()? {
            pairs.push((key, item));
        }
        Ok(Literal::Object(pairs))
    }
}
