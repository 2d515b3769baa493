//! Structured node metadata sent to discovery services.
//!
//! Metadata is a JSON-like document. Struct fields are kept in a `BTreeMap`
//! so the serialised form is canonical: equal documents always encode to the
//! same bytes regardless of insertion order.

use std::collections::BTreeMap;

use bincode::config;
use serde::{Deserialize, Serialize};

use super::{ConfigError, defaults::MAX_METADATA_DEPTH};

/// A single metadata value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MetadataValue {
    /// Explicit null.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Finite number.
    Number(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered list of values.
    List(Vec<MetadataValue>),
    /// Nested struct keyed by field name.
    Struct(BTreeMap<String, MetadataValue>),
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self { MetadataValue::Bool(value) }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self { MetadataValue::Number(value) }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self { MetadataValue::String(value.to_owned()) }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self { MetadataValue::String(value) }
}

impl From<Vec<MetadataValue>> for MetadataValue {
    fn from(value: Vec<MetadataValue>) -> Self { MetadataValue::List(value) }
}

/// Top-level node metadata document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    fields: BTreeMap<String, MetadataValue>,
}

impl NodeMetadata {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Set `key` to `value`, returning the updated document.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set `key` to `value`, replacing any existing field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Look up a top-level field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetadataValue> { self.fields.get(key) }

    /// Whether the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    /// Serialise to the canonical binary form handed to the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMetadata`] if the document contains a
    /// non-finite number, nests deeper than the supported limit, or fails to
    /// encode.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        for (key, value) in &self.fields {
            validate(key, value, 1)?;
        }
        bincode::serde::encode_to_vec(self, config::standard())
            .map_err(|e| ConfigError::InvalidMetadata(e.to_string()))
    }

    /// Decode a document previously produced by [`Self::to_canonical_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMetadata`] if the bytes do not decode.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let (metadata, _) = bincode::serde::decode_from_slice(bytes, config::standard())
            .map_err(|e| ConfigError::InvalidMetadata(e.to_string()))?;
        Ok(metadata)
    }

    /// Visit every key and string value in the document.
    pub(super) fn try_for_each_str<E>(
        &self,
        mut f: impl FnMut(&str) -> Result<(), E>,
    ) -> Result<(), E> {
        fn walk<E>(
            value: &MetadataValue,
            f: &mut impl FnMut(&str) -> Result<(), E>,
        ) -> Result<(), E> {
            match value {
                MetadataValue::String(s) => f(s),
                MetadataValue::List(items) => items.iter().try_for_each(|item| walk(item, f)),
                MetadataValue::Struct(fields) => fields.iter().try_for_each(|(key, item)| {
                    f(key)?;
                    walk(item, f)
                }),
                MetadataValue::Null | MetadataValue::Bool(_) | MetadataValue::Number(_) => Ok(()),
            }
        }

        self.fields.iter().try_for_each(|(key, value)| {
            f(key)?;
            walk(value, &mut f)
        })
    }
}

fn validate(path: &str, value: &MetadataValue, depth: usize) -> Result<(), ConfigError> {
    if depth > MAX_METADATA_DEPTH {
        return Err(ConfigError::InvalidMetadata(format!(
            "{path} nests deeper than {MAX_METADATA_DEPTH} levels"
        )));
    }
    match value {
        MetadataValue::Number(n) if !n.is_finite() => Err(ConfigError::InvalidMetadata(format!(
            "{path} holds non-finite number {n}"
        ))),
        MetadataValue::List(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| validate(&format!("{path}[{i}]"), item, depth + 1)),
        MetadataValue::Struct(fields) => fields
            .iter()
            .try_for_each(|(key, item)| validate(&format!("{path}.{key}"), item, depth + 1)),
        _ => Ok(()),
    }
}
