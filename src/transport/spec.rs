//! Transport specs and their normalization

use crate::transport::error::FactoryError;

use serde::Deserialize;
use serde_json::{Map, Value};

/// A transport spec as received from the caller, before normalization
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Spec {
    /// No configuration at all
    #[default]
    Absent,
    /// A mapping with optional `type` and `options` keys
    Mapping(Map<String, Value>),
    /// An ordered sequence of key-value pairs
    Pairs(Vec<(String, Value)>),
}

impl Spec {
    /// Collapse the spec into a [`TransportSpec`]
    pub fn normalize(self) -> TransportSpec {
        let mapping = match self {
            Spec::Absent => Map::new(),
            Spec::Mapping(mapping) => mapping,
            Spec::Pairs(pairs) => pairs.into_iter().collect(),
        };
        TransportSpec::from_mapping(mapping)
    }
}

impl TryFrom<Value> for Spec {
    type Error = FactoryError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Spec::Absent),
            Value::Object(mapping) => Ok(Spec::Mapping(mapping)),
            Value::Array(items) => pairs_from_array(items).map(Spec::Pairs).ok_or_else(|| {
                FactoryError::invalid_argument(
                    "spec must be null, a mapping, or an iterable of pairs",
                )
            }),
            _ => Err(FactoryError::invalid_argument(
                "spec must be null, a mapping, or an iterable of pairs",
            )),
        }
    }
}

impl From<Map<String, Value>> for Spec {
    fn from(mapping: Map<String, Value>) -> Self {
        Spec::Mapping(mapping)
    }
}

impl From<Vec<(String, Value)>> for Spec {
    fn from(pairs: Vec<(String, Value)>) -> Self {
        Spec::Pairs(pairs)
    }
}

impl From<TransportSpec> for Spec {
    fn from(spec: TransportSpec) -> Self {
        let mut mapping = Map::new();
        if let Some(kind) = spec.kind {
            mapping.insert("type".to_string(), kind);
        }
        if let Some(options) = spec.options {
            mapping.insert("options".to_string(), options);
        }
        Spec::Mapping(mapping)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Spec {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Spec::Pairs(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// A normalized spec: which transport to build and with which options
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TransportSpec {
    /// Alias or type identifier; `None` selects the default transport
    #[serde(rename = "type", default)]
    pub kind: Option<Value>,

    /// Backend-specific options, passed through untouched
    #[serde(default)]
    pub options: Option<Value>,
}

impl TransportSpec {
    /// Spec selecting the given alias or type identifier
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(Value::String(kind.into())),
            options: None,
        }
    }

    /// Attach options to the spec
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    fn from_mapping(mut mapping: Map<String, Value>) -> Self {
        // A null value behaves like a missing key
        let kind = mapping.remove("type").filter(|v| !v.is_null());
        let options = mapping.remove("options").filter(|v| !v.is_null());
        Self { kind, options }
    }
}

/// Interpret `options` as a mapping, accepting the same shapes as a spec
pub fn options_mapping(options: &Value) -> Option<Map<String, Value>> {
    match options {
        Value::Object(mapping) => Some(mapping.clone()),
        Value::Array(items) => {
            pairs_from_array(items.clone()).map(|pairs| pairs.into_iter().collect())
        }
        _ => None,
    }
}

/// Read `[["key", value], ...]`; later keys overwrite earlier ones once collected
fn pairs_from_array(items: Vec<Value>) -> Option<Vec<(String, Value)>> {
    items
        .into_iter()
        .map(|item| match item {
            Value::Array(pair) if pair.len() == 2 => {
                let mut pair = pair.into_iter();
                match (pair.next(), pair.next()) {
                    (Some(Value::String(key)), Some(value)) => Some((key, value)),
                    _ => None,
                }
            }
            _ => None,
        })
        .collect()
}
