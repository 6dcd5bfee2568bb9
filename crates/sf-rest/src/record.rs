//! Dynamic sobject records.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, Result};

/// A record as returned by query and retrieve: field name to JSON value, in
/// the order the service sent them.
///
/// Records coming from the service carry an `attributes` object with the
/// sobject `type` and record `url`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

/// The `attributes` member of a record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordAttributes {
    #[serde(rename = "type")]
    pub sobject_type: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    ///
    /// ```rust
    /// use forcelink_sf_rest::Record;
    ///
    /// let record = Record::new().with("Name", "Acme").with("NumberOfEmployees", 50);
    /// assert_eq!(record.get_str("Name"), Some("Acme"));
    /// ```
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn attributes(&self) -> Option<RecordAttributes> {
        self.0
            .get("attributes")
            .and_then(|v| RecordAttributes::deserialize(v).ok())
    }

    pub fn sobject_type(&self) -> Option<String> {
        self.attributes().map(|a| a.sobject_type)
    }

    /// The record id, from the `Id` field.
    pub fn id(&self) -> Option<&str> {
        self.get_str("Id")
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Parse a datetime field (`2024-01-15T10:30:00.000+0000`).
    pub fn get_datetime(&self, field: &str) -> Option<DateTime<FixedOffset>> {
        let raw = self.get_str(field)?;
        DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z")
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
    }

    /// Parse a date field (`2024-01-15`).
    pub fn get_date(&self, field: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.get_str(field)?, "%Y-%m-%d").ok()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Data fields, skipping `attributes`.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter().filter(|(k, _)| k.as_str() != "attributes")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Convert into a typed struct.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(Value::Object(self.0)).map_err(|e| {
            Error::with_source(
                ErrorKind::InvalidInput(format!("record does not match target type: {e}")),
                e,
            )
        })
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::invalid_input(format!(
                "expected a JSON object for a record, got {}",
                json_type(&other)
            ))),
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
