use crate::utils::error::{Result, UpdateError};
use crate::utils::validation::property_name_problem;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed property value as the content store keeps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    String(String),
    Boolean(bool),
    Long(i64),
    Double(f64),
    StringArray(Vec<String>),
    BooleanArray(Vec<bool>),
    LongArray(Vec<i64>),
    DecimalArray(Vec<Decimal>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Long(value)
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

/// One addressable node of the content store together with its property set.
///
/// A record is fetched from a [`ContentStore`](crate::domain::ports::ContentStore),
/// mutated in memory, then staged back. `modified` tracks whether anything changed
/// since the fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    path: String,
    properties: Properties,
    #[serde(skip)]
    modified: bool,
}

impl Record {
    pub fn new(path: impl Into<String>, properties: Properties) -> Self {
        Self {
            path: path.into(),
            properties,
            modified: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// String view of a property; multi-valued and non-string values read as absent.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropertyValue::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn set(&mut self, name: &str, value: PropertyValue) -> Result<Option<PropertyValue>> {
        self.check_name(name)?;
        self.modified = true;
        Ok(self.properties.insert(name.to_string(), value))
    }

    pub fn remove(&mut self, name: &str) -> Result<Option<PropertyValue>> {
        self.check_name(name)?;
        let removed = self.properties.remove(name);
        if removed.is_some() {
            self.modified = true;
        }
        Ok(removed)
    }

    fn check_name(&self, name: &str) -> Result<()> {
        match property_name_problem(name) {
            Some(reason) => Err(UpdateError::PropertyError {
                path: self.path.clone(),
                name: name.to_string(),
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Paths that were rewritten and paths that could not be, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub success: Vec<String>,
    pub failure: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UpdateReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_success(&mut self, path: impl Into<String>) {
        self.success.push(path.into());
    }

    pub fn add_failure(&mut self, path: impl Into<String>) {
        self.failure.push(path.into());
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Envelope for a run that ended before a report could be produced.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new().with_message(message)
    }

    pub fn missing_csv() -> Self {
        Self::failed("CSV file is missing")
    }

    pub fn from_error(error: &UpdateError) -> Self {
        Self::failed(format!("Could not process CSV type update. {}", error))
    }
}
