use crate::domain::ports::Storage;
use crate::utils::error::{Result, UpdateError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Where the field edit document lives unless configured otherwise.
pub const DEFAULT_FIELD_EDITS_LOCATION: &str = "resource-props.json";

/// Edits applied to a record after its type property was rewritten.
///
/// `add` sets properties (scalars or array literals), `update` renames properties keeping
/// their value, `delete` removes properties. Only the shape of each step is checked here;
/// items that are not strings fail on their own when the edits are applied.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldEdits {
    #[serde(default)]
    pub add: Map<String, Value>,
    #[serde(default)]
    pub update: Map<String, Value>,
    #[serde(default)]
    pub delete: Vec<Value>,
}

impl FieldEdits {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum EntrySlot {
    Ready(FieldEdits),
    Malformed(String),
}

/// Field edits keyed by old type value, decoded once when the document is loaded.
///
/// A document that is not a JSON object is rejected as a whole. An entry that does not
/// decode is kept as malformed and only reported when a record asks for it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEditSpec {
    location: String,
    entries: BTreeMap<String, EntrySlot>,
}

impl FieldEditSpec {
    pub fn from_slice(location: &str, data: &[u8]) -> Result<Self> {
        let document: Value =
            serde_json::from_slice(data).map_err(|e| UpdateError::FieldEditResourceError {
                location: location.to_string(),
                message: e.to_string(),
            })?;
        Self::from_value(location, document)
    }

    pub fn from_value(location: &str, document: Value) -> Result<Self> {
        let Value::Object(object) = document else {
            return Err(UpdateError::FieldEditResourceError {
                location: location.to_string(),
                message: "top-level value must be an object keyed by old type".to_string(),
            });
        };

        let entries = object
            .into_iter()
            .map(|(old_type, entry)| {
                let slot = match serde_json::from_value::<FieldEdits>(entry) {
                    Ok(edits) => EntrySlot::Ready(edits),
                    Err(e) => {
                        tracing::debug!("Field edit entry [ {} ] does not decode: {}", old_type, e);
                        EntrySlot::Malformed(e.to_string())
                    }
                };
                (old_type, slot)
            })
            .collect();

        Ok(Self {
            location: location.to_string(),
            entries,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Edits for one old type. `Ok(None)` when the document has no entry for it.
    pub fn resolve(&self, old_type: &str) -> Result<Option<&FieldEdits>> {
        match self.entries.get(old_type) {
            None => Ok(None),
            Some(EntrySlot::Ready(edits)) => Ok(Some(edits)),
            Some(EntrySlot::Malformed(message)) => Err(UpdateError::FieldEditEntryError {
                old_type: old_type.to_string(),
                message: message.clone(),
            }),
        }
    }
}

/// Reads the field edit document from `storage`.
///
/// A missing document disables field edits for the run and is not an error.
pub async fn load_field_edits<S: Storage>(
    storage: &S,
    location: &str,
) -> Result<Option<FieldEditSpec>> {
    let data = match storage.read_file(location).await {
        Ok(data) => data,
        Err(UpdateError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::error!("Could not find file [ {} ]; field edits are disabled", location);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let spec = FieldEditSpec::from_slice(location, &data)?;
    tracing::info!(
        "Loaded field edits for {} old types from [ {} ]",
        spec.len(),
        location
    );
    Ok(Some(spec))
}
