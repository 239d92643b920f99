use crate::core::coercer::{coerce_array, coerce_scalar};
use crate::core::type_map::TypeMapping;
use crate::domain::field_edits::{FieldEditSpec, FieldEdits};
use crate::domain::model::Record;
use serde_json::Value;

/// What happened to one field of an add, update or delete step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    Applied,
    /// The field a rename or delete refers to is not on the record.
    Absent,
    Failed(String),
}

/// Per-step counts for the field edits applied to one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditSummary {
    pub added: usize,
    pub renamed: usize,
    pub deleted: usize,
    pub absent: usize,
    pub failed: usize,
    /// Set when the field edit entry for the old type could not be decoded.
    pub entry_unavailable: bool,
}

impl EditSummary {
    fn count(&mut self, outcome: &FieldOutcome, applied: fn(&mut Self) -> &mut usize) {
        match outcome {
            FieldOutcome::Applied => *applied(self) += 1,
            FieldOutcome::Absent => self.absent += 1,
            FieldOutcome::Failed(_) => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The type property was rewritten; field edits may have partially failed.
    Updated { new_type: String, edits: EditSummary },
    /// The record's type is not in the mapping.
    Skipped,
    Failed(String),
}

/// Rewrites the type property of one record and applies the field edits for its old type.
pub struct RecordMutator<'a> {
    mapping: &'a TypeMapping,
    field_edits: Option<&'a FieldEditSpec>,
    property_name: &'a str,
}

impl<'a> RecordMutator<'a> {
    pub fn new(
        mapping: &'a TypeMapping,
        field_edits: Option<&'a FieldEditSpec>,
        property_name: &'a str,
    ) -> Self {
        Self {
            mapping,
            field_edits,
            property_name,
        }
    }

    pub fn apply(&self, record: &mut Record) -> RecordOutcome {
        let Some(old_type) = record.get_str(self.property_name).map(str::to_string) else {
            return RecordOutcome::Skipped;
        };
        let Some(new_type) = self.mapping.get(&old_type) else {
            return RecordOutcome::Skipped;
        };

        if let Err(e) = record.set(self.property_name, new_type.into()) {
            return RecordOutcome::Failed(e.to_string());
        }

        let mut edits = EditSummary::default();
        match self.field_edits {
            None => {
                tracing::debug!("No field edit document; only [ {} ] rewritten", record.path());
            }
            Some(spec) => match spec.resolve(&old_type) {
                Ok(Some(entry)) => apply_edits(entry, record, &mut edits),
                Ok(None) => {
                    tracing::debug!("No field edits for [ {} ]", old_type);
                }
                Err(e) => {
                    tracing::error!(
                        "[ {} ] was not available in [ {} ]: {}",
                        old_type,
                        spec.location(),
                        e
                    );
                    edits.entry_unavailable = true;
                }
            },
        }

        RecordOutcome::Updated {
            new_type: new_type.to_string(),
            edits,
        }
    }
}

/// Applies add, then update (rename), then delete.
pub fn apply_edits(entry: &FieldEdits, record: &mut Record, summary: &mut EditSummary) {
    for (field, value) in &entry.add {
        let outcome = add_property(record, field, value);
        if let FieldOutcome::Failed(reason) = &outcome {
            tracing::warn!("Could not add property [ {}@{} : {} ]: {}", record.path(), field, value, reason);
        }
        summary.count(&outcome, |s| &mut s.added);
    }

    for (field, new_name) in &entry.update {
        let outcome = match new_name.as_str() {
            Some(new_name) => rename_property(record, field, new_name),
            None => FieldOutcome::Failed(format!("new name {} is not a string", new_name)),
        };
        if let FieldOutcome::Failed(reason) = &outcome {
            tracing::warn!(
                "Could not update property [ {}@{} : {} ]: {}",
                record.path(),
                field,
                new_name,
                reason
            );
        }
        summary.count(&outcome, |s| &mut s.renamed);
    }

    for field in &entry.delete {
        let outcome = match field.as_str() {
            Some(name) => delete_property(record, name),
            None => FieldOutcome::Failed(format!("field name {} is not a string", field)),
        };
        if let FieldOutcome::Failed(reason) = &outcome {
            tracing::warn!("Could not delete property [ {}@{} ]: {}", record.path(), field, reason);
        }
        summary.count(&outcome, |s| &mut s.deleted);
    }
}

pub fn add_property(record: &mut Record, field: &str, value: &Value) -> FieldOutcome {
    let coerced = match value {
        Value::Array(items) => coerce_array(field, items),
        other => coerce_scalar(field, other),
    };
    match coerced.and_then(|value| record.set(field, value)) {
        Ok(_) => {
            tracing::trace!("Property '{}' added for record '{}'", field, record.path());
            FieldOutcome::Applied
        }
        Err(e) => FieldOutcome::Failed(e.to_string()),
    }
}

/// Moves the value of `field` to `new_name`. The value itself is unchanged.
pub fn rename_property(record: &mut Record, field: &str, new_name: &str) -> FieldOutcome {
    let Some(value) = record.get(field).cloned() else {
        return FieldOutcome::Absent;
    };
    if field == new_name {
        return FieldOutcome::Applied;
    }
    // Write the new name first so a rejected name leaves the record untouched.
    match record.set(new_name, value).and_then(|_| record.remove(field)) {
        Ok(_) => FieldOutcome::Applied,
        Err(e) => FieldOutcome::Failed(e.to_string()),
    }
}

pub fn delete_property(record: &mut Record, field: &str) -> FieldOutcome {
    match record.remove(field) {
        Ok(Some(_)) => FieldOutcome::Applied,
        Ok(None) => FieldOutcome::Absent,
        Err(e) => FieldOutcome::Failed(e.to_string()),
    }
}
