pub mod batch;
pub mod coercer;
pub mod engine;
pub mod mutator;
pub mod query;
pub mod type_map;

pub use crate::domain::field_edits::{FieldEditSpec, FieldEdits};
pub use crate::domain::model::{Properties, PropertyValue, Record, UpdateReport};
pub use crate::domain::ports::{ConfigProvider, ContentStore, Storage};
pub use crate::utils::error::Result;
