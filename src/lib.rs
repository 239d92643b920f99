pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, LogFormat};

pub use adapters::MemoryStore;
pub use config::{cli::LocalStorage, toml_config::JobConfig};
pub use core::{
    engine::{EngineState, UpdateEngine, UpdateOptions},
    type_map::{csv_rows, TypeMapping},
};
pub use domain::field_edits::{load_field_edits, FieldEditSpec};
pub use domain::model::UpdateReport;
pub use utils::error::{Result, UpdateError};
