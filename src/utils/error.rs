use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Field edit resource {location} is malformed: {message}")]
    FieldEditResourceError { location: String, message: String },

    #[error("Field edit entry for [ {old_type} ] is malformed: {message}")]
    FieldEditEntryError { old_type: String, message: String },

    #[error("Could not change property [ {path}@{name} ]: {reason}")]
    PropertyError {
        path: String,
        name: String,
        reason: String,
    },

    #[error("Could not coerce array for [ {field} ]: {reason}")]
    CoercionError { field: String, reason: String },

    #[error("Store error at {path}: {message}")]
    StoreError { path: String, message: String },

    #[error("Query error: {message}")]
    QueryError { message: String },

    #[error("Commit failed: {message}")]
    CommitError { message: String },

    #[error("Illegal engine transition {from} -> {to}")]
    StateTransitionError { from: String, to: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    FieldEdit,
    Record,
    Store,
    Engine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl UpdateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            UpdateError::ConfigError { .. }
            | UpdateError::MissingConfigError { .. }
            | UpdateError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            UpdateError::IoError(_) | UpdateError::SerializationError(_) => ErrorCategory::Input,
            UpdateError::FieldEditResourceError { .. } | UpdateError::FieldEditEntryError { .. } => {
                ErrorCategory::FieldEdit
            }
            UpdateError::PropertyError { .. } | UpdateError::CoercionError { .. } => {
                ErrorCategory::Record
            }
            UpdateError::StoreError { .. }
            | UpdateError::QueryError { .. }
            | UpdateError::CommitError { .. } => ErrorCategory::Store,
            UpdateError::StateTransitionError { .. } => ErrorCategory::Engine,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            UpdateError::PropertyError { .. }
            | UpdateError::CoercionError { .. }
            | UpdateError::FieldEditEntryError { .. } => ErrorSeverity::Low,
            UpdateError::StoreError { .. } => ErrorSeverity::Medium,
            UpdateError::ConfigError { .. }
            | UpdateError::MissingConfigError { .. }
            | UpdateError::InvalidConfigValueError { .. }
            | UpdateError::SerializationError(_)
            | UpdateError::FieldEditResourceError { .. } => ErrorSeverity::High,
            UpdateError::IoError(_)
            | UpdateError::QueryError { .. }
            | UpdateError::CommitError { .. }
            | UpdateError::StateTransitionError { .. } => ErrorSeverity::Critical,
        }
    }

    /// Fatal errors abort the run; everything else is contained to one record or field.
    pub fn is_fatal(&self) -> bool {
        self.severity() >= ErrorSeverity::High
    }

    /// Process exit status for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check the command line flags and the job file",
            ErrorCategory::Input => "Make sure the CSV and JSON files exist and are readable",
            ErrorCategory::FieldEdit => "Fix the field edit JSON document and run again",
            ErrorCategory::Record => "Inspect the record's properties; other records were still processed",
            ErrorCategory::Store => "Check that the content store is reachable and writable; batches committed earlier stay committed",
            ErrorCategory::Engine => "Start a new run with a fresh engine",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            UpdateError::MissingConfigError { field } => format!("Missing required setting '{}'", field),
            UpdateError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            UpdateError::CommitError { .. } => {
                "Could not save changes to the content store".to_string()
            }
            other => format!("Could not process CSV type update. {}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, UpdateError>;
