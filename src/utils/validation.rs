use crate::utils::error::{Result, UpdateError};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Store paths are absolute: `/` followed by slash-separated segments.
pub fn validate_store_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(UpdateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if !path.starts_with('/') {
        return Err(UpdateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path must be absolute".to_string(),
        });
    }

    if path.contains('\0') || path.contains("//") {
        return Err(UpdateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes or empty segments".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(UpdateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(UpdateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// Property names are single path segments.
pub fn validate_property_name(field_name: &str, name: &str) -> Result<()> {
    match property_name_problem(name) {
        Some(reason) => Err(UpdateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn property_name_problem(name: &str) -> Option<&'static str> {
    if name.trim().is_empty() {
        Some("Property name cannot be empty or whitespace-only")
    } else if name.contains('/') {
        Some("Property name cannot contain '/'")
    } else if name.contains('[') || name.contains(']') {
        Some("Property name cannot contain brackets")
    } else {
        None
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(UpdateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| UpdateError::MissingConfigError {
        field: field_name.to_string(),
    })
}
