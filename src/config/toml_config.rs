use crate::core::batch::DEFAULT_BATCH_SIZE;
use crate::core::engine::UpdateOptions;
use crate::core::ConfigProvider;
use crate::domain::field_edits::DEFAULT_FIELD_EDITS_LOCATION;
use crate::utils::error::{Result, UpdateError};
use crate::utils::validation::{
    validate_file_path, validate_positive_number, validate_property_name, validate_store_path,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PROPERTY_NAME: &str = "sling:resourceType";
pub const DEFAULT_ROOT_PATH: &str = "/content";
pub const DEFAULT_STORE_PATH: &str = "store.json";

/// Settings for one update run, usually read from a TOML job file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub job: JobSection,
    #[serde(default)]
    pub input: InputSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSection {
    #[serde(default = "default_root_path")]
    pub root_path: String,
    #[serde(default = "default_property_name")]
    pub property_name: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub dry_run: bool,
    pub user_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSection {
    pub csv: Option<String>,
    #[serde(default = "default_field_edits")]
    pub field_edits: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default = "default_store_path")]
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    pub report: Option<String>,
}

fn default_root_path() -> String {
    DEFAULT_ROOT_PATH.to_string()
}

fn default_property_name() -> String {
    DEFAULT_PROPERTY_NAME.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_field_edits() -> String {
    DEFAULT_FIELD_EDITS_LOCATION.to_string()
}

fn default_store_path() -> String {
    DEFAULT_STORE_PATH.to_string()
}

impl Default for JobSection {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            property_name: default_property_name(),
            batch_size: default_batch_size(),
            dry_run: false,
            user_data: None,
        }
    }
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            csv: None,
            field_edits: default_field_edits(),
        }
    }
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl JobConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(UpdateError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| UpdateError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${STORE_PATH})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;

        static ENV_VAR: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn options(&self) -> UpdateOptions {
        let mut options = UpdateOptions::from_config(self).with_dry_run(self.job.dry_run);
        if let Some(user_data) = &self.job.user_data {
            options.user_data = Some(user_data.clone());
        }
        options
    }

    pub fn report_path(&self) -> Option<&str> {
        self.output.report.as_deref()
    }
}

impl ConfigProvider for JobConfig {
    fn root_path(&self) -> &str {
        &self.job.root_path
    }

    fn property_name(&self) -> &str {
        &self.job.property_name
    }

    fn batch_size(&self) -> usize {
        self.job.batch_size
    }

    fn csv_path(&self) -> Option<&str> {
        self.input.csv.as_deref()
    }

    fn field_edits_path(&self) -> &str {
        &self.input.field_edits
    }

    fn store_path(&self) -> &str {
        &self.store.path
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        validate_store_path("job.root_path", &self.job.root_path)?;
        validate_property_name("job.property_name", &self.job.property_name)?;
        validate_positive_number("job.batch_size", self.job.batch_size, 1)?;
        validate_file_path("input.field_edits", &self.input.field_edits)?;
        validate_file_path("store.path", &self.store.path)?;
        if let Some(csv) = &self.input.csv {
            validate_file_path("input.csv", csv)?;
        }
        Ok(())
    }
}
