pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_args::{CliConfig, LogFormat};

#[cfg(feature = "cli")]
mod cli_args {
    use super::toml_config::JobConfig;
    use crate::utils::error::Result;
    use clap::{Parser, ValueEnum};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
    pub enum LogFormat {
        #[default]
        Text,
        Json,
    }

    #[derive(Debug, Clone, Parser)]
    #[command(name = "csv-type-updater")]
    #[command(about = "Rewrite record types in a content store from a CSV mapping")]
    pub struct CliConfig {
        /// CSV with rows of `old type,new type,`
        #[arg(long)]
        pub csv: Option<String>,

        /// TOML job file; flags below override its values
        #[arg(short, long)]
        pub config: Option<String>,

        /// Only descendants of this path are updated
        #[arg(long)]
        pub root_path: Option<String>,

        /// Property holding the type value
        #[arg(long)]
        pub property_name: Option<String>,

        /// Records per commit
        #[arg(long)]
        pub batch_size: Option<usize>,

        /// Field edit JSON document (add/update/delete per old type)
        #[arg(long)]
        pub field_edits: Option<String>,

        /// JSON file holding the content store
        #[arg(long)]
        pub store: Option<String>,

        /// Also write the report to this file
        #[arg(long)]
        pub report: Option<String>,

        /// Directory relative input and report paths resolve against
        #[arg(long, default_value = ".")]
        pub base_dir: String,

        #[arg(long, help = "Mutate in memory and report without committing")]
        pub dry_run: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, value_enum, default_value_t = LogFormat::Text)]
        pub log_format: LogFormat,
    }

    impl CliConfig {
        /// Job file (or defaults) with command line overrides applied.
        pub fn job_config(&self) -> Result<JobConfig> {
            let mut job = match &self.config {
                Some(path) => JobConfig::from_file(path)?,
                None => JobConfig::default(),
            };

            if let Some(csv) = &self.csv {
                job.input.csv = Some(csv.clone());
            }
            if let Some(root_path) = &self.root_path {
                job.job.root_path = root_path.clone();
            }
            if let Some(property_name) = &self.property_name {
                job.job.property_name = property_name.clone();
            }
            if let Some(batch_size) = self.batch_size {
                job.job.batch_size = batch_size;
            }
            if let Some(field_edits) = &self.field_edits {
                job.input.field_edits = field_edits.clone();
            }
            if let Some(store) = &self.store {
                job.store.path = store.clone();
            }
            if let Some(report) = &self.report {
                job.output.report = Some(report.clone());
            }
            if self.dry_run {
                job.job.dry_run = true;
            }
            Ok(job)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::core::ConfigProvider;

        #[test]
        fn test_flags_override_defaults() {
            let cli = CliConfig::parse_from([
                "csv-type-updater",
                "--csv",
                "rows.csv",
                "--root-path",
                "/content/site",
                "--batch-size",
                "10",
                "--dry-run",
            ]);
            let job = cli.job_config().unwrap();

            assert_eq!(job.csv_path(), Some("rows.csv"));
            assert_eq!(job.root_path(), "/content/site");
            assert_eq!(job.batch_size(), 10);
            assert_eq!(job.property_name(), "sling:resourceType");
            assert!(job.options().dry_run);
        }

        #[test]
        fn test_log_format_flag() {
            let cli = CliConfig::parse_from(["csv-type-updater", "--log-format", "json"]);
            assert_eq!(cli.log_format, LogFormat::Json);
            assert_eq!(cli.base_dir, ".");
        }
    }
}
