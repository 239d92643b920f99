use clap::Parser;
use csv_type_updater::core::{ConfigProvider, Storage};
use csv_type_updater::utils::logger;
use csv_type_updater::utils::validation::{validate_required_field, Validate};
use csv_type_updater::{
    csv_rows, load_field_edits, CliConfig, JobConfig, LocalStorage, LogFormat, MemoryStore,
    Result, UpdateEngine, UpdateReport,
};
use std::io::Cursor;
use std::path::Path;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Text => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("Starting csv-type-updater");
    tracing::debug!("CLI config: {:?}", cli);

    let job = match cli.job_config().and_then(|job| job.validate().map(|_| job)) {
        Ok(job) => job,
        Err(e) => {
            tracing::error!("Configuration validation failed: {}", e);
            tracing::error!("Suggestion: {}", e.recovery_suggestion());
            exit_with(UpdateReport::from_error(&e), e.exit_code());
        }
    };

    if job.csv_path().is_none() {
        tracing::error!("Could not find CSV file in request.");
        exit_with(UpdateReport::missing_csv(), 1);
    }

    let storage = LocalStorage::new(cli.base_dir.clone());

    match run(&job, &storage, &cli.base_dir).await {
        Ok(report) => {
            if let Err(e) = write_report(&job, &storage, &report).await {
                tracing::error!("Could not serialize results into JSON: {}", e);
                exit_with(UpdateReport::failed("Could not serialize results into JSON"), 2);
            }
            println!("{}", to_json(&report));
        }
        Err(e) => {
            tracing::error!(
                "Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());
            tracing::error!("{}", e.user_friendly_message());

            // 根據錯誤嚴重程度決定退出碼
            exit_with(UpdateReport::from_error(&e), e.exit_code());
        }
    }
}

async fn run(job: &JobConfig, storage: &LocalStorage, base_dir: &str) -> Result<UpdateReport> {
    let csv_path = validate_required_field("input.csv", &job.input.csv)?;
    let csv_data = storage.read_file(csv_path).await?;
    let rows = csv_rows(Cursor::new(csv_data));

    let field_edits = load_field_edits(storage, job.field_edits_path()).await?;

    let store = MemoryStore::open(Path::new(base_dir).join(job.store_path()))?;
    let mut engine = UpdateEngine::new(store, job.options());
    engine.run(rows, field_edits.as_ref()).await
}

async fn write_report(job: &JobConfig, storage: &LocalStorage, report: &UpdateReport) -> Result<()> {
    if let Some(path) = job.report_path() {
        let data = serde_json::to_vec_pretty(report)?;
        storage.write_file(path, &data).await?;
        tracing::info!("Report saved to: {}", path);
    }
    Ok(())
}

fn to_json(report: &UpdateReport) -> String {
    serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
}

fn exit_with(report: UpdateReport, code: i32) -> ! {
    println!("{}", to_json(&report));
    std::process::exit(code)
}
