use crate::core::batch::{BatchCommitter, DEFAULT_BATCH_SIZE};
use crate::core::mutator::{RecordMutator, RecordOutcome};
use crate::core::query::RecordQuery;
use crate::core::type_map::TypeMapping;
use crate::domain::field_edits::FieldEditSpec;
use crate::domain::model::UpdateReport;
use crate::domain::ports::{ConfigProvider, ContentStore};
use crate::utils::error::{Result, UpdateError};
use crate::utils::validation::{
    validate_positive_number, validate_property_name, validate_store_path, Validate,
};
use std::fmt;
use std::time::Instant;

pub const DEFAULT_USER_DATA: &str = "csv-type-updater";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    MappingLoaded,
    Querying,
    Mutating,
    Committing,
    Done,
    Failed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub fn allowed_transitions(from: EngineState) -> Vec<EngineState> {
    use EngineState::*;
    match from {
        Idle => vec![MappingLoaded, Failed],
        MappingLoaded => vec![Querying, Failed],
        Querying => vec![Mutating, Failed],
        Mutating => vec![Committing, Failed],
        Committing => vec![Mutating, Done, Failed],
        Done => vec![],
        Failed => vec![],
    }
}

pub fn validate_transition(from: EngineState, to: EngineState) -> Result<()> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(UpdateError::StateTransitionError {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Scope and behaviour of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOptions {
    pub root_path: String,
    pub property_name: String,
    pub batch_size: usize,
    /// Tag handed to the store so listeners can tell where the changes came from.
    pub user_data: Option<String>,
    /// Mutate in memory and report, but never stage or commit.
    pub dry_run: bool,
}

impl UpdateOptions {
    pub fn new(root_path: impl Into<String>, property_name: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            property_name: property_name.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            user_data: Some(DEFAULT_USER_DATA.to_string()),
            dry_run: false,
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            batch_size: config.batch_size(),
            ..Self::new(config.root_path(), config.property_name())
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl Validate for UpdateOptions {
    fn validate(&self) -> Result<()> {
        validate_store_path("root_path", &self.root_path)?;
        validate_property_name("property_name", &self.property_name)?;
        validate_positive_number("batch_size", self.batch_size, 1)?;
        Ok(())
    }
}

/// Drives one run: mapping, query, per-record mutation and batched commits.
///
/// An engine runs once. Per-record failures end up in the report; query, commit and
/// transition errors end the run in [`EngineState::Failed`].
pub struct UpdateEngine<S: ContentStore> {
    store: S,
    options: UpdateOptions,
    state: EngineState,
}

impl<S: ContentStore> UpdateEngine<S> {
    pub fn new(store: S, options: UpdateOptions) -> Self {
        Self {
            store,
            options,
            state: EngineState::Idle,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn options(&self) -> &UpdateOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Builds the mapping from raw CSV rows, then runs it.
    pub async fn run<I, R>(
        &mut self,
        rows: I,
        field_edits: Option<&FieldEditSpec>,
    ) -> Result<UpdateReport>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[String]>,
    {
        let mapping = TypeMapping::from_rows(rows);
        self.run_mapping(&mapping, field_edits).await
    }

    pub async fn run_mapping(
        &mut self,
        mapping: &TypeMapping,
        field_edits: Option<&FieldEditSpec>,
    ) -> Result<UpdateReport> {
        let start = Instant::now();
        match self.execute(mapping, field_edits).await {
            Ok(report) => {
                self.transition(EngineState::Done)?;
                tracing::info!(
                    "Updated a TOTAL of [ {} ] records in {} ms ({} failed)",
                    report.success.len(),
                    start.elapsed().as_millis(),
                    report.failure.len()
                );
                Ok(report)
            }
            Err(e) => {
                if validate_transition(self.state, EngineState::Failed).is_ok() {
                    self.state = EngineState::Failed;
                }
                tracing::error!("Could not process CSV type update: {}", e);
                Err(e)
            }
        }
    }

    async fn execute(
        &mut self,
        mapping: &TypeMapping,
        field_edits: Option<&FieldEditSpec>,
    ) -> Result<UpdateReport> {
        self.options.validate()?;
        self.transition(EngineState::MappingLoaded)?;
        tracing::debug!("Loaded {} type translations", mapping.len());

        self.transition(EngineState::Querying)?;
        let query = RecordQuery::for_mapping(
            &self.options.root_path,
            &self.options.property_name,
            mapping,
        );
        let paths = if query.matches_nothing() {
            tracing::info!("Mapping is empty; no records to update");
            Vec::new()
        } else {
            tracing::debug!("Query: {}", query.statement().unwrap_or_default());
            self.store.find(&query).await.map_err(|e| match e {
                UpdateError::QueryError { .. } => e,
                other => UpdateError::QueryError {
                    message: other.to_string(),
                },
            })?
        };
        tracing::debug!("Query matched {} candidate records", paths.len());

        if let Some(user_data) = &self.options.user_data {
            self.store.set_user_data(user_data);
        }

        self.transition(EngineState::Mutating)?;
        let property_name = self.options.property_name.clone();
        let mutator = RecordMutator::new(mapping, field_edits, &property_name);
        let mut batch = BatchCommitter::new(self.options.batch_size);
        let mut report = UpdateReport::new();

        for path in paths {
            let mut record = match self.store.fetch(&path).await {
                Ok(record) => record,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!("Could not read [ {} ]: {}", path, e);
                    report.add_failure(path);
                    continue;
                }
            };

            match mutator.apply(&mut record) {
                RecordOutcome::Skipped => {
                    tracing::debug!("Skipping [ {} ]; type is not mapped", path);
                }
                RecordOutcome::Failed(reason) => {
                    tracing::warn!("Could not update [ {}@{} ]: {}", path, property_name, reason);
                    report.add_failure(path);
                }
                RecordOutcome::Updated { new_type, edits } => {
                    tracing::debug!("[ {} ] ~> [ {} ] edits: {:?}", path, new_type, edits);
                    if self.options.dry_run {
                        report.add_success(path);
                        continue;
                    }
                    match self.store.stage(&record).await {
                        Ok(()) => {
                            report.add_success(path);
                            if batch.pending() + 1 >= self.options.batch_size {
                                self.transition(EngineState::Committing)?;
                                batch.record_change(&mut self.store).await?;
                                self.transition(EngineState::Mutating)?;
                            } else {
                                batch.record_change(&mut self.store).await?;
                            }
                        }
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => {
                            tracing::warn!("Could not update [ {}@{} ]: {}", path, property_name, e);
                            report.add_failure(path);
                        }
                    }
                }
            }
        }

        self.transition(EngineState::Committing)?;
        batch.finish(&mut self.store).await?;
        tracing::debug!("{} commits for this run", batch.commits());

        Ok(report)
    }

    fn transition(&mut self, to: EngineState) -> Result<()> {
        validate_transition(self.state, to)?;
        tracing::trace!("Engine {} -> {}", self.state, to);
        self.state = to;
        Ok(())
    }
}
