use crate::core::query::RecordQuery;
use crate::domain::model::{Properties, Record};
use crate::domain::ports::ContentStore;
use crate::utils::error::{Result, UpdateError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Content store kept in memory, optionally backed by a JSON file.
///
/// The file maps each record path to its properties. Staged records stay pending until
/// `commit`, which promotes them and rewrites the backing file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: BTreeMap<String, Properties>,
    pending: BTreeMap<String, Properties>,
    backing_file: Option<PathBuf>,
    user_data: Option<String>,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(&path)?;
        let nodes: BTreeMap<String, Properties> = serde_json::from_slice(&data)?;
        tracing::debug!(
            "Opened store {} with {} records",
            path.as_ref().display(),
            nodes.len()
        );
        Ok(Self {
            nodes,
            backing_file: Some(path.as_ref().to_path_buf()),
            ..Self::default()
        })
    }

    pub fn insert(&mut self, path: impl Into<String>, properties: Properties) {
        self.nodes.insert(path.into(), properties);
    }

    /// Committed properties of a record; staged changes are not visible here.
    pub fn get(&self, path: &str) -> Option<&Properties> {
        self.nodes.get(path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn user_data(&self) -> Option<&str> {
        self.user_data.as_deref()
    }

    fn current(&self, path: &str) -> Option<&Properties> {
        self.pending.get(path).or_else(|| self.nodes.get(path))
    }

    fn persist(path: &Path, nodes: &BTreeMap<String, Properties>) -> Result<()> {
        let data = serde_json::to_vec_pretty(nodes)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn set_user_data(&mut self, user_data: &str) {
        self.user_data = Some(user_data.to_string());
    }

    async fn find(&mut self, query: &RecordQuery) -> Result<Vec<String>> {
        let paths = self
            .nodes
            .keys()
            .filter(|path| {
                self.current(path)
                    .is_some_and(|properties| query.matches(path, properties))
            })
            .cloned()
            .collect();
        Ok(paths)
    }

    async fn fetch(&mut self, path: &str) -> Result<Record> {
        self.current(path)
            .map(|properties| Record::new(path, properties.clone()))
            .ok_or_else(|| UpdateError::StoreError {
                path: path.to_string(),
                message: "no such record".to_string(),
            })
    }

    async fn stage(&mut self, record: &Record) -> Result<()> {
        if !self.nodes.contains_key(record.path()) {
            return Err(UpdateError::StoreError {
                path: record.path().to_string(),
                message: "record was removed".to_string(),
            });
        }
        if record.is_modified() {
            self.pending
                .insert(record.path().to_string(), record.properties().clone());
        }
        Ok(())
    }

    fn has_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    async fn commit(&mut self) -> Result<()> {
        let mut nodes = self.nodes.clone();
        nodes.extend(self.pending.clone());

        if let Some(path) = &self.backing_file {
            if let Err(e) = Self::persist(path, &nodes) {
                return Err(UpdateError::CommitError {
                    message: format!("could not write {}: {}", path.display(), e),
                });
            }
        }

        self.nodes = nodes;
        self.pending.clear();
        self.commits += 1;
        Ok(())
    }
}
