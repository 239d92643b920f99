use anyhow::Result;
use async_trait::async_trait;
use csv_type_updater::core::query::RecordQuery;
use csv_type_updater::core::{ContentStore, Properties, PropertyValue, Record};
use csv_type_updater::{
    EngineState, FieldEditSpec, UpdateEngine, UpdateError, UpdateOptions,
};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};

const TYPE: &str = "sling:resourceType";

/// Store double that records every commit and can be told to fail.
#[derive(Default)]
struct MockStore {
    records: BTreeMap<String, Properties>,
    pending: BTreeMap<String, Properties>,
    commits: Vec<usize>,
    fail_fetch: HashSet<String>,
    fail_stage: HashSet<String>,
    fail_commit_after: Option<usize>,
    fail_query: bool,
}

impl MockStore {
    fn with_records(count: usize, type_value: &str) -> Self {
        let mut store = Self::default();
        for i in 0..count {
            store.records.insert(format!("/content/r{:05}", i), typed(type_value));
        }
        store
    }
}

#[async_trait]
impl ContentStore for MockStore {
    async fn find(&mut self, query: &RecordQuery) -> csv_type_updater::Result<Vec<String>> {
        if self.fail_query {
            return Err(UpdateError::StoreError {
                path: query.root().to_string(),
                message: "query engine unavailable".to_string(),
            });
        }
        Ok(self
            .records
            .iter()
            .filter(|(path, properties)| query.matches(path, properties))
            .map(|(path, _)| path.clone())
            .collect())
    }

    async fn fetch(&mut self, path: &str) -> csv_type_updater::Result<Record> {
        if self.fail_fetch.contains(path) {
            return Err(UpdateError::StoreError {
                path: path.to_string(),
                message: "access denied".to_string(),
            });
        }
        Ok(Record::new(path, self.records[path].clone()))
    }

    async fn stage(&mut self, record: &Record) -> csv_type_updater::Result<()> {
        if self.fail_stage.contains(record.path()) {
            return Err(UpdateError::StoreError {
                path: record.path().to_string(),
                message: "constraint violation".to_string(),
            });
        }
        self.pending
            .insert(record.path().to_string(), record.properties().clone());
        Ok(())
    }

    fn has_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    async fn commit(&mut self) -> csv_type_updater::Result<()> {
        if self.fail_commit_after == Some(self.commits.len()) {
            return Err(UpdateError::CommitError {
                message: "repository is read-only".to_string(),
            });
        }
        self.commits.push(self.pending.len());
        let pending = std::mem::take(&mut self.pending);
        self.records.extend(pending);
        Ok(())
    }
}

fn typed(value: &str) -> Properties {
    let mut properties = Properties::new();
    properties.insert(TYPE.to_string(), PropertyValue::from(value));
    properties
}

fn mapping_rows(pairs: &[(&str, &str)]) -> Vec<Vec<String>> {
    pairs
        .iter()
        .map(|(old, new)| vec![old.to_string(), new.to_string(), String::new()])
        .collect()
}

#[tokio::test]
async fn test_single_record_without_field_edits() -> Result<()> {
    let mut store = MockStore::default();
    store.records.insert("/content/page".to_string(), typed("old/type"));

    let mut engine = UpdateEngine::new(store, UpdateOptions::new("/content", TYPE));
    let report = engine
        .run(mapping_rows(&[("old/type", "new/type")]), None)
        .await?;

    assert_eq!(report.success, vec!["/content/page".to_string()]);
    assert!(report.failure.is_empty());

    let store = engine.into_store();
    let properties = &store.records["/content/page"];
    assert_eq!(properties[TYPE], PropertyValue::from("new/type"));
    assert_eq!(properties.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_delete_edit_removes_flag() -> Result<()> {
    let mut store = MockStore::default();
    let mut properties = typed("old/type");
    properties.insert("obsoleteFlag".to_string(), PropertyValue::Boolean(true));
    store.records.insert("/content/page".to_string(), properties);

    let spec = FieldEditSpec::from_value(
        "resource-props.json",
        json!({"old/type": {"delete": ["obsoleteFlag"]}}),
    )?;

    let mut engine = UpdateEngine::new(store, UpdateOptions::new("/content", TYPE));
    let report = engine
        .run(mapping_rows(&[("old/type", "new/type")]), Some(&spec))
        .await?;

    assert_eq!(report.success.len(), 1);
    let store = engine.into_store();
    let properties = &store.records["/content/page"];
    assert!(!properties.contains_key("obsoleteFlag"));
    assert_eq!(properties[TYPE], PropertyValue::from("new/type"));
    Ok(())
}

#[tokio::test]
async fn test_batches_of_one_thousand() -> Result<()> {
    let store = MockStore::with_records(2500, "old/type");

    let mut engine = UpdateEngine::new(
        store,
        UpdateOptions::new("/content", TYPE).with_batch_size(1000),
    );
    let report = engine
        .run(mapping_rows(&[("old/type", "new/type")]), None)
        .await?;

    assert_eq!(report.success.len(), 2500);
    let store = engine.into_store();
    assert_eq!(store.commits, vec![1000, 1000, 500]);
    assert!(store
        .records
        .values()
        .all(|p| p[TYPE] == PropertyValue::from("new/type")));
    Ok(())
}

#[tokio::test]
async fn test_exact_multiple_has_no_empty_final_commit() -> Result<()> {
    let store = MockStore::with_records(20, "old/type");

    let mut engine = UpdateEngine::new(store, UpdateOptions::new("/content", TYPE).with_batch_size(10));
    engine
        .run(mapping_rows(&[("old/type", "new/type")]), None)
        .await?;

    assert_eq!(engine.into_store().commits, vec![10, 10]);
    Ok(())
}

#[tokio::test]
async fn test_record_failures_are_isolated() -> Result<()> {
    let mut store = MockStore::with_records(5, "old/type");
    store.fail_fetch.insert("/content/r00001".to_string());
    store.fail_stage.insert("/content/r00003".to_string());

    let mut engine = UpdateEngine::new(store, UpdateOptions::new("/content", TYPE));
    let report = engine
        .run(mapping_rows(&[("old/type", "new/type")]), None)
        .await?;

    assert_eq!(
        report.success,
        vec!["/content/r00000", "/content/r00002", "/content/r00004"]
    );
    assert_eq!(report.failure, vec!["/content/r00001", "/content/r00003"]);
    assert_eq!(engine.state(), EngineState::Done);

    let store = engine.into_store();
    assert_eq!(store.records["/content/r00003"][TYPE], PropertyValue::from("old/type"));
    Ok(())
}

#[tokio::test]
async fn test_unmapped_records_are_not_reported() -> Result<()> {
    let mut store = MockStore::default();
    store.records.insert("/content/a".to_string(), typed("old/type"));
    store.records.insert("/content/b".to_string(), typed("kept/type"));

    let mut engine = UpdateEngine::new(store, UpdateOptions::new("/content", TYPE));
    let report = engine
        .run(mapping_rows(&[("old/type", "new/type")]), None)
        .await?;

    assert_eq!(report.success, vec!["/content/a"]);
    assert!(report.failure.is_empty());
    let store = engine.into_store();
    assert_eq!(store.records["/content/b"][TYPE], PropertyValue::from("kept/type"));
    Ok(())
}

#[tokio::test]
async fn test_malformed_entry_counts_as_success() -> Result<()> {
    let mut store = MockStore::default();
    store.records.insert("/content/a".to_string(), typed("old/type"));

    let spec = FieldEditSpec::from_value(
        "resource-props.json",
        json!({"old/type": {"update": ["not", "a", "map"]}}),
    )?;

    let mut engine = UpdateEngine::new(store, UpdateOptions::new("/content", TYPE));
    let report = engine
        .run(mapping_rows(&[("old/type", "new/type")]), Some(&spec))
        .await?;

    assert_eq!(report.success, vec!["/content/a"]);
    let store = engine.into_store();
    assert_eq!(store.records["/content/a"][TYPE], PropertyValue::from("new/type"));
    Ok(())
}

#[tokio::test]
async fn test_commit_failure_aborts_but_keeps_earlier_batches() -> Result<()> {
    let mut store = MockStore::with_records(25, "old/type");
    store.fail_commit_after = Some(1);

    let mut engine = UpdateEngine::new(store, UpdateOptions::new("/content", TYPE).with_batch_size(10));
    let err = engine
        .run(mapping_rows(&[("old/type", "new/type")]), None)
        .await
        .unwrap_err();

    assert!(matches!(err, UpdateError::CommitError { .. }));
    assert_eq!(engine.state(), EngineState::Failed);

    let store = engine.into_store();
    assert_eq!(store.commits, vec![10]);
    let rewritten = store
        .records
        .values()
        .filter(|p| p[TYPE] == PropertyValue::from("new/type"))
        .count();
    assert_eq!(rewritten, 10);
    Ok(())
}

#[tokio::test]
async fn test_query_failure_is_fatal() -> Result<()> {
    let mut store = MockStore::with_records(3, "old/type");
    store.fail_query = true;

    let mut engine = UpdateEngine::new(store, UpdateOptions::new("/content", TYPE));
    let err = engine
        .run(mapping_rows(&[("old/type", "new/type")]), None)
        .await
        .unwrap_err();

    assert!(matches!(err, UpdateError::QueryError { .. }));
    assert_eq!(engine.state(), EngineState::Failed);
    assert!(engine.into_store().commits.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_multiple_old_types_and_add_arrays() -> Result<()> {
    let mut store = MockStore::default();
    store.records.insert("/content/a".to_string(), typed("old/one"));
    store.records.insert("/content/b".to_string(), typed("old/two"));

    let spec = FieldEditSpec::from_value(
        "resource-props.json",
        json!({
            "old/one": {"add": {"ratios": ["0.5", "1"]}},
            "old/two": {"add": {"sizes": [1, 2, 3]}, "update": {"title": "jcr:title"}}
        }),
    )?;

    let rows = mapping_rows(&[("old/one", "new/one"), ("old/two", "new/two"), ("old/one", "newer/one")]);
    let mut engine = UpdateEngine::new(store, UpdateOptions::new("/content", TYPE));
    let report = engine.run(rows, Some(&spec)).await?;

    assert_eq!(report.success.len(), 2);
    let store = engine.into_store();
    assert_eq!(store.records["/content/a"][TYPE], PropertyValue::from("newer/one"));
    assert!(matches!(
        &store.records["/content/a"]["ratios"],
        PropertyValue::DecimalArray(values) if values.len() == 2
    ));
    assert_eq!(
        store.records["/content/b"]["sizes"],
        PropertyValue::LongArray(vec![1, 2, 3])
    );
    Ok(())
}
