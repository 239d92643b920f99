use crate::core::query::RecordQuery;
use crate::domain::model::Record;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn root_path(&self) -> &str;
    fn property_name(&self) -> &str;
    fn batch_size(&self) -> usize;
    fn csv_path(&self) -> Option<&str>;
    fn field_edits_path(&self) -> &str;
    fn store_path(&self) -> &str;
}

/// Session over the hierarchical content store.
///
/// Writes go through `stage` and stay pending until `commit`; one session serves a whole run.
#[async_trait]
pub trait ContentStore: Send {
    /// Tag attached to changes made through this session.
    fn set_user_data(&mut self, _user_data: &str) {}

    async fn find(&mut self, query: &RecordQuery) -> Result<Vec<String>>;
    async fn fetch(&mut self, path: &str) -> Result<Record>;
    async fn stage(&mut self, record: &Record) -> Result<()>;
    fn has_changes(&self) -> bool;
    async fn commit(&mut self) -> Result<()>;
}
