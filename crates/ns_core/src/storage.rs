use async_trait::async_trait;
use crate::types::{ArticleRecord, NewsQuery};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Create the schema and indices. Safe to call more than once.
    async fn init(&self) -> Result<()>;

    /// Insert the record, or overwrite the one already stored under `record.url`.
    async fn upsert(&self, record: &ArticleRecord) -> Result<()>;

    /// Records matching the query, most relevant first.
    async fn query(&self, query: &NewsQuery) -> Result<Vec<ArticleRecord>>;

    /// Every keyword attached to at least one record, sorted.
    async fn distinct_keywords(&self) -> Result<Vec<String>>;

    /// Remove all records together with the indices.
    async fn drop_all(&self) -> Result<()>;

    /// Remove all records, keeping the indices.
    async fn clear_content(&self) -> Result<()>;
}
