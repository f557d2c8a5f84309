use async_trait::async_trait;
use ns_core::{ArticleStorage, Error, Result};
use std::sync::Arc;
use tracing::info;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: ArticleStorage {
    fn get_error_message() -> &'static str;

    /// Open the backend at `location` (a path or URL, backend specific) and
    /// make sure its schema exists.
    async fn new(location: Option<&str>) -> Result<Self>
    where
        Self: Sized;
}

/// Names accepted by [`create_storage`].
pub const STORAGE_KINDS: &[&str] = &[
    "memory",
    #[cfg(feature = "sqlite")]
    "sqlite",
];

async fn open<T: StorageBackend + 'static>(location: Option<&str>) -> Result<Arc<dyn ArticleStorage>> {
    let storage = T::new(location).await.map_err(|e| {
        Error::Storage(format!("{} ({})", T::get_error_message(), e))
    })?;
    Ok(Arc::new(storage))
}

pub async fn create_storage(kind: &str, location: Option<&str>) -> Result<Arc<dyn ArticleStorage>> {
    let storage = match kind {
        "memory" => open::<InMemoryStorage>(location).await?,
        #[cfg(feature = "sqlite")]
        "sqlite" => open::<SQLiteStorage>(location).await?,
        other => {
            return Err(Error::Storage(format!(
                "Unknown storage backend '{}', expected one of: {}",
                other,
                STORAGE_KINDS.join(", ")
            )))
        }
    };
    info!("Storage backend ready: {}", kind);
    Ok(storage)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage("memory", None).await.unwrap();
        assert!(storage.distinct_keywords().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_unknown_storage() {
        let err = create_storage("mongodb", None).await.err().unwrap();
        assert!(err.to_string().contains("mongodb"));
    }
}
