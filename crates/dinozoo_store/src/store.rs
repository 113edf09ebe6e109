//! The store trait and backend selection.

use crate::error::{StoreError, StoreResult};
use crate::id::DinosaurId;
use crate::memory::InMemoryStore;
use crate::model::{DinosaurRecord, NewDinosaur};
use crate::mongo::MongoStore;
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of replacing the fields of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    /// Records matching the identifier.
    pub matched: u64,
    /// Records whose stored values changed.
    pub modified: u64,
}

/// Outcome of deleting one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteOutcome {
    pub deleted: u64,
}

/// A collection of dinosaur records. Every method is a single round trip.
#[async_trait]
pub trait DinosaurStore: Send + Sync {
    /// Name of the backend, for logging.
    fn backend(&self) -> &'static str;

    /// Every record, in storage order.
    async fn find_all(&self) -> StoreResult<Vec<DinosaurRecord>>;

    async fn find_by_id(&self, id: &DinosaurId) -> StoreResult<Option<DinosaurRecord>>;

    /// Inserts a record and returns the identifier assigned to it.
    async fn insert(&self, dinosaur: NewDinosaur) -> StoreResult<DinosaurId>;

    /// Sets `name` and `kind` of the record with `id`.
    async fn replace_fields(&self, id: &DinosaurId, fields: NewDinosaur)
        -> StoreResult<UpdateOutcome>;

    async fn delete(&self, id: &DinosaurId) -> StoreResult<DeleteOutcome>;
}

/// Opens the store named by `url`.
///
/// `memory://` selects the in-memory backend; `mongodb://` and `mongodb+srv://`
/// connect to MongoDB and use `collection` of `database`.
pub async fn connect(
    url: &str,
    database: &str,
    collection: &str,
) -> StoreResult<Arc<dyn DinosaurStore>> {
    let scheme = url.split_once("://").map_or(url, |(scheme, _)| scheme);
    match scheme {
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        "mongodb" | "mongodb+srv" => {
            let store = MongoStore::connect(url, database, collection).await?;
            Ok(Arc::new(store))
        }
        other => Err(StoreError::UnsupportedScheme(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_memory() {
        let store = connect("memory://", "zoo", "dinosaur").await.unwrap();
        assert_eq!(store.backend(), "memory");
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_unsupported_scheme() {
        let err = connect("postgres://localhost/zoo", "zoo", "dinosaur")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::UnsupportedScheme(scheme) if scheme == "postgres"));
    }
}
