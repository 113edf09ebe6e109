//! In-memory backend.

use crate::error::StoreResult;
use crate::id::DinosaurId;
use crate::model::{DinosaurRecord, NewDinosaur};
use crate::store::{DeleteOutcome, DinosaurStore, UpdateOutcome};
use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

/// Keeps records in insertion order behind a lock.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<IndexMap<DinosaurId, DinosaurRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `records`.
    pub fn with_records(records: impl IntoIterator<Item = DinosaurRecord>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().map(|r| (r.id, r)).collect()),
        }
    }
}

#[async_trait]
impl DinosaurStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_all(&self) -> StoreResult<Vec<DinosaurRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &DinosaurId) -> StoreResult<Option<DinosaurRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn insert(&self, dinosaur: NewDinosaur) -> StoreResult<DinosaurId> {
        let id = DinosaurId::generate();
        self.records
            .write()
            .await
            .insert(id, DinosaurRecord::from_new(id, dinosaur));
        Ok(id)
    }

    async fn replace_fields(
        &self,
        id: &DinosaurId,
        fields: NewDinosaur,
    ) -> StoreResult<UpdateOutcome> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(id) else {
            return Ok(UpdateOutcome::default());
        };
        let modified = record.name != fields.name || record.kind != fields.kind;
        record.name = fields.name;
        record.kind = fields.kind;
        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(modified),
        })
    }

    async fn delete(&self, id: &DinosaurId) -> StoreResult<DeleteOutcome> {
        let removed = self.records.write().await.shift_remove(id);
        Ok(DeleteOutcome {
            deleted: u64::from(removed.is_some()),
        })
    }
}
