//! MongoDB backend.

use crate::error::{StoreError, StoreResult};
use crate::id::DinosaurId;
use crate::model::{DinosaurRecord, NewDinosaur};
use crate::store::{DeleteOutcome, DinosaurStore, UpdateOutcome};
use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A dinosaur document as stored in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DinosaurDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<NewDinosaur> for DinosaurDocument {
    fn from(dinosaur: NewDinosaur) -> Self {
        Self {
            id: None,
            name: dinosaur.name,
            kind: dinosaur.kind,
        }
    }
}

impl TryFrom<DinosaurDocument> for DinosaurRecord {
    type Error = StoreError;

    fn try_from(document: DinosaurDocument) -> Result<Self, Self::Error> {
        let id = document.id.ok_or(StoreError::MissingIdentifier)?;
        Ok(Self {
            id: id.into(),
            name: document.name,
            kind: document.kind,
        })
    }
}

/// Store backed by one MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoStore {
    collection: Collection<DinosaurDocument>,
}

impl MongoStore {
    /// Connects to `url` and checks the deployment answers a ping.
    pub async fn connect(url: &str, database: &str, collection: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(url).await?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 }, None).await?;
        info!(database, collection, "connected to MongoDB");
        Ok(Self {
            collection: db.collection(collection),
        })
    }
}

#[async_trait]
impl DinosaurStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn find_all(&self) -> StoreResult<Vec<DinosaurRecord>> {
        let mut cursor = self.collection.find(None, None).await?;
        let mut records = Vec::new();
        while cursor.advance().await? {
            records.push(DinosaurRecord::try_from(cursor.deserialize_current()?)?);
        }
        debug!(count = records.len(), "fetched dinosaurs");
        Ok(records)
    }

    async fn find_by_id(&self, id: &DinosaurId) -> StoreResult<Option<DinosaurRecord>> {
        self.collection
            .find_one(doc! { "_id": id.object_id() }, None)
            .await?
            .map(DinosaurRecord::try_from)
            .transpose()
    }

    async fn insert(&self, dinosaur: NewDinosaur) -> StoreResult<DinosaurId> {
        let result = self
            .collection
            .insert_one(DinosaurDocument::from(dinosaur), None)
            .await?;
        result
            .inserted_id
            .as_object_id()
            .map(DinosaurId::from)
            .ok_or(StoreError::UnexpectedInsertId)
    }

    async fn replace_fields(
        &self,
        id: &DinosaurId,
        fields: NewDinosaur,
    ) -> StoreResult<UpdateOutcome> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.object_id() },
                doc! { "$set": { "name": fields.name, "type": fields.kind } },
                None,
            )
            .await?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete(&self, id: &DinosaurId) -> StoreResult<DeleteOutcome> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.object_id() }, None)
            .await?;
        Ok(DeleteOutcome {
            deleted: result.deleted_count,
        })
    }
}
