//! Storage layer for dinozoo.
//!
//! This crate provides:
//! - `id`: The `DinosaurId` identifier and its hex encoding
//! - `model`: Storage-form and API-form records, and the mapping between them
//! - `store`: The `DinosaurStore` trait and backend selection
//! - `memory`: In-memory backend
//! - `mongo`: MongoDB backend

pub mod error;
pub mod id;
pub mod memory;
pub mod model;
pub mod mongo;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use id::{DinosaurId, IdError};
pub use memory::InMemoryStore;
pub use model::{Dinosaur, DinosaurRecord, MutationResponse, NewDinosaur};
pub use mongo::MongoStore;
pub use store::{connect, DeleteOutcome, DinosaurStore, UpdateOutcome};
