//! Dinosaur records in storage form and API form.

use crate::id::DinosaurId;
use serde::Serialize;

/// A dinosaur that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDinosaur {
    pub name: String,
    pub kind: String,
}

impl NewDinosaur {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// A stored dinosaur. The identifier is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DinosaurRecord {
    pub id: DinosaurId,
    pub name: String,
    pub kind: String,
}

impl DinosaurRecord {
    /// The record a store holds once `dinosaur` was inserted under `id`.
    pub fn from_new(id: DinosaurId, dinosaur: NewDinosaur) -> Self {
        Self {
            id,
            name: dinosaur.name,
            kind: dinosaur.kind,
        }
    }
}

/// A dinosaur as the API returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dinosaur {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<DinosaurRecord> for Dinosaur {
    fn from(record: DinosaurRecord) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.name,
            kind: record.kind,
        }
    }
}

/// Status message returned by update and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationResponse {
    pub message: String,
}

impl MutationResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_to_api_form() {
        let id: DinosaurId = "650c1f1e1c9d440000a1b2c3".parse().unwrap();
        let record = DinosaurRecord::from_new(id, NewDinosaur::new("Tyrannosaurus", "Carnivore"));

        let dinosaur = Dinosaur::from(record);
        assert_eq!(dinosaur.id, "650c1f1e1c9d440000a1b2c3");
        assert_eq!(dinosaur.id.parse::<DinosaurId>().unwrap(), id);
        assert_eq!(
            serde_json::to_value(&dinosaur).unwrap(),
            json!({"id": "650c1f1e1c9d440000a1b2c3", "name": "Tyrannosaurus", "type": "Carnivore"})
        );
    }

    #[test]
    fn test_mutation_response_shape() {
        let response = MutationResponse::new("Dinosaurio no existe");
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({"message": "Dinosaurio no existe"})
        );
    }
}
