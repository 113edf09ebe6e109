//! Dinosaur identifiers.

use mongodb::bson::oid::ObjectId;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The identifier the storage engine assigns to a dinosaur.
///
/// Displayed as 24 lowercase hex digits; `FromStr` accepts exactly that shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DinosaurId(ObjectId);

impl DinosaurId {
    /// Generates a fresh identifier.
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    pub const fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl From<ObjectId> for DinosaurId {
    fn from(id: ObjectId) -> Self {
        Self(id)
    }
}

/// Error decoding an identifier string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid dinosaur id \"{input}\": expected 24 hexadecimal characters")]
pub struct IdError {
    pub input: String,
}

impl FromStr for DinosaurId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 24 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(IdError {
                input: s.to_string(),
            });
        }
        ObjectId::parse_str(s).map(Self).map_err(|_| IdError {
            input: s.to_string(),
        })
    }
}

impl fmt::Display for DinosaurId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: DinosaurId = "650c1f1e1c9d440000a1b2c3".parse().unwrap();
        assert_eq!(id.to_string(), "650c1f1e1c9d440000a1b2c3");

        let upper: DinosaurId = "650C1F1E1C9D440000A1B2C3".parse().unwrap();
        assert_eq!(upper, id);
    }

    #[test]
    fn test_generated_id_round_trips() {
        let id = DinosaurId::generate();
        let text = id.to_string();
        assert_eq!(text.len(), 24);
        assert_eq!(text.parse::<DinosaurId>().unwrap(), id);
    }

    #[test]
    fn test_invalid_ids() {
        for input in ["", "123", "not-an-id", "650c1f1e1c9d440000a1b2c3d4", "650c1f1e1c9d440000a1b2cz"] {
            let err = input.parse::<DinosaurId>().unwrap_err();
            assert_eq!(err.input, input);
        }
    }
}
