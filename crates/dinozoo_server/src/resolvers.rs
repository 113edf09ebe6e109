//! Resolvers for the dinosaur schema.
//!
//! Every root field issues exactly one store call.

use dinozoo_runtime::{Context, ResolverArgs, ResolverError, ResolverInfo, ResolverMap, ResolverResult};
use dinozoo_store::{Dinosaur, DinosaurId, DinosaurRecord, DinosaurStore, MutationResponse, NewDinosaur};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// The schema served by the API.
pub const SCHEMA_SDL: &str = include_str!("../schema.graphql");

pub const MSG_UPDATE_NOT_FOUND: &str = "Dinosaurio no encontrado";
pub const MSG_UPDATED: &str = "Dinosaurio actualizado correctamente";
pub const MSG_DELETE_NOT_FOUND: &str = "Dinosaurio no existe";
pub const MSG_DELETED: &str = "Dinosaurio eliminado correctamente";

/// Root field resolvers backed by a shared store handle.
#[derive(Clone)]
pub struct DinosaurResolvers {
    store: Arc<dyn DinosaurStore>,
}

impl DinosaurResolvers {
    pub fn new(store: Arc<dyn DinosaurStore>) -> Self {
        Self { store }
    }

    /// `getDinosaur`: every stored dinosaur, in store order.
    pub async fn list(&self) -> ResolverResult {
        let records = self.store.find_all().await.map_err(ResolverError::custom)?;
        let dinosaurs: Vec<Dinosaur> = records.into_iter().map(Dinosaur::from).collect();
        to_json(&dinosaurs)
    }

    /// `getDinosaurById`: null when no record has the id.
    pub async fn get_by_id(&self, args: &ResolverArgs) -> ResolverResult {
        let id = parse_id(args)?;
        match self.store.find_by_id(&id).await.map_err(ResolverError::custom)? {
            Some(record) => to_json(&Dinosaur::from(record)),
            None => Ok(Value::Null),
        }
    }

    /// `addDinosaur`: returns the inputs under the assigned id.
    pub async fn add(&self, args: &ResolverArgs) -> ResolverResult {
        let dinosaur = new_dinosaur(args)?;
        let id = self
            .store
            .insert(dinosaur.clone())
            .await
            .map_err(ResolverError::custom)?;
        debug!(%id, "dinosaur added");
        to_json(&Dinosaur::from(DinosaurRecord::from_new(id, dinosaur)))
    }

    /// `modifiedDinosaur`: replaces name and type.
    ///
    /// An update that changes no stored value reports the record as not found.
    pub async fn modify(&self, args: &ResolverArgs) -> ResolverResult {
        let id = parse_id(args)?;
        let fields = new_dinosaur(args)?;
        let outcome = self
            .store
            .replace_fields(&id, fields)
            .await
            .map_err(ResolverError::custom)?;
        let message = if outcome.modified == 0 {
            MSG_UPDATE_NOT_FOUND
        } else {
            MSG_UPDATED
        };
        to_json(&MutationResponse::new(message))
    }

    /// `deleteDinosaur`.
    pub async fn delete(&self, args: &ResolverArgs) -> ResolverResult {
        let id = parse_id(args)?;
        let outcome = self.store.delete(&id).await.map_err(ResolverError::custom)?;
        let message = if outcome.deleted == 0 {
            MSG_DELETE_NOT_FOUND
        } else {
            MSG_DELETED
        };
        to_json(&MutationResponse::new(message))
    }

    /// Registers the root fields in `map`.
    pub fn register(&self, map: &mut ResolverMap) {
        let this = self.clone();
        map.register_async("Query", "getDinosaur", move |_args, ctx, info| {
            trace_call(&ctx, &info);
            let this = this.clone();
            async move { this.list().await }
        });

        let this = self.clone();
        map.register_async("Query", "getDinosaurById", move |args, ctx, info| {
            trace_call(&ctx, &info);
            let this = this.clone();
            async move { this.get_by_id(&args).await }
        });

        let this = self.clone();
        map.register_async("Mutation", "addDinosaur", move |args, ctx, info| {
            trace_call(&ctx, &info);
            let this = this.clone();
            async move { this.add(&args).await }
        });

        let this = self.clone();
        map.register_async("Mutation", "modifiedDinosaur", move |args, ctx, info| {
            trace_call(&ctx, &info);
            let this = this.clone();
            async move { this.modify(&args).await }
        });

        let this = self.clone();
        map.register_async("Mutation", "deleteDinosaur", move |args, ctx, info| {
            trace_call(&ctx, &info);
            let this = this.clone();
            async move { this.delete(&args).await }
        });
    }

    pub fn into_resolver_map(self) -> ResolverMap {
        let mut map = ResolverMap::new();
        self.register(&mut map);
        map
    }
}

fn trace_call(ctx: &Context, info: &ResolverInfo) {
    debug!(
        operation = ?ctx.operation,
        operation_name = ctx.operation_name.as_deref().unwrap_or("<anonymous>"),
        field = %info.field_name,
        "resolving root field"
    );
}

fn parse_id(args: &ResolverArgs) -> Result<DinosaurId, ResolverError> {
    let id: String = args.require("id")?;
    id.parse().map_err(ResolverError::custom)
}

fn new_dinosaur(args: &ResolverArgs) -> Result<NewDinosaur, ResolverError> {
    Ok(NewDinosaur::new(
        args.require::<String>("name")?,
        args.require::<String>("type")?,
    ))
}

fn to_json(value: &impl Serialize) -> ResolverResult {
    serde_json::to_value(value).map_err(|e| ResolverError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinozoo_store::InMemoryStore;
    use serde_json::json;

    fn args(pairs: &[(&str, &str)]) -> ResolverArgs {
        ResolverArgs::from_pairs(
            pairs
                .iter()
                .map(|(name, value)| ((*name).to_string(), json!(value)))
                .collect(),
        )
    }

    fn resolvers() -> DinosaurResolvers {
        DinosaurResolvers::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_add_returns_inputs() {
        let resolvers = resolvers();
        let added = resolvers
            .add(&args(&[("name", "Tyrannosaurus"), ("type", "Carnivore")]))
            .await
            .unwrap();
        assert_eq!(added["name"], "Tyrannosaurus");
        assert_eq!(added["type"], "Carnivore");

        let id = added["id"].as_str().unwrap();
        assert_eq!(id.len(), 24);
        let fetched = resolvers.get_by_id(&args(&[("id", id)])).await.unwrap();
        assert_eq!(fetched, added);
    }

    #[tokio::test]
    async fn test_list() {
        let resolvers = resolvers();
        assert_eq!(resolvers.list().await.unwrap(), json!([]));

        for name in ["Triceratops", "Stegosaurus"] {
            resolvers
                .add(&args(&[("name", name), ("type", "Herbivore")]))
                .await
                .unwrap();
        }
        let listed = resolvers.list().await.unwrap();
        let names: Vec<_> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].clone())
            .collect();
        assert_eq!(names, [json!("Triceratops"), json!("Stegosaurus")]);
    }

    #[tokio::test]
    async fn test_get_missing_is_null() {
        let id = DinosaurId::generate().to_string();
        let result = resolvers().get_by_id(&args(&[("id", &id)])).await.unwrap();
        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn test_invalid_id_is_error() {
        let err = resolvers()
            .get_by_id(&args(&[("id", "not-an-id")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::Custom(message) if message.contains("not-an-id")));
    }

    #[tokio::test]
    async fn test_modify() {
        let resolvers = resolvers();
        let missing = DinosaurId::generate().to_string();
        let result = resolvers
            .modify(&args(&[("id", &missing), ("name", "x"), ("type", "y")]))
            .await
            .unwrap();
        assert_eq!(result, json!({"message": MSG_UPDATE_NOT_FOUND}));

        let added = resolvers
            .add(&args(&[("name", "Rex"), ("type", "Carnivore")]))
            .await
            .unwrap();
        let id = added["id"].as_str().unwrap();
        let result = resolvers
            .modify(&args(&[("id", id), ("name", "Tyrannosaurus"), ("type", "Carnivore")]))
            .await
            .unwrap();
        assert_eq!(result, json!({"message": MSG_UPDATED}));

        let fetched = resolvers.get_by_id(&args(&[("id", id)])).await.unwrap();
        assert_eq!(fetched["name"], "Tyrannosaurus");
    }

    #[tokio::test]
    async fn test_modify_with_same_values_is_not_found() {
        let resolvers = resolvers();
        let added = resolvers
            .add(&args(&[("name", "Rex"), ("type", "Carnivore")]))
            .await
            .unwrap();
        let id = added["id"].as_str().unwrap();
        let result = resolvers
            .modify(&args(&[("id", id), ("name", "Rex"), ("type", "Carnivore")]))
            .await
            .unwrap();
        assert_eq!(result, json!({"message": MSG_UPDATE_NOT_FOUND}));
    }

    #[tokio::test]
    async fn test_delete() {
        let resolvers = resolvers();
        let added = resolvers
            .add(&args(&[("name", "Velociraptor"), ("type", "Carnivore")]))
            .await
            .unwrap();
        let id = added["id"].as_str().unwrap();

        let result = resolvers.delete(&args(&[("id", id)])).await.unwrap();
        assert_eq!(result, json!({"message": MSG_DELETED}));

        let result = resolvers.delete(&args(&[("id", id)])).await.unwrap();
        assert_eq!(result, json!({"message": MSG_DELETE_NOT_FOUND}));

        let fetched = resolvers.get_by_id(&args(&[("id", id)])).await.unwrap();
        assert_eq!(fetched, Value::Null);
    }

    #[test]
    fn test_register_covers_root_fields() {
        let map = resolvers().into_resolver_map();
        for (type_name, field) in [
            ("Query", "getDinosaur"),
            ("Query", "getDinosaurById"),
            ("Mutation", "addDinosaur"),
            ("Mutation", "modifiedDinosaur"),
            ("Mutation", "deleteDinosaur"),
        ] {
            assert!(map.contains(type_name, field), "{type_name}.{field}");
        }
        assert_eq!(map.len(), 5);
    }
}
