//! Query executor for dinozoo.
//!
//! Executes a validated operation against a schema and a resolver map.
//! Fields run one after another in document order, for queries and mutations alike.

use crate::coercion::{coerce_input_value, is_missing_variable, serialize_output, value_from_ast};
use crate::error::ErrorCode;
use crate::resolver::{ResolverArgs, ResolverInfo, ResolverMap};
use crate::schema::{FieldDef, ObjectDef, Schema, TypeDef, TypeRef};
use dinozoo_core::{LineIndex, Location};
use dinozoo_syntax::ast::{
    self, Directive, Document, FieldSelection, FragmentDefinition, OperationDefinition,
    OperationType, Selection, SelectionSet,
};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Per-request context handed to every resolver.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Kind of the operation being executed.
    pub operation: Option<OperationType>,

    /// Name of the operation, if it has one.
    pub operation_name: Option<String>,
}

impl Context {
    pub fn new(operation: &OperationDefinition) -> Self {
        Self {
            operation: Some(operation.operation),
            operation_name: operation.name.as_ref().map(|name| name.value.clone()),
        }
    }
}

/// A segment of a response path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// A GraphQL error as reported in the `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<IndexMap<String, Value>>,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: None,
            path: None,
            extensions: None,
        }
    }

    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_locations(mut self, locations: Vec<Location>) -> Self {
        if !locations.is_empty() {
            self.locations = Some(locations);
        }
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value);
        self
    }

    /// Sets `extensions.code`.
    pub fn with_code(self, code: ErrorCode) -> Self {
        self.with_extension("code", Value::String(code.as_str().to_string()))
    }

    /// Returns `extensions.code`, if set.
    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }
}

/// An execution result.
///
/// `data` is absent when the request failed before execution started,
/// and null when a non-null root field failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl Response {
    /// Creates a successful response.
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// Creates a response for a request that was rejected before execution.
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        Self {
            data: None,
            errors: Some(errors),
        }
    }

    /// Creates a response for a single request error.
    pub fn error(error: FieldError) -> Self {
        Self::from_errors(vec![error])
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.as_ref().map_or(true, Vec::is_empty)
    }
}

/// Operation executor.
#[derive(Debug, Clone)]
pub struct Executor {
    schema: Arc<Schema>,
    resolvers: Arc<ResolverMap>,
}

impl Executor {
    /// Creates a new executor.
    pub fn new(schema: Arc<Schema>, resolvers: Arc<ResolverMap>) -> Self {
        Self { schema, resolvers }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Executes `operation`, which must come from the already validated `document`.
    ///
    /// `index` maps spans of the document source to error locations.
    pub async fn execute(
        &self,
        document: &Document,
        operation: &OperationDefinition,
        variables: &Map<String, Value>,
        index: &LineIndex<'_>,
    ) -> Response {
        let variables = match coerce_variables(&self.schema, operation, variables, index) {
            Ok(variables) => variables,
            Err(errors) => return Response::from_errors(errors),
        };

        let Some(root) = self.schema.root_type(operation.operation) else {
            return Response::error(
                FieldError::new(format!(
                    "Schema is not configured to execute {} operation.",
                    operation.operation
                ))
                .with_code(ErrorCode::ValidationError),
            );
        };

        let mut ctx = ExecutionContext {
            schema: &self.schema,
            resolvers: &self.resolvers,
            fragments: document
                .fragments()
                .map(|fragment| (fragment.name.value.as_str(), fragment))
                .collect(),
            variables,
            context: Context::new(operation),
            index,
            errors: Vec::new(),
        };

        let mut fields = IndexMap::new();
        ctx.collect_fields(
            root,
            &operation.selection_set,
            &mut fields,
            &mut FxHashSet::default(),
        );
        let root_value = Value::Object(Map::new());
        let data = ctx
            .execute_fields(root, &root_value, fields, Vec::new())
            .await
            .unwrap_or(Value::Null);

        Response {
            data: Some(data),
            errors: (!ctx.errors.is_empty()).then_some(ctx.errors),
        }
    }
}

/// Coerces request variables to the types the operation declares.
pub fn coerce_variables(
    schema: &Schema,
    operation: &OperationDefinition,
    provided: &Map<String, Value>,
    index: &LineIndex<'_>,
) -> Result<Map<String, Value>, Vec<FieldError>> {
    let mut coerced = Map::new();
    let mut errors = Vec::new();

    for def in &operation.variables {
        let name = &def.name.value;
        let ty = TypeRef::from_ast(&def.ty);
        let result = match provided.get(name) {
            Some(value) => coerce_input_value(schema, value, &ty).map_err(|message| {
                format!("Variable \"${name}\" got invalid value {value}; {message}")
            }),
            None => match &def.default_value {
                Some(default) => value_from_ast(schema, default, &ty, &Map::new()),
                None if ty.is_non_null() => Err(format!(
                    "Variable \"${name}\" of required type \"{ty}\" was not provided."
                )),
                None => continue,
            },
        };
        match result {
            Ok(value) => {
                coerced.insert(name.clone(), value);
            }
            Err(message) => errors.push(
                FieldError::new(message)
                    .with_locations(vec![index.span_start(def.span)])
                    .with_code(ErrorCode::BadUserInput),
            ),
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

type BoxFuture<'b, T> = Pin<Box<dyn Future<Output = T> + Send + 'b>>;

/// The position being completed became null; its error is already recorded.
#[derive(Debug)]
struct Propagate;

type Completion = Result<Value, Propagate>;

/// A field being completed, with every node merged under its response key.
struct ResolvedField<'a> {
    parent_type: &'a str,
    name: &'a str,
    nodes: Vec<&'a FieldSelection>,
}

type FieldsByKey<'a> = IndexMap<&'a str, Vec<&'a FieldSelection>>;

struct ExecutionContext<'a> {
    schema: &'a Schema,
    resolvers: &'a ResolverMap,
    fragments: FxHashMap<&'a str, &'a FragmentDefinition>,
    variables: Map<String, Value>,
    context: Context,
    index: &'a LineIndex<'a>,
    errors: Vec<FieldError>,
}

impl<'a> ExecutionContext<'a> {
    fn record(&mut self, error: FieldError, node: &FieldSelection, path: &[PathSegment]) {
        let location = self.index.span_start(node.span);
        self.errors
            .push(error.with_locations(vec![location]).with_path(path.to_vec()));
    }

    fn collect_fields(
        &self,
        object_type: &ObjectDef,
        set: &'a SelectionSet,
        fields: &mut FieldsByKey<'a>,
        visited: &mut FxHashSet<&'a str>,
    ) {
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => {
                    if self.should_include(&field.directives) {
                        fields.entry(field.response_key()).or_default().push(field);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if !self.should_include(&spread.directives)
                        || !visited.insert(spread.name.value.as_str())
                    {
                        continue;
                    }
                    let Some(fragment) = self.fragments.get(spread.name.value.as_str()).copied()
                    else {
                        continue;
                    };
                    if fragment.type_condition.value == object_type.name {
                        self.collect_fields(object_type, &fragment.selection_set, fields, visited);
                    }
                }
                Selection::InlineFragment(inline) => {
                    let applies = inline
                        .type_condition
                        .as_ref()
                        .map_or(true, |condition| condition.value == object_type.name);
                    if applies && self.should_include(&inline.directives) {
                        self.collect_fields(object_type, &inline.selection_set, fields, visited);
                    }
                }
            }
        }
    }

    /// Evaluates `@skip` and `@include`.
    fn should_include(&self, directives: &[Directive]) -> bool {
        directives.iter().all(|directive| {
            let condition = directive
                .arguments
                .iter()
                .find(|arg| arg.name.value == "if")
                .is_some_and(|arg| match &arg.value {
                    ast::Value::Boolean(value, _) => *value,
                    ast::Value::Variable(name) => {
                        self.variables.get(&name.value).and_then(Value::as_bool) == Some(true)
                    }
                    _ => false,
                });
            match directive.name.value.as_str() {
                "skip" => !condition,
                "include" => condition,
                _ => true,
            }
        })
    }

    fn coerce_arguments(&self, def: &FieldDef, field: &FieldSelection) -> Result<ResolverArgs, String> {
        let mut args = ResolverArgs::new();
        for (name, arg_def) in &def.arguments {
            let provided = field
                .arguments
                .iter()
                .find(|arg| arg.name.value == *name)
                .filter(|arg| !is_missing_variable(&arg.value, &self.variables));
            match provided {
                Some(arg) => {
                    let value = value_from_ast(self.schema, &arg.value, &arg_def.ty, &self.variables)
                        .map_err(|message| format!("Argument \"{name}\" has invalid value: {message}"))?;
                    args.set(name.clone(), value);
                }
                None => {
                    if let Some(default) = &arg_def.default_value {
                        args.set(
                            name.clone(),
                            value_from_ast(self.schema, default, &arg_def.ty, &Map::new())?,
                        );
                    } else if arg_def.ty.is_non_null() {
                        return Err(format!(
                            "Argument \"{name}\" of required type \"{}\" was not provided.",
                            arg_def.ty
                        ));
                    }
                }
            }
        }
        Ok(args)
    }

    fn execute_fields<'b>(
        &'b mut self,
        object_type: &'a ObjectDef,
        parent: &'b Value,
        fields: FieldsByKey<'a>,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'b, Completion> {
        Box::pin(async move {
            let mut result = Map::new();
            for (key, nodes) in fields {
                let mut field_path = path.clone();
                field_path.push(PathSegment::Field(key.to_string()));
                let value = self
                    .execute_field(object_type, parent, nodes, field_path)
                    .await?;
                result.insert(key.to_string(), value);
            }
            Ok(Value::Object(result))
        })
    }

    fn execute_field<'b>(
        &'b mut self,
        object_type: &'a ObjectDef,
        parent: &'b Value,
        nodes: Vec<&'a FieldSelection>,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'b, Completion> {
        Box::pin(async move {
            let Some(&node) = nodes.first() else {
                return Ok(Value::Null);
            };
            let name = node.name.value.as_str();
            if name == "__typename" {
                return Ok(Value::String(object_type.name.clone()));
            }
            let Some(def) = object_type.fields.get(name) else {
                return Ok(Value::Null);
            };

            let args = match self.coerce_arguments(def, node) {
                Ok(args) => args,
                Err(message) => {
                    self.record(
                        FieldError::new(message).with_code(ErrorCode::BadUserInput),
                        node,
                        &path,
                    );
                    return null_or_propagate(&def.ty);
                }
            };

            let info = ResolverInfo::new(name, object_type.name.as_str())
                .with_return_type(def.ty.to_string())
                .with_path(path.clone());
            let resolvers = self.resolvers;
            let resolved = resolvers
                .get(&object_type.name, name)
                .resolve(parent, &args, &self.context, &info)
                .await;

            match resolved {
                Ok(value) => {
                    let field = ResolvedField {
                        parent_type: &object_type.name,
                        name,
                        nodes,
                    };
                    self.complete_value(&def.ty, &field, value, path).await
                }
                Err(error) => {
                    self.record(error.into(), node, &path);
                    null_or_propagate(&def.ty)
                }
            }
        })
    }

    fn complete_value<'b>(
        &'b mut self,
        ty: &'a TypeRef,
        field: &'b ResolvedField<'a>,
        value: Value,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'b, Completion> {
        Box::pin(async move {
            if let TypeRef::NonNull(inner) = ty {
                let completed = self.complete_inner(inner, field, value, &path).await?;
                if completed.is_null() {
                    let message = format!(
                        "Cannot return null for non-nullable field {}.{}.",
                        field.parent_type, field.name
                    );
                    self.record(
                        FieldError::new(message).with_code(ErrorCode::ExecutionError),
                        field.nodes[0],
                        &path,
                    );
                    return Err(Propagate);
                }
                return Ok(completed);
            }
            Ok(self
                .complete_inner(ty, field, value, &path)
                .await
                .unwrap_or(Value::Null))
        })
    }

    /// Completes a value of a nullable type; errors are left for the caller to absorb.
    fn complete_inner<'b>(
        &'b mut self,
        ty: &'a TypeRef,
        field: &'b ResolvedField<'a>,
        value: Value,
        path: &'b [PathSegment],
    ) -> BoxFuture<'b, Completion> {
        Box::pin(async move {
            if value.is_null() {
                return Ok(Value::Null);
            }
            match ty {
                TypeRef::NonNull(_) => self.complete_value(ty, field, value, path.to_vec()).await,
                TypeRef::List(inner) => {
                    let Value::Array(items) = value else {
                        let message = format!(
                            "Expected Iterable, but did not find one for field \"{}.{}\".",
                            field.parent_type, field.name
                        );
                        self.record(
                            FieldError::new(message).with_code(ErrorCode::ExecutionError),
                            field.nodes[0],
                            path,
                        );
                        return Err(Propagate);
                    };
                    let mut completed = Vec::with_capacity(items.len());
                    for (i, item) in items.into_iter().enumerate() {
                        let mut item_path = path.to_vec();
                        item_path.push(PathSegment::Index(i));
                        completed.push(self.complete_value(inner, field, item, item_path).await?);
                    }
                    Ok(Value::Array(completed))
                }
                TypeRef::Named(type_name) => {
                    let schema = self.schema;
                    match schema.get_type(type_name) {
                        Some(TypeDef::Object(object)) => {
                            let mut fields = IndexMap::new();
                            let mut visited = FxHashSet::default();
                            for &node in &field.nodes {
                                if let Some(set) = &node.selection_set {
                                    self.collect_fields(object, set, &mut fields, &mut visited);
                                }
                            }
                            self.execute_fields(object, &value, fields, path.to_vec()).await
                        }
                        Some(leaf) => serialize_output(leaf, value).map_err(|message| {
                            self.record(
                                FieldError::new(message).with_code(ErrorCode::ExecutionError),
                                field.nodes[0],
                                path,
                            );
                            Propagate
                        }),
                        None => {
                            self.record(
                                FieldError::new(format!("Unknown type \"{type_name}\"."))
                                    .with_code(ErrorCode::InternalError),
                                field.nodes[0],
                                path,
                            );
                            Err(Propagate)
                        }
                    }
                }
            }
        })
    }
}

fn null_or_propagate(ty: &TypeRef) -> Completion {
    if ty.is_non_null() {
        Err(Propagate)
    } else {
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverError;
    use crate::validation::validate;
    use serde_json::json;

    const SDL: &str = r"
        type Dinosaur {
            id: ID!
            name: String!
            type: String!
        }

        type Query {
            getDinosaur: [Dinosaur!]!
            getDinosaurById(id: ID!): Dinosaur
            broken: Dinosaur!
            count(limit: Int = 2): Int
        }

        type Mutation {
            addDinosaur(name: String!, type: String!): Dinosaur!
        }
    ";

    fn executor() -> Executor {
        let schema = Schema::from_sdl(SDL).unwrap();
        let mut resolvers = ResolverMap::new();
        resolvers.register_async("Query", "getDinosaur", |_args, _ctx, _info| async move {
            Ok(json!([
                {"id": "1", "name": "Triceratops", "type": "Herbivore"},
                {"id": "2", "name": "Velociraptor", "type": "Carnivore"},
            ]))
        });
        resolvers.register_async("Query", "getDinosaurById", |args, _ctx, _info| async move {
            let id: String = args.require("id")?;
            match id.as_str() {
                "1" => Ok(json!({"id": "1", "name": "Triceratops", "type": "Herbivore"})),
                "bad" => Err(ResolverError::custom("invalid id")),
                _ => Ok(Value::Null),
            }
        });
        resolvers.register_async("Query", "broken", |_args, _ctx, _info| async move {
            Ok(json!({"id": "3", "name": null, "type": "Herbivore"}))
        });
        resolvers.register_async("Query", "count", |args, _ctx, _info| async move {
            Ok(args.get("limit").cloned().unwrap_or(Value::Null))
        });
        resolvers.register_async("Mutation", "addDinosaur", |args, ctx, _info| async move {
            assert_eq!(ctx.operation, Some(OperationType::Mutation));
            let name: String = args.require("name")?;
            let kind: String = args.require("type")?;
            let id = ctx.operation_name.unwrap_or_else(|| "9".to_string());
            Ok(json!({"id": id, "name": name, "type": kind}))
        });
        Executor::new(Arc::new(schema), Arc::new(resolvers))
    }

    async fn run(source: &str, variables: Value) -> Response {
        let executor = executor();
        let document = dinozoo_syntax::parse(source).document;
        let operation = validate(executor.schema(), &document, None).unwrap();
        let Value::Object(variables) = variables else {
            panic!("variables must be an object");
        };
        executor
            .execute(&document, operation, &variables, &LineIndex::new(source))
            .await
    }

    #[tokio::test]
    async fn test_execute_list() {
        let response = run("{ getDinosaur { name type } }", json!({})).await;
        assert!(response.is_ok());
        assert_eq!(
            response.data.unwrap(),
            json!({"getDinosaur": [
                {"name": "Triceratops", "type": "Herbivore"},
                {"name": "Velociraptor", "type": "Carnivore"},
            ]})
        );
    }

    #[tokio::test]
    async fn test_execute_aliases_fragments_and_typename() {
        let response = run(
            r#"{
                first: getDinosaurById(id: "1") { ...Names __typename }
                missing: getDinosaurById(id: "2") { id }
            }
            fragment Names on Dinosaur { name }"#,
            json!({}),
        )
        .await;
        assert_eq!(
            response.data.unwrap(),
            json!({
                "first": {"name": "Triceratops", "__typename": "Dinosaur"},
                "missing": null,
            })
        );
    }

    #[tokio::test]
    async fn test_execute_variables_and_directives() {
        let response = run(
            "query ($id: ID!, $all: Boolean!) { getDinosaurById(id: $id) { id name @include(if: $all) } }",
            json!({"id": 1, "all": false}),
        )
        .await;
        assert_eq!(response.data.unwrap(), json!({"getDinosaurById": {"id": "1"}}));
    }

    #[tokio::test]
    async fn test_execute_default_argument() {
        let response = run("{ count }", json!({})).await;
        assert_eq!(response.data.unwrap(), json!({"count": 2}));
    }

    #[tokio::test]
    async fn test_variable_errors_skip_execution() {
        let response = run(
            "query ($id: ID!) { getDinosaurById(id: $id) { id } }",
            json!({}),
        )
        .await;
        assert!(response.data.is_none());
        let errors = response.errors.unwrap();
        assert_eq!(
            errors[0].message,
            "Variable \"$id\" of required type \"ID!\" was not provided."
        );
        assert_eq!(errors[0].code(), Some("BAD_USER_INPUT"));
        assert_eq!(errors[0].locations, Some(vec![Location { line: 1, column: 8 }]));
    }

    #[tokio::test]
    async fn test_resolver_error_on_nullable_field() {
        let response = run("{ getDinosaurById(id: \"bad\") { id } }", json!({})).await;
        assert_eq!(response.data.unwrap(), json!({"getDinosaurById": null}));

        let errors = response.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "invalid id");
        assert_eq!(errors[0].path, Some(vec![PathSegment::Field("getDinosaurById".into())]));
        assert_eq!(errors[0].locations, Some(vec![Location { line: 1, column: 3 }]));
        assert_eq!(errors[0].code(), Some("RESOLVER_ERROR"));
    }

    #[tokio::test]
    async fn test_null_propagates_to_data() {
        let response = run("{ broken { id name } }", json!({})).await;
        assert_eq!(response.data, Some(Value::Null));

        let errors = response.errors.unwrap();
        assert_eq!(errors[0].message, "Cannot return null for non-nullable field Dinosaur.name.");
        assert_eq!(
            errors[0].path,
            Some(vec![
                PathSegment::Field("broken".into()),
                PathSegment::Field("name".into()),
            ])
        );
    }

    #[tokio::test]
    async fn test_mutation() {
        let response = run(
            r#"mutation { addDinosaur(name: "Tyrannosaurus", type: "Carnivore") { id name type } }"#,
            json!({}),
        )
        .await;
        assert_eq!(
            response.data.unwrap(),
            json!({"addDinosaur": {"id": "9", "name": "Tyrannosaurus", "type": "Carnivore"}})
        );
    }

    #[tokio::test]
    async fn test_context_carries_operation_name() {
        let response = run(
            r#"mutation AddRex { addDinosaur(name: "Rex", type: "Carnivore") { id } }"#,
            json!({}),
        )
        .await;
        assert_eq!(response.data.unwrap(), json!({"addDinosaur": {"id": "AddRex"}}));
    }

    #[test]
    fn test_response_serialization() {
        let error = FieldError::new("boom")
            .with_locations(vec![Location { line: 1, column: 3 }])
            .with_path(vec![PathSegment::Field("items".into()), PathSegment::Index(0)])
            .with_code(ErrorCode::ResolverError);
        let response = Response {
            data: Some(json!({"items": [null]})),
            errors: Some(vec![error]),
        };

        insta::assert_json_snapshot!(response, @r###"
        {
          "data": {
            "items": [
              null
            ]
          },
          "errors": [
            {
              "message": "boom",
              "locations": [
                {
                  "line": 1,
                  "column": 3
                }
              ],
              "path": [
                "items",
                0
              ],
              "extensions": {
                "code": "RESOLVER_ERROR"
              }
            }
          ]
        }
        "###);
    }
}
