//! The GraphQL server: schema, resolvers and the request pipeline.

use crate::error::{ServerError, ServerResult};
use dinozoo_core::LineIndex;
use dinozoo_runtime::{validate, ErrorCode, Executor, FieldError, ResolverMap, Response, Schema};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Serve the HTML landing page on `GET`.
    pub landing_page: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            landing_page: true,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Disables the landing page.
    pub fn no_landing_page(mut self) -> Self {
        self.landing_page = false;
        self
    }

    /// The `host:port` pair to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Server builder.
#[derive(Debug, Default)]
pub struct ServerBuilder {
    config: ServerConfig,
    sdl: Option<String>,
    resolvers: ResolverMap,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the schema from SDL.
    pub fn schema_sdl(mut self, sdl: impl Into<String>) -> Self {
        self.sdl = Some(sdl.into());
        self
    }

    /// Sets the resolvers for root fields.
    pub fn resolvers(mut self, resolvers: ResolverMap) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// Builds the server, loading and checking the schema.
    pub fn build(self) -> ServerResult<DinozooServer> {
        let sdl = self.sdl.ok_or(ServerError::MissingSchema)?;
        let schema = Schema::from_sdl(&sdl)?;
        Ok(DinozooServer {
            config: self.config,
            executor: Executor::new(Arc::new(schema), Arc::new(self.resolvers)),
        })
    }
}

/// A configured GraphQL server.
#[derive(Debug, Clone)]
pub struct DinozooServer {
    config: ServerConfig,
    executor: Executor,
}

impl DinozooServer {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        self.executor.schema()
    }

    /// The schema printed as SDL.
    pub fn schema_sdl(&self) -> String {
        self.schema().to_sdl()
    }

    /// Parses, validates and executes one GraphQL request.
    ///
    /// `variables` must be a JSON object or null.
    pub async fn execute(
        &self,
        query: &str,
        operation_name: Option<&str>,
        variables: Option<Value>,
    ) -> Response {
        let variables = match variables {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Response::error(
                    FieldError::new("Variables must be provided as a JSON object.")
                        .with_code(ErrorCode::BadRequest),
                )
            }
        };

        let index = LineIndex::new(query);
        let parsed = dinozoo_syntax::parse(query);
        if let Some(diagnostic) = parsed.diagnostics.iter().next() {
            return Response::error(
                FieldError::new(format!("Syntax Error: {}", diagnostic.message))
                    .with_locations(vec![diagnostic.location(&index)])
                    .with_code(ErrorCode::ParseError),
            );
        }

        let document = parsed.document;
        let operation = match validate(self.schema(), &document, operation_name) {
            Ok(operation) => operation,
            Err(errors) => {
                return Response::from_errors(
                    errors
                        .into_iter()
                        .map(|error| {
                            let locations =
                                error.spans.iter().map(|&span| index.span_start(span)).collect();
                            FieldError::new(error.message)
                                .with_locations(locations)
                                .with_code(ErrorCode::ValidationError)
                        })
                        .collect(),
                )
            }
        };

        debug!(
            operation = %operation.operation,
            name = operation.name.as_ref().map(|n| n.value.as_str()),
            "executing operation"
        );
        self.executor
            .execute(&document, operation, &variables, &index)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SDL: &str = "type Query { greeting(name: String!): String! }";

    fn server() -> DinozooServer {
        let mut resolvers = ResolverMap::new();
        resolvers.register_async("Query", "greeting", |args, _ctx, _info| async move {
            let name: String = args.require("name")?;
            Ok(json!(format!("Hola, {name}")))
        });
        DinozooServer::builder()
            .schema_sdl(SDL)
            .resolvers(resolvers)
            .build()
            .unwrap()
    }

    #[test]
    fn test_config_builder() {
        let config = ServerConfig::new().host("127.0.0.1").port(8080).no_landing_page();
        assert_eq!(config.address(), "127.0.0.1:8080");
        assert!(!config.landing_page);
    }

    #[test]
    fn test_build_requires_schema() {
        assert!(matches!(
            DinozooServer::builder().build(),
            Err(ServerError::MissingSchema)
        ));
    }

    #[test]
    fn test_build_rejects_invalid_schema() {
        let result = DinozooServer::builder().schema_sdl("type Query {").build();
        assert!(matches!(result, Err(ServerError::Schema(_))));
    }

    #[tokio::test]
    async fn test_execute() {
        let response = server()
            .execute(
                "query Greet($n: String!) { greeting(name: $n) }",
                None,
                Some(json!({"n": "Rex"})),
            )
            .await;
        assert!(response.is_ok());
        assert_eq!(response.data, Some(json!({"greeting": "Hola, Rex"})));
    }

    #[tokio::test]
    async fn test_syntax_error() {
        let response = server().execute("{ greeting(name: \"x\") ", None, None).await;
        assert!(response.data.is_none());
        let errors = response.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("Syntax Error: "));
        assert_eq!(errors[0].code(), Some("PARSE_ERROR"));
        assert_eq!(errors[0].locations.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_deeply_nested_request_is_syntax_error() {
        let n = 50_000;
        let lists = format!("{{ greeting(name: {}\"x\"{}) }}", "[".repeat(n), "]".repeat(n));
        let selections = format!("{}{}", "{ greeting ".repeat(n), "}".repeat(n));

        for query in [lists, selections] {
            let response = server().execute(&query, None, None).await;
            assert!(response.data.is_none());
            let errors = response.errors.unwrap();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].code(), Some("PARSE_ERROR"));
            assert!(errors[0].message.contains("maximum depth"), "{}", errors[0].message);
        }
    }

    #[tokio::test]
    async fn test_validation_error() {
        let response = server().execute("{ farewell }", None, None).await;
        assert!(response.data.is_none());
        let errors = response.errors.unwrap();
        assert_eq!(errors[0].message, "Cannot query field \"farewell\" on type \"Query\".");
        assert_eq!(errors[0].code(), Some("VALIDATION_ERROR"));
        let location = errors[0].locations.as_ref().unwrap()[0];
        assert_eq!((location.line, location.column), (1, 3));
    }

    #[tokio::test]
    async fn test_variables_must_be_object() {
        let response = server()
            .execute("{ greeting(name: \"x\") }", None, Some(json!([1])))
            .await;
        assert_eq!(response.errors.unwrap()[0].code(), Some("BAD_REQUEST"));
    }

    #[tokio::test]
    async fn test_operation_name_selects() {
        let query = "query A { greeting(name: \"a\") } query B { greeting(name: \"b\") }";
        let response = server().execute(query, Some("B"), None).await;
        assert_eq!(response.data, Some(json!({"greeting": "Hola, b"})));

        let response = server().execute(query, None, None).await;
        assert_eq!(
            response.errors.unwrap()[0].message,
            "Must provide operation name if query contains multiple operations."
        );
    }
}
