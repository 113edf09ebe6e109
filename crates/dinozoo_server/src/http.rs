//! HTTP transport.
//!
//! - `POST /` and `POST /graphql`: GraphQL queries and mutations
//! - `GET /` and `GET /graphql`: landing page
//! - `GET /health`: health check
//! - `GET /schema`: the schema as SDL

use crate::server::DinozooServer;
use bytes::Bytes;
use dinozoo_runtime::{ErrorCode, FieldError, Response as GraphQLResponse};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Incoming};
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// A GraphQL request body.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Option<Value>,
    #[serde(default, rename = "operationName")]
    pub operation_name: Option<String>,
}

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

fn full<T: Into<Bytes>>(chunk: T) -> BoxBody {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

fn response(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<BoxBody> {
    let mut response = Response::new(full(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, data: &T) -> Response<BoxBody> {
    match serde_json::to_vec(data) {
        Ok(body) => response(status, "application/json", body),
        Err(e) => {
            error!(error = %e, "failed to serialize response");
            response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "application/json",
                r#"{"errors":[{"message":"Internal server error","extensions":{"code":"INTERNAL_ERROR"}}]}"#,
            )
        }
    }
}

fn bad_request(message: String) -> Response<BoxBody> {
    warn!(%message, "rejected request");
    json_response(
        StatusCode::BAD_REQUEST,
        &GraphQLResponse::error(FieldError::new(message).with_code(ErrorCode::BadRequest)),
    )
}

fn cors_preflight() -> Response<BoxBody> {
    let mut response = response(StatusCode::NO_CONTENT, "text/plain", Bytes::new());
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}

/// Executes a JSON-encoded GraphQL request.
///
/// GraphQL errors are reported with status 200; only bodies that are not a
/// GraphQL request get 400.
pub async fn handle_graphql_request(body: &[u8], server: &DinozooServer) -> Response<BoxBody> {
    let request: GraphQLRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => return bad_request(format!("Invalid JSON: {e}")),
    };

    debug!(
        query = %request.query.chars().take(100).collect::<String>(),
        "received request"
    );

    let result = server
        .execute(
            &request.query,
            request.operation_name.as_deref(),
            request.variables,
        )
        .await;
    json_response(StatusCode::OK, &result)
}

/// Routes one HTTP request.
pub async fn handle<B>(server: &DinozooServer, req: Request<B>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Display,
{
    let (parts, body) = req.into_parts();
    let landing_page = server.config().landing_page;

    match (parts.method, parts.uri.path()) {
        (Method::GET, "/health") => response(StatusCode::OK, "application/json", health_response()),

        (Method::GET, "/schema") => response(
            StatusCode::OK,
            "text/plain; charset=utf-8",
            server.schema_sdl(),
        ),

        (Method::POST, "/" | "/graphql") => match body.collect().await {
            Ok(collected) => handle_graphql_request(&collected.to_bytes(), server).await,
            Err(e) => bad_request(format!("Failed to read request body: {e}")),
        },

        (Method::GET, "/" | "/graphql") if landing_page => response(
            StatusCode::OK,
            "text/html; charset=utf-8",
            landing_page_html("/graphql"),
        ),

        (Method::OPTIONS, _) => cors_preflight(),

        _ => response(
            StatusCode::NOT_FOUND,
            "application/json",
            r#"{"error":"Not Found"}"#,
        ),
    }
}

pub fn health_response() -> &'static str {
    r#"{"status":"healthy"}"#
}

pub fn landing_page_html(endpoint: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Dinozoo</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 860px; margin: 0 auto; padding: 2rem; background: #fafafa; }}
        h1 {{ color: #1a1a1a; border-bottom: 2px solid #16a34a; padding-bottom: 0.5rem; }}
        .info {{ background: #f0fdf4; padding: 1rem 1.5rem; border-radius: 8px; border-left: 4px solid #16a34a; margin: 1.5rem 0; }}
        .info code {{ background: #dcfce7; padding: 2px 6px; border-radius: 4px; }}
        pre {{ background: #1e293b; color: #e2e8f0; padding: 1rem; border-radius: 6px; overflow-x: auto; font-size: 0.85rem; }}
    </style>
</head>
<body>
    <h1>Dinozoo</h1>
    <p>GraphQL API for the zoo's dinosaur collection.</p>

    <div class="info">
        <ul>
            <li><code>POST {endpoint}</code> - queries and mutations</li>
            <li><code>GET /schema</code> - schema in SDL</li>
            <li><code>GET /health</code> - health check</li>
        </ul>
    </div>

    <h2>Example</h2>
    <pre>curl -s http://localhost:4000{endpoint} \
  -H "Content-Type: application/json" \
  -d '{{"query": "{{ getDinosaur {{ id name type }} }}"}}'</pre>

    <pre>curl -s http://localhost:4000{endpoint} \
  -H "Content-Type: application/json" \
  -d '{{"query": "mutation {{ addDinosaur(name: \"Tyrannosaurus\", type: \"Carnivore\") {{ id }} }}"}}'</pre>
</body>
</html>"#
    )
}

/// Accepts connections until `shutdown` resolves, serving each on its own task.
pub async fn serve(
    listener: TcpListener,
    server: Arc<DinozooServer>,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            () = &mut shutdown => {
                info!("shutting down");
                return;
            }
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    continue;
                }
            },
        };

        let server = Arc::clone(&server);
        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let server = Arc::clone(&server);
                async move { Ok::<_, Infallible>(handle(&server, req).await) }
            });

            if let Err(err) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                if !err.is_incomplete_message() {
                    warn!(%peer, error = %err, "connection error");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialization() {
        let request: GraphQLRequest = serde_json::from_str(
            r#"{"query": "{ getDinosaur { id } }", "operationName": "List", "variables": {"a": 1}}"#,
        )
        .unwrap();
        assert_eq!(request.operation_name.as_deref(), Some("List"));
        assert_eq!(request.variables, Some(serde_json::json!({"a": 1})));

        let request: GraphQLRequest = serde_json::from_str(r#"{"query": "{ a }"}"#).unwrap();
        assert!(request.operation_name.is_none());
        assert!(request.variables.is_none());
    }

    #[test]
    fn test_landing_page_mentions_endpoint() {
        let html = landing_page_html("/graphql");
        assert!(html.contains("POST /graphql"));
        assert!(html.contains("addDinosaur"));
    }

    #[test]
    fn test_cors_preflight() {
        let response = cors_preflight();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
