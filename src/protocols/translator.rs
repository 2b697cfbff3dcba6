//! # Protocol Translator
//!
//! Turns REST calls on the products resource into backend calls and the typed
//! responses back into JSON:
//!
//! | route        | method | backend call    | success |
//! |--------------|--------|-----------------|---------|
//! | `base`       | GET    | `ListProducts`  | 200     |
//! | `base`       | POST   | `CreateProduct` | 201     |
//! | `base/{id}`  | GET    | `GetProduct`    | 200     |
//! | `base/{id}`  | DELETE | `DeleteProduct` | 200     |
//!
//! Any other method on a known route shape answers 405 with an `Allow` header, and any
//! other path below the base answers 404.
//!
//! Every backend call gets fresh telemetry metadata, a deadline (sent to the backend
//! and enforced locally), and is counted and timed. Failures become [`GatewayError`]s,
//! which the error mapper turns into the HTTP status and body.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tonic::Status;
use tracing::{debug, error, warn};

use crate::backend::ProductBackend;
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::{DeleteResult, ProductEnvelope, ProductListEnvelope};
use crate::observability::metrics;
use crate::protocols::products::{
    CreateProductRequest, DeleteProductRequest, GetProductRequest, ListProductsRequest,
};
use crate::protocols::telemetry::TelemetryInjector;
use crate::routing::pagination::PageCursor;
use crate::routing::path::{parse_request_path, ParsedRoute};
use crate::routing::registry::{RouteDescriptor, RouteHandler};

/// Base path of the products resource
pub const PRODUCTS_BASE_PATH: &str = "/api/v1/products";

const COLLECTION_METHODS: &str = "GET, POST";
const ITEM_METHODS: &str = "GET, DELETE";

/// Tunables for the products handler
#[derive(Debug, Clone)]
pub struct TranslatorOptions {
    pub base_path: String,
    /// Deadline for each backend call
    pub call_timeout: Duration,
    /// Largest accepted request body, in bytes
    pub max_body_size: usize,
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        Self {
            base_path: PRODUCTS_BASE_PATH.to_string(),
            call_timeout: Duration::from_secs(10),
            max_body_size: 1024 * 1024,
        }
    }
}

/// REST handler for the products resource
#[derive(Clone)]
pub struct ProductsRouteHandler {
    backend: Arc<dyn ProductBackend>,
    telemetry: TelemetryInjector,
    options: TranslatorOptions,
}

impl ProductsRouteHandler {
    pub fn new(
        backend: Arc<dyn ProductBackend>,
        telemetry: TelemetryInjector,
        options: TranslatorOptions,
    ) -> Self {
        Self {
            backend,
            telemetry,
            options,
        }
    }

    /// Registry descriptor claiming the collection path and everything below it
    pub fn descriptor(self) -> RouteDescriptor {
        let base = self.options.base_path.trim_end_matches('/').to_string();
        RouteDescriptor::new(
            "products",
            vec![base.clone(), format!("{}/", base)],
            Arc::new(self),
        )
    }

    async fn route(&self, request: Request<Body>) -> GatewayResult<Response> {
        let (parts, body) = request.into_parts();
        let base = self.options.base_path.trim_end_matches('/');

        match (parse_request_path(parts.uri.path(), base), &parts.method) {
            (ParsedRoute::Collection, &Method::GET) => {
                let cursor = PageCursor::from_query(parts.uri.query())?;
                self.list_products(&parts.headers, cursor).await
            }
            (ParsedRoute::Collection, &Method::POST) => {
                let payload = self.read_create_body(body).await?;
                self.create_product(&parts.headers, payload).await
            }
            (ParsedRoute::Collection, method) => {
                Err(GatewayError::method_not_allowed(method.as_str(), COLLECTION_METHODS))
            }
            (ParsedRoute::Item(id), &Method::GET) => self.get_product(&parts.headers, id).await,
            (ParsedRoute::Item(id), &Method::DELETE) => self.delete_product(&parts.headers, id).await,
            (ParsedRoute::Item(_), method) => {
                Err(GatewayError::method_not_allowed(method.as_str(), ITEM_METHODS))
            }
            (ParsedRoute::Unrecognized, _) => Err(GatewayError::not_found(parts.uri.path())),
        }
    }

    async fn list_products(&self, headers: &HeaderMap, cursor: PageCursor) -> GatewayResult<Response> {
        let request = self.outbound(
            ListProductsRequest {
                page_size: cursor.page_size,
                page_token: cursor.page_token,
            },
            headers,
        );
        let response = self.call("ListProducts", self.backend.list_products(request)).await?;

        Ok(encode_json(StatusCode::OK, &ProductListEnvelope::from(response)))
    }

    async fn create_product(
        &self,
        headers: &HeaderMap,
        payload: CreateProductRequest,
    ) -> GatewayResult<Response> {
        let request = self.outbound(payload, headers);
        let response = self.call("CreateProduct", self.backend.create_product(request)).await?;

        Ok(encode_json(StatusCode::CREATED, &ProductEnvelope::from(response)))
    }

    async fn get_product(&self, headers: &HeaderMap, id: i64) -> GatewayResult<Response> {
        let request = self.outbound(GetProductRequest { id }, headers);
        let response = self.call("GetProduct", self.backend.get_product(request)).await?;

        Ok(encode_json(StatusCode::OK, &ProductEnvelope::from(response)))
    }

    async fn delete_product(&self, headers: &HeaderMap, id: i64) -> GatewayResult<Response> {
        let request = self.outbound(DeleteProductRequest { id }, headers);
        let response = self.call("DeleteProduct", self.backend.delete_product(request)).await?;

        Ok(encode_json(StatusCode::OK, &DeleteResult::from(response)))
    }

    async fn read_create_body(&self, body: Body) -> GatewayResult<CreateProductRequest> {
        let bytes = axum::body::to_bytes(body, self.options.max_body_size)
            .await
            .map_err(|e| GatewayError::validation("body", format!("failed to read request body: {}", e)))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| GatewayError::validation("body", format!("invalid JSON body: {}", e)))
    }

    /// Wrap a payload with telemetry metadata and the call deadline
    fn outbound<T>(&self, payload: T, headers: &HeaderMap) -> tonic::Request<T> {
        let mut request = self.telemetry.inject(payload, headers);
        request.set_timeout(self.options.call_timeout);
        request
    }

    /// Run a backend call under the deadline, recording its outcome
    async fn call<T, F>(&self, operation: &'static str, call: F) -> GatewayResult<T>
    where
        F: Future<Output = Result<T, Status>>,
    {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.options.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Status::deadline_exceeded(format!(
                "{} did not complete within {:?}",
                operation, self.options.call_timeout
            ))),
        };
        let elapsed = started.elapsed();

        metrics::record_backend_call(
            operation,
            result.as_ref().map(|_| ()).map_err(Status::code),
            elapsed,
        );
        debug!(operation, elapsed_ms = elapsed.as_millis() as u64, ok = result.is_ok(), "backend call finished");

        result.map_err(GatewayError::from)
    }
}

#[async_trait]
impl RouteHandler for ProductsRouteHandler {
    async fn handle(&self, request: Request<Body>) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        match self.route(request).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_client_error() {
                    warn!(%method, %path, status = err.status_code().as_u16(), error = %err, "request rejected");
                } else {
                    error!(%method, %path, status = err.status_code().as_u16(), error = %err, "request failed");
                }
                err.into_response()
            }
        }
    }
}

/// Serialize `value` as the body of a response with an already decided status
///
/// An encoding failure is logged and the status goes out with an empty body.
pub fn encode_json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!(status = status.as_u16(), error = %e, "failed to encode response body");
            status.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryProductBackend;
    use crate::protocols::telemetry::StaticIdentity;
    use serde::ser::Error as _;
    use serde_json::Value;

    fn handler(backend: Arc<dyn ProductBackend>) -> ProductsRouteHandler {
        ProductsRouteHandler::new(
            backend,
            TelemetryInjector::new(Arc::new(StaticIdentity::new("test-client", "test-user"))),
            TranslatorOptions::default(),
        )
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_descriptor_declares_collection_and_items() {
        let descriptor = handler(Arc::new(InMemoryProductBackend::new())).descriptor();
        assert_eq!(descriptor.patterns, vec!["/api/v1/products", "/api/v1/products/"]);
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let handler = handler(Arc::new(InMemoryProductBackend::with_first_id(42)));

        let response = handler
            .handle(request(
                Method::POST,
                "/api/v1/products",
                r#"{"name":"Widget","price":9.99,"currency":"USD","stock_quantity":5}"#,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body = json_body(response).await;
        assert_eq!(body["product"]["id"], 42);

        let response = handler.handle(request(Method::GET, "/api/v1/products/42", "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["product"]["name"], "Widget");
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_client_error() {
        let handler = handler(Arc::new(InMemoryProductBackend::new()));

        let response = handler.handle(request(Method::POST, "/api/v1/products", "{not json")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = handler
            .handle(request(Method::POST, "/api/v1/products", r#"{"price":"free"}"#))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let handler = ProductsRouteHandler::new(
            Arc::new(InMemoryProductBackend::new()),
            TelemetryInjector::new(Arc::new(StaticIdentity::new("c", "u"))),
            TranslatorOptions {
                max_body_size: 16,
                ..TranslatorOptions::default()
            },
        );

        let body = format!(r#"{{"name":"{}","price":1,"currency":"USD"}}"#, "x".repeat(64));
        let response = handler.handle(request(Method::POST, "/api/v1/products", &body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let handler = handler(Arc::new(InMemoryProductBackend::new()));

        let response = handler.handle(request(Method::PATCH, "/api/v1/products/42", "")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, DELETE");

        let response = handler.handle(request(Method::PUT, "/api/v1/products", "")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, POST");
    }

    #[tokio::test]
    async fn test_unrecognized_shape_is_not_found() {
        let handler = handler(Arc::new(InMemoryProductBackend::new()));

        for uri in ["/api/v1/products/12/extra", "/api/v1/products/abc"] {
            let response = handler.handle(request(Method::GET, uri, "")).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri {}", uri);
        }
    }

    struct SlowBackend;

    #[async_trait]
    impl ProductBackend for SlowBackend {
        async fn get_product(
            &self,
            _request: tonic::Request<GetProductRequest>,
        ) -> Result<crate::protocols::products::GetProductResponse, Status> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(Status::internal("unreachable"))
        }

        async fn list_products(
            &self,
            _request: tonic::Request<ListProductsRequest>,
        ) -> Result<crate::protocols::products::ListProductsResponse, Status> {
            Err(Status::unavailable("connection refused"))
        }

        async fn create_product(
            &self,
            _request: tonic::Request<CreateProductRequest>,
        ) -> Result<crate::protocols::products::CreateProductResponse, Status> {
            Err(Status::already_exists("product with this name already exists"))
        }

        async fn delete_product(
            &self,
            _request: tonic::Request<DeleteProductRequest>,
        ) -> Result<crate::protocols::products::DeleteProductResponse, Status> {
            Err(Status::internal("database is down"))
        }
    }

    #[tokio::test]
    async fn test_deadline_becomes_internal_error() {
        let handler = ProductsRouteHandler::new(
            Arc::new(SlowBackend),
            TelemetryInjector::new(Arc::new(StaticIdentity::new("c", "u"))),
            TranslatorOptions {
                call_timeout: Duration::from_millis(20),
                ..TranslatorOptions::default()
            },
        );

        let response = handler.handle(request(Method::GET, "/api/v1/products/1", "")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"]["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_backend_failures_are_mapped() {
        let handler = handler(Arc::new(SlowBackend));

        let response = handler
            .handle(request(Method::POST, "/api/v1/products", r#"{"name":"Widget"}"#))
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            json_body(response).await["error"]["message"],
            "product with this name already exists"
        );

        let response = handler.handle(request(Method::GET, "/api/v1/products", "")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = handler.handle(request(Method::DELETE, "/api/v1/products/3", "")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(!body.to_string().contains("database"));
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cannot encode"))
        }
    }

    #[tokio::test]
    async fn test_encoding_failure_keeps_status_with_empty_body() {
        let response = encode_json(StatusCode::CREATED, &Unencodable);
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }
}
