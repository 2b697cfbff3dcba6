//! # Gateway HTTP Server
//!
//! Assembles the axum application and runs it. Every path goes through the
//! [`RouteRegistry`]: the products resource, the health endpoint and the metrics
//! endpoint are all registered as handler descriptors, so a clash between them is a
//! startup error rather than silent shadowing.
//!
//! Layers, outermost first:
//! - `PropagateRequestIdLayer` echoes an inbound `x-request-id` on the response
//! - `TraceLayer` opens a span per request
//! - request metrics (`gateway_http_requests_total`)

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router as AxumRouter};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::PropagateRequestIdLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::backend::ProductBackend;
use crate::core::config::GatewayConfig;
use crate::core::error::{GatewayError, GatewayResult};
use crate::observability::metrics;
use crate::protocols::telemetry::{StaticIdentity, TelemetryInjector};
use crate::protocols::translator::{ProductsRouteHandler, TranslatorOptions, PRODUCTS_BASE_PATH};
use crate::routing::registry::{RouteDescriptor, RouteHandler, RouteRegistry};

pub const HEALTH_PATH: &str = "/health";

/// Liveness endpoint
pub struct HealthHandler {
    backend: String,
}

impl HealthHandler {
    pub fn new<S: Into<String>>(backend: S) -> Self {
        Self {
            backend: backend.into(),
        }
    }

    pub fn descriptor(self) -> RouteDescriptor {
        RouteDescriptor::new("health", vec![HEALTH_PATH.to_string()], Arc::new(self))
    }
}

#[async_trait]
impl RouteHandler for HealthHandler {
    async fn handle(&self, request: Request<Body>) -> Response {
        if request.method() != Method::GET {
            return GatewayError::method_not_allowed(request.method().as_str(), "GET").into_response();
        }

        let health_info = json!({
            "status": "healthy",
            "service": "product-gateway",
            "version": env!("CARGO_PKG_VERSION"),
            "backend": self.backend,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (StatusCode::OK, Json(health_info)).into_response()
    }
}

/// Prometheus scrape endpoint
pub struct MetricsHandler {
    handle: PrometheusHandle,
}

impl MetricsHandler {
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    pub fn descriptor(self, endpoint: &str) -> RouteDescriptor {
        RouteDescriptor::new("metrics", vec![endpoint.to_string()], Arc::new(self))
    }
}

#[async_trait]
impl RouteHandler for MetricsHandler {
    async fn handle(&self, request: Request<Body>) -> Response {
        if request.method() != Method::GET {
            return GatewayError::method_not_allowed(request.method().as_str(), "GET").into_response();
        }

        (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )],
            self.handle.render(),
        )
            .into_response()
    }
}

/// Register every route the gateway serves
pub fn build_registry(
    config: &GatewayConfig,
    backend: Arc<dyn ProductBackend>,
    metrics_handle: Option<PrometheusHandle>,
) -> GatewayResult<RouteRegistry> {
    let telemetry = TelemetryInjector::new(Arc::new(StaticIdentity::from_config(&config.telemetry)));
    let products = ProductsRouteHandler::new(
        backend,
        telemetry,
        TranslatorOptions {
            base_path: PRODUCTS_BASE_PATH.to_string(),
            call_timeout: config.backend.request_timeout,
            max_body_size: config.server.max_body_size,
        },
    );

    let mut builder = RouteRegistry::builder()
        .register(products.descriptor())
        .register(HealthHandler::new(config.backend.mode.to_string()).descriptor());

    if let Some(handle) = metrics_handle {
        builder = builder.register(MetricsHandler::new(handle).descriptor(&config.metrics.endpoint));
    }

    builder.build()
}

/// The axum application: registry dispatch wrapped in the gateway layers
pub fn build_app(registry: Arc<RouteRegistry>) -> AxumRouter {
    AxumRouter::new()
        .fallback(dispatch)
        .with_state(registry)
        .layer(
            ServiceBuilder::new()
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(record_request)),
        )
}

async fn dispatch(State(registry): State<Arc<RouteRegistry>>, request: Request<Body>) -> Response {
    registry.dispatch(request).await
}

async fn record_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let response = next.run(request).await;
    metrics::record_http_request(&method, response.status());
    response
}

/// Main gateway server
pub struct GatewayServer {
    app: AxumRouter,
    registry: Arc<RouteRegistry>,
    bind_addr: SocketAddr,
}

impl GatewayServer {
    pub fn new(registry: RouteRegistry, bind_addr: SocketAddr) -> Self {
        let registry = Arc::new(registry);
        Self {
            app: build_app(registry.clone()),
            registry,
            bind_addr,
        }
    }

    pub fn app(&self) -> AxumRouter {
        self.app.clone()
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    pub async fn bind(&self) -> GatewayResult<TcpListener> {
        TcpListener::bind(self.bind_addr).await.map_err(|e| {
            GatewayError::internal(format!("Failed to bind gateway server to {}: {}", self.bind_addr, e))
        })
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight requests
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> GatewayResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, routes = self.registry.len(), "Gateway HTTP server listening");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::internal(format!("Gateway server error: {}", e)))?;

        info!("Gateway HTTP server stopped accepting connections");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryProductBackend;
    use tower::ServiceExt;

    fn test_server() -> GatewayServer {
        let config = GatewayConfig::default();
        let registry = build_registry(&config, Arc::new(InMemoryProductBackend::new()), None).unwrap();
        GatewayServer::new(registry, "127.0.0.1:0".parse().unwrap())
    }

    #[test]
    fn test_registry_contents() {
        let server = test_server();
        let patterns: Vec<String> = server
            .registry()
            .patterns()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(patterns, vec!["/api/v1/products", "/health", "/api/v1/products/"]);
        assert_eq!(server.bind_addr().ip().to_string(), "127.0.0.1");
    }

    #[test]
    fn test_metrics_endpoint_clash_is_rejected() {
        let mut config = GatewayConfig::default();
        config.metrics.endpoint = HEALTH_PATH.to_string();
        let handle = metrics::prometheus_builder().unwrap().build_recorder().handle();

        let result = build_registry(&config, Arc::new(InMemoryProductBackend::new()), Some(handle));
        assert!(matches!(result, Err(GatewayError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = test_server()
            .app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = test_server()
            .app()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let response = test_server()
            .app()
            .oneshot(
                Request::builder()
                    .uri("/nowhere")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let server = test_server();
        let listener = server.bind().await.unwrap();
        let result = server.serve(listener, async {}).await;
        assert!(result.is_ok());
    }
}
