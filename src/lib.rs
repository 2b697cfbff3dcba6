//! # Product Gateway - Core Library Crate
//!
//! An HTTP/JSON gateway in front of the `products.v1.ProductService` gRPC backend.
//! Clients speak REST; the gateway routes each request, translates it into a typed
//! backend call carrying telemetry metadata and a deadline, and maps the result (or the
//! backend's failure code) back into an HTTP response.
//!
//! ## Request Flow
//!
//! ```text
//! HTTP request
//!   -> RouteRegistry        (exact match, else longest prefix, else 404)
//!   -> parse_route          (collection / item(id) / unrecognized)
//!   -> PageCursor           (list calls only)
//!   -> ProductsRouteHandler (telemetry, deadline, metrics, backend call)
//!   -> JSON response, or GatewayError mapped to status + body
//! ```
//!
//! ## Module Layout
//!
//! - `core`: error type, configuration, JSON response models
//! - `routing`: route registry, path parser, pagination decoder
//! - `protocols`: wire contract, gRPC client, translator, status table, telemetry
//! - `backend`: the `ProductBackend` trait and the in-memory implementation
//! - `observability`: logging subscriber and Prometheus metrics
//! - `gateway`: axum application assembly and the HTTP server

/// Error type, configuration and the JSON response models
pub mod core;

/// HTTP server and application assembly
pub mod gateway;

/// Backend wire contract, gRPC client and REST translation
pub mod protocols;

/// Backend abstraction and the in-process implementation
pub mod backend;

/// Path registry, path classification and pagination parameters
pub mod routing;

/// Logging and metrics
pub mod observability;

// Re-export commonly used types for easier access
// Users can write `use product_gateway::GatewayError` instead of the full module path

/// Main error type used throughout the gateway
pub use crate::core::error::{GatewayError, GatewayResult};

/// Main configuration structure for the gateway
pub use crate::core::config::GatewayConfig;

pub use crate::backend::{InMemoryProductBackend, ProductBackend};
pub use crate::gateway::server::{build_app, build_registry, GatewayServer};
pub use crate::routing::registry::{RouteDescriptor, RouteHandler, RouteRegistry};
