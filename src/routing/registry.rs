//! # Route Registry
//!
//! Maps inbound request paths to the handler that owns them. Every handler is
//! registered through a [`RouteDescriptor`] that lists all of its patterns explicitly;
//! a resource usually declares two, an exact collection path and a prefixed item path:
//!
//! ```text
//! /api/v1/products     exact   -> collection operations
//! /api/v1/products/    prefix  -> anything below the collection
//! ```
//!
//! Matching follows the usual HTTP multiplexer rules: an exact pattern only matches the
//! identical path, a pattern ending in `/` matches every path that starts with it, an
//! exact match wins over any prefix, and among prefixes the longest one wins.
//!
//! The registry is built once at startup and is read-only afterwards, so it can be
//! shared between request tasks behind an `Arc` without locking.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::error::{GatewayError, GatewayResult};

/// A handler that serves every request routed to one of its patterns
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, request: Request<Body>) -> Response;
}

/// A registered path pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoutePattern {
    /// Matches only the identical path
    Exact(String),
    /// Matches any path beginning with the pattern (which ends in `/`)
    Prefix(String),
}

impl RoutePattern {
    /// Classify a pattern string; a trailing `/` makes it a prefix pattern
    pub fn parse(pattern: &str) -> GatewayResult<Self> {
        if !pattern.starts_with('/') {
            return Err(GatewayError::config(format!(
                "Route pattern must start with '/': {:?}",
                pattern
            )));
        }

        if pattern.ends_with('/') {
            Ok(Self::Prefix(pattern.to_string()))
        } else {
            Ok(Self::Exact(pattern.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(p) | Self::Prefix(p) => p,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => path == p,
            Self::Prefix(p) => path.starts_with(p.as_str()),
        }
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handler together with the full set of patterns it serves
#[derive(Clone)]
pub struct RouteDescriptor {
    /// Name used in logs
    pub name: String,
    pub patterns: Vec<String>,
    pub handler: Arc<dyn RouteHandler>,
}

impl RouteDescriptor {
    pub fn new<S: Into<String>>(name: S, patterns: Vec<String>, handler: Arc<dyn RouteHandler>) -> Self {
        Self {
            name: name.into(),
            patterns,
            handler,
        }
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("name", &self.name)
            .field("patterns", &self.patterns)
            .finish()
    }
}

/// Result of a successful lookup
pub struct RouteMatch<'a> {
    pub pattern: &'a RoutePattern,
    pub name: &'a str,
    pub handler: &'a Arc<dyn RouteHandler>,
}

struct RegisteredRoute {
    pattern: RoutePattern,
    owner: usize,
}

/// Immutable lookup structure from path patterns to handlers
pub struct RouteRegistry {
    descriptors: Vec<RouteDescriptor>,
    exact: HashMap<String, RegisteredRoute>,
    /// Prefix patterns, longest first
    prefixes: Vec<RegisteredRoute>,
}

impl RouteRegistry {
    pub fn builder() -> RouteRegistryBuilder {
        RouteRegistryBuilder::new()
    }

    /// Build the registry from a set of handler descriptors
    ///
    /// Fails with a configuration error when a pattern is malformed or claimed twice.
    pub fn build(descriptors: Vec<RouteDescriptor>) -> GatewayResult<Self> {
        let mut exact: HashMap<String, RegisteredRoute> = HashMap::new();
        let mut prefixes: Vec<RegisteredRoute> = Vec::new();

        for (owner, descriptor) in descriptors.iter().enumerate() {
            if descriptor.patterns.is_empty() {
                return Err(GatewayError::config(format!(
                    "Route handler {} declares no patterns",
                    descriptor.name
                )));
            }

            for raw in &descriptor.patterns {
                let pattern = RoutePattern::parse(raw)?;
                let duplicate = match &pattern {
                    RoutePattern::Exact(p) => exact.contains_key(p),
                    RoutePattern::Prefix(p) => prefixes.iter().any(|r| r.pattern.as_str() == p),
                };
                if duplicate {
                    return Err(crate::config_error!(
                        "Duplicate route pattern {} (handler {})",
                        pattern,
                        descriptor.name
                    ));
                }

                info!(pattern = %pattern, handler = %descriptor.name, "registered route");

                let route = RegisteredRoute {
                    pattern: pattern.clone(),
                    owner,
                };
                match pattern {
                    RoutePattern::Exact(p) => {
                        exact.insert(p, route);
                    }
                    RoutePattern::Prefix(_) => prefixes.push(route),
                }
            }
        }

        prefixes.sort_by(|a, b| b.pattern.as_str().len().cmp(&a.pattern.as_str().len()));

        Ok(Self {
            descriptors,
            exact,
            prefixes,
        })
    }

    /// Find the handler for a request path
    pub fn lookup(&self, path: &str) -> Option<RouteMatch<'_>> {
        let route = self
            .exact
            .get(path)
            .or_else(|| self.prefixes.iter().find(|r| r.pattern.matches(path)))?;

        let descriptor = &self.descriptors[route.owner];
        Some(RouteMatch {
            pattern: &route.pattern,
            name: &descriptor.name,
            handler: &descriptor.handler,
        })
    }

    /// Route a request to its handler, or answer 404
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let path = request.uri().path().to_string();

        match self.lookup(&path) {
            Some(matched) => {
                debug!(path = %path, pattern = %matched.pattern, handler = matched.name, "route matched");
                matched.handler.handle(request).await
            }
            None => {
                debug!(path = %path, "no route matched");
                GatewayError::not_found(path).into_response()
            }
        }
    }

    /// All registered patterns, exact ones first
    pub fn patterns(&self) -> Vec<&RoutePattern> {
        let mut patterns: Vec<&RoutePattern> = self.exact.values().map(|r| &r.pattern).collect();
        patterns.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        patterns.extend(self.prefixes.iter().map(|r| &r.pattern));
        patterns
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builder for creating registries with a fluent API
#[derive(Default)]
pub struct RouteRegistryBuilder {
    descriptors: Vec<RouteDescriptor>,
}

impl RouteRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, descriptor: RouteDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn build(self) -> GatewayResult<RouteRegistry> {
        RouteRegistry::build(self.descriptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    struct NamedHandler(&'static str);

    #[async_trait]
    impl RouteHandler for NamedHandler {
        async fn handle(&self, _request: Request<Body>) -> Response {
            (StatusCode::OK, self.0).into_response()
        }
    }

    fn descriptor(name: &'static str, patterns: &[&str]) -> RouteDescriptor {
        RouteDescriptor::new(
            name,
            patterns.iter().map(|p| p.to_string()).collect(),
            Arc::new(NamedHandler(name)),
        )
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_pattern_classification() {
        assert_eq!(
            RoutePattern::parse("/api/v1/products").unwrap(),
            RoutePattern::Exact("/api/v1/products".to_string())
        );
        assert_eq!(
            RoutePattern::parse("/api/v1/products/").unwrap(),
            RoutePattern::Prefix("/api/v1/products/".to_string())
        );
        assert!(RoutePattern::parse("api/v1").is_err());
    }

    #[test]
    fn test_exact_and_prefix_matching() {
        let registry = RouteRegistry::builder()
            .register(descriptor("products", &["/api/v1/products", "/api/v1/products/"]))
            .build()
            .unwrap();

        assert_eq!(registry.lookup("/api/v1/products").unwrap().name, "products");
        assert_eq!(registry.lookup("/api/v1/products/42").unwrap().name, "products");
        assert_eq!(registry.lookup("/api/v1/products/42/extra").unwrap().name, "products");
        assert!(registry.lookup("/api/v1/productsX").is_none());
        assert!(registry.lookup("/api/v1").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let registry = RouteRegistry::build(vec![
            descriptor("api", &["/api/"]),
            descriptor("products", &["/api/v1/products/"]),
            descriptor("exact", &["/api/v1/products/special"]),
        ])
        .unwrap();

        assert_eq!(registry.lookup("/api/v1/products/7").unwrap().name, "products");
        assert_eq!(registry.lookup("/api/v1/orders/7").unwrap().name, "api");
        assert_eq!(registry.lookup("/api/v1/products/special").unwrap().name, "exact");
    }

    #[test]
    fn test_registration_order_does_not_matter() {
        let forward = RouteRegistry::build(vec![
            descriptor("short", &["/a/"]),
            descriptor("long", &["/a/b/"]),
        ])
        .unwrap();
        let backward = RouteRegistry::build(vec![
            descriptor("long", &["/a/b/"]),
            descriptor("short", &["/a/"]),
        ])
        .unwrap();

        for path in ["/a/x", "/a/b/c", "/a/b/"] {
            assert_eq!(
                forward.lookup(path).unwrap().name,
                backward.lookup(path).unwrap().name,
                "path {}",
                path
            );
        }
    }

    #[test]
    fn test_duplicate_patterns_are_rejected() {
        let result = RouteRegistry::build(vec![
            descriptor("first", &["/health"]),
            descriptor("second", &["/health"]),
        ]);
        assert!(matches!(result, Err(GatewayError::Configuration { .. })));

        let result = RouteRegistry::build(vec![descriptor("dup", &["/x/", "/x/"])]);
        assert!(result.is_err());

        let result = RouteRegistry::build(vec![descriptor("empty", &[])]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dispatch() {
        let registry = RouteRegistry::build(vec![descriptor("products", &["/api/v1/products"])]).unwrap();

        let request = Request::builder().uri("/api/v1/products").body(Body::empty()).unwrap();
        let response = registry.dispatch(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "products");

        let request = Request::builder().uri("/nowhere").body(Body::empty()).unwrap();
        let response = registry.dispatch(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
