//! # Error Handling Module
//!
//! This module provides the error type shared by every part of the gateway, built on
//! the `thiserror` crate. Each variant belongs to one of four families, and the family
//! decides what the client is allowed to see:
//!
//! - **Client input errors** (unknown route, unsupported method, bad body, bad page
//!   token): always 4xx, and the message may echo what the client sent.
//! - **Backend semantic errors** (validation, not found, conflict): mapped through the
//!   status table in [`crate::protocols::status`], backend message surfaced as-is.
//! - **Backend infrastructure errors** (unavailable, internal, deadline exceeded, raw
//!   transport failures): always 500 with a generic body; detail stays in the logs.
//! - **Startup errors** (configuration, I/O, YAML, channel setup): reported before the
//!   listener binds.
//!
//! ## Rust Concepts Used
//!
//! - `Result<T, E>` with the `?` operator instead of exceptions
//! - `From` implementations so foreign errors convert automatically at `?` sites
//! - `IntoResponse` so handlers can return `GatewayResult<Response>` directly

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tonic::Code;

use crate::protocols::status::{self, GENERIC_ERROR_MESSAGE};

/// Main result type used throughout the gateway
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Error types for the product gateway
///
/// The `#[error("...")]` attribute produces the `Display` text used in logs. What the
/// client receives is decided separately by [`GatewayError::client_message`].
#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    /// Configuration-related errors (invalid config, missing files, duplicate routes)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// No registered pattern or route shape matches the request path
    #[error("Route not found: {path}")]
    RouteNotFound { path: String },

    /// The route exists but does not accept this HTTP method
    #[error("Method {method} not allowed (allowed: {allowed})")]
    MethodNotAllowed { method: String, allowed: &'static str },

    /// Request validation errors (malformed body, unreadable stream, bad page token)
    #[error("Request validation failed: {field} - {reason}")]
    RequestValidation { field: String, reason: String },

    /// Structured failure reported by the backend service
    #[error("Backend error ({code:?}): {message}")]
    Backend { code: Code, message: String },

    /// Failure that never produced a structured backend status
    #[error("Backend transport error: {message}")]
    Transport { message: String },

    /// Internal server errors for unexpected failures
    #[error("Internal server error: {message}")]
    Internal { message: String },

    /// I/O errors (file operations, socket binding, etc.)
    #[error("I/O error: {message}")]
    Io { message: String },

    /// YAML parsing errors for configuration files
    #[error("YAML error: {message}")]
    Yaml { message: String },
}

impl GatewayError {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error with a custom message
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a route-not-found error for the given request path
    pub fn not_found<S: Into<String>>(path: S) -> Self {
        Self::RouteNotFound { path: path.into() }
    }

    /// Create a method-not-allowed error carrying the `Allow` header value
    pub fn method_not_allowed<S: Into<String>>(method: S, allowed: &'static str) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
            allowed,
        }
    }

    /// Create a validation error for a specific request field
    pub fn validation<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self::RequestValidation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a backend error from a failure code and message
    pub fn backend<S: Into<String>>(code: Code, message: S) -> Self {
        Self::Backend {
            code,
            message: message.into(),
        }
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::RequestValidation { .. } => StatusCode::BAD_REQUEST,
            Self::Backend { code, .. } => status::http_status_for(*code),
            Self::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Transport { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Yaml { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the error was caused by the client's input
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// The message that is safe to send back to the client
    ///
    /// Server-side failures never leak their detail; the full error is only
    /// available through `Display` for logging.
    pub fn client_message(&self) -> String {
        match self {
            Self::RouteNotFound { .. } => "Not found".to_string(),
            Self::MethodNotAllowed { .. } => "Method not allowed".to_string(),
            Self::RequestValidation { reason, .. } => reason.clone(),
            Self::Backend { code, message } => status::map_backend_failure(*code, message).message,
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Get a string representation of the error type for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration_error",
            Self::RouteNotFound { .. } => "not_found",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::RequestValidation { .. } => "request_validation_error",
            Self::Backend { code, .. } if status::is_surfaced(*code) => "backend_error",
            Self::Backend { .. } => "internal_error",
            Self::Transport { .. } => "internal_error",
            Self::Internal { .. } => "internal_error",
            Self::Io { .. } => "io_error",
            Self::Yaml { .. } => "yaml_error",
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for GatewayError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: err.to_string(),
        }
    }
}

/// A gRPC status is the structured failure shape of the backend
impl From<tonic::Status> for GatewayError {
    fn from(status: tonic::Status) -> Self {
        Self::Backend {
            code: status.code(),
            message: status.message().to_string(),
        }
    }
}

/// Channel setup failures carry no backend status
impl From<tonic::transport::Error> for GatewayError {
    fn from(err: tonic::transport::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

/// Convert errors into HTTP responses
///
/// The body is always `{"error": {"code", "message", "type"}}`; the message comes from
/// [`GatewayError::client_message`] so 500s stay generic.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_response = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.client_message(),
                "type": self.error_type(),
            }
        });

        let mut response = (status, Json(error_response)).into_response();
        if let Self::MethodNotAllowed { allowed, .. } = self {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(allowed));
        }
        response
    }
}

/// Convenience macro for creating configuration errors
///
/// Usage: `config_error!("Invalid port: {}", port)`
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::core::error::GatewayError::config(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_status_codes() {
        assert_eq!(GatewayError::not_found("/x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            GatewayError::method_not_allowed("PATCH", "GET, DELETE").status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            GatewayError::validation("page_token", "invalid page_token").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert!(GatewayError::validation("body", "bad").is_client_error());
    }

    #[test]
    fn test_backend_errors_follow_status_table() {
        assert_eq!(
            GatewayError::backend(Code::AlreadyExists, "dup").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GatewayError::backend(Code::Unavailable, "down").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_do_not_leak_detail() {
        let err = GatewayError::backend(Code::Internal, "pq: relation products does not exist");
        assert_eq!(err.client_message(), GENERIC_ERROR_MESSAGE);
        assert!(err.to_string().contains("relation products"));

        let transport = tonic::transport::Endpoint::from_shared("http://bad host:1").unwrap_err();
        let err = GatewayError::from(transport);
        assert!(matches!(err, GatewayError::Transport { .. }));
        assert_eq!(err.client_message(), GENERIC_ERROR_MESSAGE);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_status_conversion() {
        let err: GatewayError = tonic::Status::not_found("product 7 not found").into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.client_message(), "product 7 not found");
        assert_eq!(err.error_type(), "backend_error");
    }

    #[test]
    fn test_method_not_allowed_sets_allow_header() {
        let response = GatewayError::method_not_allowed("PATCH", "GET, DELETE").into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET, DELETE");
    }
}
