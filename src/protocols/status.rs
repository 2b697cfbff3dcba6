//! # Backend Status Mapping
//!
//! Translates a backend failure (gRPC code + message) into the HTTP status and body
//! the client sees. The mapping is data: a static table of the codes whose messages
//! are safe to surface, plus a default branch that hides everything else behind a
//! generic 500. Supporting a new code means adding a row, not a match arm.

use axum::http::StatusCode;
use tonic::Code;

/// Body sent for every failure that falls through the table
pub const GENERIC_ERROR_MESSAGE: &str = "Internal server error";

/// Backend codes with a client-visible HTTP status
static STATUS_TABLE: &[(Code, StatusCode)] = &[
    (Code::InvalidArgument, StatusCode::BAD_REQUEST),
    (Code::FailedPrecondition, StatusCode::BAD_REQUEST),
    (Code::NotFound, StatusCode::NOT_FOUND),
    (Code::AlreadyExists, StatusCode::CONFLICT),
];

/// HTTP status and body for a backend failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedFailure {
    pub status: StatusCode,
    pub message: String,
}

/// Look up the client-visible status for a code, if it has one
fn lookup(code: Code) -> Option<StatusCode> {
    STATUS_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, status)| *status)
}

/// Whether the backend message for this code may be shown to the client
pub fn is_surfaced(code: Code) -> bool {
    lookup(code).is_some()
}

/// HTTP status for a backend code; unknown codes map to 500
pub fn http_status_for(code: Code) -> StatusCode {
    lookup(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Map a backend failure to its HTTP status and client-safe body
///
/// Deadline expiry, unavailability, internal errors and transport failures all land
/// in the default branch: the original message is dropped here and must be logged
/// by the caller.
pub fn map_backend_failure(code: Code, message: &str) -> MappedFailure {
    match lookup(code) {
        Some(status) => MappedFailure {
            status,
            message: message.to_string(),
        },
        None => MappedFailure {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: GENERIC_ERROR_MESSAGE.to_string(),
        },
    }
}
