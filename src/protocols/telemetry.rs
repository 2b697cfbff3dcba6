//! # Telemetry Context Injector
//!
//! Every outbound backend call carries a small set of metadata entries identifying
//! when it was made and on whose behalf:
//!
//! | key            | value                                                  |
//! |----------------|--------------------------------------------------------|
//! | `timestamp`    | local call time, `Jan _2 15:04:05.000000000` layout    |
//! | `client-id`    | calling client, from the [`IdentityProvider`]          |
//! | `user-id`      | calling user, from the [`IdentityProvider`]            |
//! | `x-request-id` | inbound request id, only when the request carried one  |
//!
//! The metadata is built fresh for each call and travels in the `tonic::Request`
//! metadata map, never inside the payload.

use axum::http::HeaderMap;
use chrono::{DateTime, Local, TimeZone};
use std::fmt;
use std::sync::Arc;
use tonic::metadata::{AsciiMetadataValue, MetadataMap};
use tonic::Request;
use tracing::warn;

use crate::core::config::TelemetryConfig;

pub const TIMESTAMP_KEY: &str = "timestamp";
pub const CLIENT_ID_KEY: &str = "client-id";
pub const USER_ID_KEY: &str = "user-id";
pub const REQUEST_ID_KEY: &str = "x-request-id";

/// Nanosecond-resolution stamp without year, e.g. `Mar  7 09:15:02.123456789`
pub const TIMESTAMP_FORMAT: &str = "%b %e %H:%M:%S%.9f";

/// Supplies the client and user identity attached to backend calls
pub trait IdentityProvider: Send + Sync {
    fn client_id(&self) -> String;
    fn user_id(&self) -> String;
}

/// Fixed identity taken from configuration
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    client_id: String,
    user_id: String,
}

impl StaticIdentity {
    pub fn new<C: Into<String>, U: Into<String>>(client_id: C, user_id: U) -> Self {
        Self {
            client_id: client_id.into(),
            user_id: user_id.into(),
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(config.client_id.clone(), config.user_id.clone())
    }
}

impl IdentityProvider for StaticIdentity {
    fn client_id(&self) -> String {
        self.client_id.clone()
    }

    fn user_id(&self) -> String {
        self.user_id.clone()
    }
}

/// Metadata attached to a single backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryMetadata {
    pub timestamp: String,
    pub client_id: String,
    pub user_id: String,
    pub request_id: Option<String>,
}

impl TelemetryMetadata {
    pub fn at<Tz>(now: DateTime<Tz>, identity: &dyn IdentityProvider, request_id: Option<String>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self {
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            client_id: identity.client_id(),
            user_id: identity.user_id(),
            request_id,
        }
    }

    /// Write the entries into a call's metadata map
    ///
    /// Values that are not valid ASCII metadata are skipped with a warning; the call
    /// itself still goes out.
    pub fn apply(&self, metadata: &mut MetadataMap) {
        let entries = [
            (TIMESTAMP_KEY, Some(&self.timestamp)),
            (CLIENT_ID_KEY, Some(&self.client_id)),
            (USER_ID_KEY, Some(&self.user_id)),
            (REQUEST_ID_KEY, self.request_id.as_ref()),
        ];

        for (key, value) in entries {
            let Some(value) = value else { continue };
            match value.parse::<AsciiMetadataValue>() {
                Ok(value) => {
                    metadata.insert(key, value);
                }
                Err(_) => warn!(key, "dropping telemetry value that is not valid metadata"),
            }
        }
    }
}

/// Wraps backend payloads into requests carrying telemetry metadata
#[derive(Clone)]
pub struct TelemetryInjector {
    identity: Arc<dyn IdentityProvider>,
}

impl TelemetryInjector {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    /// Build the metadata for a call made now on behalf of a request with `headers`
    pub fn metadata_for(&self, headers: &HeaderMap) -> TelemetryMetadata {
        let request_id = headers
            .get(REQUEST_ID_KEY)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        TelemetryMetadata::at(Local::now(), self.identity.as_ref(), request_id)
    }

    pub fn inject<T>(&self, payload: T, headers: &HeaderMap) -> Request<T> {
        let mut request = Request::new(payload);
        self.metadata_for(headers).apply(request.metadata_mut());
        request
    }
}
