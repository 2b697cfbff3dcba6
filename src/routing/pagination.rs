//! # Pagination Decoder
//!
//! Turns the optional `page_size` and `page_token` query parameters into a
//! [`PageCursor`]. The two parameters are deliberately treated differently:
//!
//! - `page_size` is lenient. A missing or unparseable value falls back to
//!   [`DEFAULT_PAGE_SIZE`], and no upper bound is applied here; the backend caps it.
//! - `page_token` is strict. It is an opaque offset handed out by a previous page, so a
//!   value that does not parse means the client's pagination loop is broken and the
//!   request is rejected instead of silently restarting at the first page.

use crate::core::error::{GatewayError, GatewayResult};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_PAGE_TOKEN: u32 = 0;

pub const PAGE_SIZE_PARAM: &str = "page_size";
pub const PAGE_TOKEN_PARAM: &str = "page_token";

/// A bounded slice request for list calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page_size: u32,
    pub page_token: u32,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_token: DEFAULT_PAGE_TOKEN,
        }
    }
}

impl PageCursor {
    /// Decode from a raw (still percent-encoded) query string
    ///
    /// When a parameter repeats, its first occurrence is used.
    pub fn from_query(query: Option<&str>) -> GatewayResult<Self> {
        let query = query.unwrap_or_default();
        let first = |name: &str| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        Self::from_params(
            first(PAGE_SIZE_PARAM).as_deref(),
            first(PAGE_TOKEN_PARAM).as_deref(),
        )
    }

    /// Decode from already-extracted parameter values; empty counts as absent
    pub fn from_params(page_size: Option<&str>, page_token: Option<&str>) -> GatewayResult<Self> {
        let page_size = page_size
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| raw.parse::<u32>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let page_token = match page_token.filter(|raw| !raw.is_empty()) {
            None => DEFAULT_PAGE_TOKEN,
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                GatewayError::validation(
                    PAGE_TOKEN_PARAM,
                    format!("invalid page_token {:?}: expected an unsigned 32-bit integer", raw),
                )
            })?,
        };

        Ok(Self {
            page_size,
            page_token,
        })
    }
}
