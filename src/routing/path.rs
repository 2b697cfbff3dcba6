//! Classification of a request path relative to a resource's base path.

use std::fmt;

/// Shape of a path under a resource base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedRoute {
    /// The base path itself (`/api/v1/products`)
    Collection,
    /// A single item below the base (`/api/v1/products/42`)
    Item(i64),
    /// Anything else: extra segments, a non-numeric id, a different prefix
    Unrecognized,
}

/// Classify `path` against `base`
///
/// A single trailing `/` on the path is ignored. An item id must be one non-empty
/// segment that parses entirely as a signed 64-bit decimal integer.
pub fn parse_route(path: &str, base: &str) -> ParsedRoute {
    let path = path.strip_suffix('/').unwrap_or(path);

    if path == base {
        return ParsedRoute::Collection;
    }

    let remainder = match path.strip_prefix(base).and_then(|rest| rest.strip_prefix('/')) {
        Some(rest) if !rest.is_empty() && !rest.contains('/') => rest,
        _ => return ParsedRoute::Unrecognized,
    };

    match remainder.parse::<i64>() {
        Ok(id) => ParsedRoute::Item(id),
        Err(_) => ParsedRoute::Unrecognized,
    }
}

/// Classify a raw request path, percent-decoding it first
///
/// `%34%32` reaches the parser as `42`. A path that does not decode to UTF-8 is
/// unrecognized.
pub fn parse_request_path(raw: &str, base: &str) -> ParsedRoute {
    match urlencoding::decode(raw) {
        Ok(path) => parse_route(&path, base),
        Err(_) => ParsedRoute::Unrecognized,
    }
}

impl ParsedRoute {
    /// Render the route back into a path under `base`
    pub fn to_path(&self, base: &str) -> Option<String> {
        match self {
            Self::Collection => Some(base.to_string()),
            Self::Item(id) => Some(format!("{}/{}", base, id)),
            Self::Unrecognized => None,
        }
    }
}

impl fmt::Display for ParsedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection => write!(f, "collection"),
            Self::Item(id) => write!(f, "item({})", id),
            Self::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "/api/v1/products";

    #[test]
    fn test_collection() {
        assert_eq!(parse_route("/api/v1/products", BASE), ParsedRoute::Collection);
        assert_eq!(parse_route("/api/v1/products/", BASE), ParsedRoute::Collection);
    }

    #[test]
    fn test_items() {
        assert_eq!(parse_route("/api/v1/products/42", BASE), ParsedRoute::Item(42));
        assert_eq!(parse_route("/api/v1/products/42/", BASE), ParsedRoute::Item(42));
        assert_eq!(parse_route("/api/v1/products/-7", BASE), ParsedRoute::Item(-7));
        assert_eq!(parse_route("/api/v1/products/007", BASE), ParsedRoute::Item(7));
    }

    #[test]
    fn test_unrecognized_shapes() {
        let paths = [
            "/api/v1/products/12/extra",
            "/api/v1/products/abc",
            "/api/v1/products/12abc",
            "/api/v1/products/1.5",
            "/api/v1/products//",
            "/api/v1/products//12",
            "/api/v1/products/99999999999999999999",
            "/api/v1/productsX",
            "/api/v1/productsX/1",
            "/api/v1",
            "/",
            "",
        ];

        for path in paths {
            assert_eq!(parse_route(path, BASE), ParsedRoute::Unrecognized, "path {:?}", path);
        }
    }

    #[test]
    fn test_item_round_trip() {
        let ids = [i64::MIN, -1_000_000, -1, 0, 1, 42, 1 << 40, i64::MAX];

        for id in ids {
            let path = ParsedRoute::Item(id).to_path(BASE).unwrap();
            assert_eq!(parse_route(&path, BASE), ParsedRoute::Item(id), "path {}", path);
        }
        assert_eq!(ParsedRoute::Unrecognized.to_path(BASE), None);
    }

    #[test]
    fn test_percent_encoded_paths_are_decoded() {
        assert_eq!(parse_request_path("/api/v1/products/%34%32", BASE), ParsedRoute::Item(42));
        assert_eq!(parse_request_path("/api/v1/products/%2D7", BASE), ParsedRoute::Item(-7));
        assert_eq!(parse_request_path("/api/v1/products/42", BASE), ParsedRoute::Item(42));
        assert_eq!(parse_request_path("/api/v1/products/", BASE), ParsedRoute::Collection);
        assert_eq!(
            parse_request_path("/api/v1/products/1%2F2", BASE),
            ParsedRoute::Unrecognized
        );
        assert_eq!(parse_request_path("/api/v1/products/%FF", BASE), ParsedRoute::Unrecognized);
    }
}
