//! Request routing: path pattern registry, path classification and pagination
//! parameters.

pub mod pagination;
pub mod path;
pub mod registry;

pub use pagination::PageCursor;
pub use path::{parse_request_path, parse_route, ParsedRoute};
pub use registry::{RouteDescriptor, RouteHandler, RouteRegistry};
