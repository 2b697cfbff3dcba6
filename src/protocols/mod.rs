//! Everything between the HTTP surface and the product service: the wire contract,
//! the gRPC client, REST translation, failure mapping and call telemetry.

pub mod grpc;
pub mod products;
pub mod status;
pub mod telemetry;
pub mod translator;

pub use grpc::GrpcProductBackend;
pub use translator::ProductsRouteHandler;
