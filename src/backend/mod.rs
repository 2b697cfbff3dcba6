//! # Product Backend
//!
//! The gateway talks to the product service through the [`ProductBackend`] trait. Calls
//! take a `tonic::Request` so telemetry metadata and deadlines travel alongside the
//! typed payload, and fail with a structured `tonic::Status`.
//!
//! Two implementations exist:
//! - [`crate::protocols::grpc::GrpcProductBackend`] calls the real service over gRPC
//! - [`memory::InMemoryProductBackend`] keeps products in process for local runs and tests

pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use tonic::{Request, Status};
use tracing::info;

use crate::core::config::{BackendConfig, BackendMode};
use crate::core::error::GatewayResult;
use crate::protocols::grpc::GrpcProductBackend;
use crate::protocols::products::{
    CreateProductRequest, CreateProductResponse, DeleteProductRequest, DeleteProductResponse,
    GetProductRequest, GetProductResponse, ListProductsRequest, ListProductsResponse,
};

pub use memory::InMemoryProductBackend;

/// Typed remote interface of the product service
#[async_trait]
pub trait ProductBackend: Send + Sync {
    async fn get_product(
        &self,
        request: Request<GetProductRequest>,
    ) -> Result<GetProductResponse, Status>;

    async fn list_products(
        &self,
        request: Request<ListProductsRequest>,
    ) -> Result<ListProductsResponse, Status>;

    async fn create_product(
        &self,
        request: Request<CreateProductRequest>,
    ) -> Result<CreateProductResponse, Status>;

    async fn delete_product(
        &self,
        request: Request<DeleteProductRequest>,
    ) -> Result<DeleteProductResponse, Status>;
}

/// Build the backend selected by `backend.mode`
pub fn from_config(config: &BackendConfig) -> GatewayResult<Arc<dyn ProductBackend>> {
    match config.mode {
        BackendMode::Grpc => Ok(Arc::new(GrpcProductBackend::connect_lazy(config)?)),
        BackendMode::InMemory => {
            info!("Using in-memory product backend");
            Ok(Arc::new(InMemoryProductBackend::new()))
        }
    }
}
