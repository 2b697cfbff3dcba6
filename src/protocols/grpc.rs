//! gRPC implementation of [`ProductBackend`].
//!
//! The channel is created lazily: startup never blocks on the product service, and the
//! first call (or any call after the service went away) establishes the connection,
//! bounded by the configured connect timeout. The channel multiplexes concurrent calls,
//! so the client is cloned per call instead of pooled.

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};
use tracing::info;

use crate::backend::ProductBackend;
use crate::core::config::BackendConfig;
use crate::core::error::GatewayResult;
use crate::protocols::products::{
    CreateProductRequest, CreateProductResponse, DeleteProductRequest, DeleteProductResponse,
    GetProductRequest, GetProductResponse, ListProductsRequest, ListProductsResponse,
    ProductServiceClient,
};

/// Product backend reached over a tonic channel
#[derive(Debug, Clone)]
pub struct GrpcProductBackend {
    client: ProductServiceClient,
    target: String,
}

impl GrpcProductBackend {
    /// Build the client from backend configuration without connecting yet
    pub fn connect_lazy(config: &BackendConfig) -> GatewayResult<Self> {
        let target = config.endpoint_url();
        let endpoint = Endpoint::from_shared(target.clone())?
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout);

        let channel = endpoint.connect_lazy();
        info!(
            target = %target,
            connect_timeout = ?config.connect_timeout,
            request_timeout = ?config.request_timeout,
            compression = config.compression,
            "gRPC client configured for product service"
        );

        Ok(Self::from_channel(channel, target, config.compression))
    }

    pub fn from_channel(channel: Channel, target: String, compression: bool) -> Self {
        let client = ProductServiceClient::new(channel);
        let client = if compression { client.with_gzip() } else { client };
        Self { client, target }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl ProductBackend for GrpcProductBackend {
    async fn get_product(
        &self,
        request: Request<GetProductRequest>,
    ) -> Result<GetProductResponse, Status> {
        let mut client = self.client.clone();
        Ok(client.get_product(request).await?.into_inner())
    }

    async fn list_products(
        &self,
        request: Request<ListProductsRequest>,
    ) -> Result<ListProductsResponse, Status> {
        let mut client = self.client.clone();
        Ok(client.list_products(request).await?.into_inner())
    }

    async fn create_product(
        &self,
        request: Request<CreateProductRequest>,
    ) -> Result<CreateProductResponse, Status> {
        let mut client = self.client.clone();
        Ok(client.create_product(request).await?.into_inner())
    }

    async fn delete_product(
        &self,
        request: Request<DeleteProductRequest>,
    ) -> Result<DeleteProductResponse, Status> {
        let mut client = self.client.clone();
        Ok(client.delete_product(request).await?.into_inner())
    }
}
