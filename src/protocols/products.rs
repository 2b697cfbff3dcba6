//! # `products.v1` Wire Contract
//!
//! Protobuf messages and the unary client for the `products.v1.ProductService` gRPC
//! service (see `proto/products/v1/products.proto`). The messages are declared with
//! `prost` derives and the client drives `tonic::client::Grpc` directly, exactly as
//! generated code would.
//!
//! `CreateProductRequest` also derives `Deserialize`: the gateway decodes the JSON
//! request body straight into the call payload, with missing fields left at their
//! protobuf zero values for the backend to validate.

use serde::Deserialize;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;
use tonic::{Code, Request, Response, Status};

/// Fully qualified gRPC service name
pub const SERVICE_NAME: &str = "products.v1.ProductService";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Product {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(double, tag = "4")]
    pub price: f64,
    #[prost(string, tag = "5")]
    pub currency: String,
    #[prost(uint32, tag = "6")]
    pub stock_quantity: u32,
    #[prost(message, optional, tag = "7")]
    pub created_at: Option<::prost_types::Timestamp>,
    #[prost(message, optional, tag = "8")]
    pub updated_at: Option<::prost_types::Timestamp>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetProductRequest {
    #[prost(int64, tag = "1")]
    pub id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetProductResponse {
    #[prost(message, optional, tag = "1")]
    pub product: Option<Product>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListProductsRequest {
    #[prost(uint32, tag = "1")]
    pub page_size: u32,
    #[prost(uint32, tag = "2")]
    pub page_token: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListProductsResponse {
    #[prost(message, repeated, tag = "1")]
    pub products: Vec<Product>,
    #[prost(uint32, tag = "2")]
    pub next_page_token: u32,
}

#[derive(Clone, PartialEq, ::prost::Message, Deserialize)]
#[serde(default)]
pub struct CreateProductRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub description: String,
    #[prost(double, tag = "3")]
    pub price: f64,
    #[prost(string, tag = "4")]
    pub currency: String,
    #[prost(uint32, tag = "5")]
    pub stock_quantity: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateProductResponse {
    #[prost(message, optional, tag = "1")]
    pub product: Option<Product>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteProductRequest {
    #[prost(int64, tag = "1")]
    pub id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteProductResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
}

/// Unary client for `products.v1.ProductService`
#[derive(Debug, Clone)]
pub struct ProductServiceClient {
    inner: tonic::client::Grpc<Channel>,
}

impl ProductServiceClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    /// Compress requests and accept compressed responses with gzip
    pub fn with_gzip(mut self) -> Self {
        self.inner = self
            .inner
            .send_compressed(tonic::codec::CompressionEncoding::Gzip)
            .accept_compressed(tonic::codec::CompressionEncoding::Gzip);
        self
    }

    pub async fn get_product(
        &mut self,
        request: Request<GetProductRequest>,
    ) -> Result<Response<GetProductResponse>, Status> {
        self.unary(request, "/products.v1.ProductService/GetProduct").await
    }

    pub async fn list_products(
        &mut self,
        request: Request<ListProductsRequest>,
    ) -> Result<Response<ListProductsResponse>, Status> {
        self.unary(request, "/products.v1.ProductService/ListProducts").await
    }

    pub async fn create_product(
        &mut self,
        request: Request<CreateProductRequest>,
    ) -> Result<Response<CreateProductResponse>, Status> {
        self.unary(request, "/products.v1.ProductService/CreateProduct").await
    }

    pub async fn delete_product(
        &mut self,
        request: Request<DeleteProductRequest>,
    ) -> Result<Response<DeleteProductResponse>, Status> {
        self.unary(request, "/products.v1.ProductService/DeleteProduct").await
    }

    async fn unary<M1, M2>(
        &mut self,
        request: Request<M1>,
        path: &'static str,
    ) -> Result<Response<M2>, Status>
    where
        M1: ::prost::Message + Send + Sync + 'static,
        M2: ::prost::Message + Default + Send + Sync + 'static,
    {
        self.inner.ready().await.map_err(|e| {
            Status::new(Code::Unknown, format!("Service was not ready: {}", e))
        })?;
        let codec: ProstCodec<M1, M2> = ProstCodec::default();
        let path = PathAndQuery::from_static(path);
        self.inner.unary(request, path, codec).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_create_request_from_json_defaults_missing_fields() {
        let req: CreateProductRequest =
            serde_json::from_str(r#"{"name":"Widget","currency":"USD","price":9.99}"#).unwrap();
        assert_eq!(req.name, "Widget");
        assert_eq!(req.price, 9.99);
        assert_eq!(req.description, "");
        assert_eq!(req.stock_quantity, 0);
    }

    #[test]
    fn test_create_request_rejects_wrong_types() {
        let result: Result<CreateProductRequest, _> =
            serde_json::from_str(r#"{"name":"Widget","price":"cheap"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_product_wire_encoding() {
        let product = Product {
            id: 42,
            name: "Widget".to_string(),
            price: 9.99,
            currency: "USD".to_string(),
            stock_quantity: 5,
            ..Default::default()
        };

        let bytes = product.encode_to_vec();
        let decoded = Product::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, product);
        assert!(decoded.created_at.is_none());
    }
}
