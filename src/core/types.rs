//! # Core Types Module
//!
//! JSON-facing representations of the backend's typed responses. The wire messages in
//! [`crate::protocols::products`] carry protobuf timestamps and optional sub-messages;
//! the types here are what clients actually receive.
//!
//! ## Rust Concepts Used
//!
//! - `From` conversions keep the wire-to-JSON mapping in one place
//! - `serde` derives define the exact JSON field names and order

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocols::products::{
    CreateProductResponse, DeleteProductResponse, GetProductResponse, ListProductsResponse,
    Product,
};

/// REST-friendly view of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: String,
    pub stock_quantity: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for single-product responses (get and create)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEnvelope {
    pub product: Option<ProductResponse>,
}

/// Body for paginated list responses
///
/// `next_page_token` is the opaque offset to send back as `page_token`; zero means
/// there are no further pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListEnvelope {
    pub products: Vec<ProductResponse>,
    pub next_page_token: u32,
}

/// Body for delete responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub success: bool,
}

fn to_datetime(timestamp: Option<prost_types::Timestamp>) -> Option<DateTime<Utc>> {
    let ts = timestamp?;
    DateTime::from_timestamp(ts.seconds, u32::try_from(ts.nanos).ok()?)
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            currency: product.currency,
            stock_quantity: product.stock_quantity,
            created_at: to_datetime(product.created_at),
            updated_at: to_datetime(product.updated_at),
        }
    }
}

impl From<GetProductResponse> for ProductEnvelope {
    fn from(response: GetProductResponse) -> Self {
        Self {
            product: response.product.map(ProductResponse::from),
        }
    }
}

impl From<CreateProductResponse> for ProductEnvelope {
    fn from(response: CreateProductResponse) -> Self {
        Self {
            product: response.product.map(ProductResponse::from),
        }
    }
}

impl From<ListProductsResponse> for ProductListEnvelope {
    fn from(response: ListProductsResponse) -> Self {
        Self {
            products: response
                .products
                .into_iter()
                .map(ProductResponse::from)
                .collect(),
            next_page_token: response.next_page_token,
        }
    }
}

impl From<DeleteProductResponse> for DeleteResult {
    fn from(response: DeleteProductResponse) -> Self {
        Self {
            success: response.success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_json_field_order() {
        let product = Product {
            id: 42,
            name: "Widget".to_string(),
            currency: "USD".to_string(),
            price: 9.99,
            stock_quantity: 5,
            created_at: Some(prost_types::Timestamp {
                seconds: 1_700_000_000,
                nanos: 0,
            }),
            ..Default::default()
        };

        let json = serde_json::to_string(&ProductEnvelope::from(CreateProductResponse {
            product: Some(product),
        }))
        .unwrap();

        assert!(json.contains(r#""id":42,"name":"Widget""#));
        assert!(json.contains(r#""created_at":"2023-11-14T22:13:20Z""#));
        assert!(json.contains(r#""updated_at":null"#));
    }

    #[test]
    fn test_negative_nanos_are_dropped() {
        let ts = prost_types::Timestamp {
            seconds: 10,
            nanos: -1,
        };
        assert_eq!(to_datetime(Some(ts)), None);
    }
}
