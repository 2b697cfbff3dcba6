//! In-process product store implementing [`ProductBackend`].
//!
//! Applies the same request validation as the product service (id required, name and
//! currency required, positive price) and the same offset pagination, so the gateway
//! can be exercised end to end without a running backend.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tonic::{Request, Status};
use tracing::debug;

use super::ProductBackend;
use crate::protocols::products::{
    CreateProductRequest, CreateProductResponse, DeleteProductRequest, DeleteProductResponse,
    GetProductRequest, GetProductResponse, ListProductsRequest, ListProductsResponse, Product,
};

/// Page size used when the request leaves it at zero
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page the store will return
pub const MAX_PAGE_SIZE: u32 = 100;

/// Product store backed by a concurrent map
#[derive(Debug)]
pub struct InMemoryProductBackend {
    products: DashMap<u64, Product>,
    next_id: AtomicU64,
}

impl InMemoryProductBackend {
    pub fn new() -> Self {
        Self::with_first_id(1)
    }

    /// Start id assignment at `first_id`
    pub fn with_first_id(first_id: u64) -> Self {
        Self {
            products: DashMap::new(),
            next_id: AtomicU64::new(first_id.max(1)),
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn require_id(id: i64) -> Result<u64, Status> {
        if id == 0 {
            return Err(Status::invalid_argument("id is required"));
        }
        u64::try_from(id).map_err(|_| Status::not_found(format!("product {} not found", id)))
    }

    fn validate_create(req: &CreateProductRequest) -> Result<(), Status> {
        if req.name.is_empty() {
            return Err(Status::invalid_argument("name is required"));
        }
        if req.currency.is_empty() {
            return Err(Status::invalid_argument("currency is required"));
        }
        if req.price <= 0.0 {
            return Err(Status::invalid_argument("price must be greater than 0"));
        }
        Ok(())
    }
}

impl Default for InMemoryProductBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductBackend for InMemoryProductBackend {
    async fn get_product(
        &self,
        request: Request<GetProductRequest>,
    ) -> Result<GetProductResponse, Status> {
        let id = Self::require_id(request.get_ref().id)?;

        let product = self
            .products
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Status::not_found(format!("product {} not found", id)))?;

        Ok(GetProductResponse {
            product: Some(product),
        })
    }

    async fn list_products(
        &self,
        request: Request<ListProductsRequest>,
    ) -> Result<ListProductsResponse, Status> {
        let req = request.into_inner();
        let page_size = match req.page_size {
            0 => DEFAULT_PAGE_SIZE,
            size => size.min(MAX_PAGE_SIZE),
        };
        let offset = req.page_token as usize;

        let mut ids: Vec<u64> = self.products.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();

        let products: Vec<Product> = ids
            .iter()
            .skip(offset)
            .take(page_size as usize)
            .filter_map(|id| self.products.get(id).map(|entry| entry.value().clone()))
            .collect();

        let consumed = offset + products.len();
        let next_page_token = if consumed < ids.len() {
            u32::try_from(consumed).unwrap_or(0)
        } else {
            0
        };

        Ok(ListProductsResponse {
            products,
            next_page_token,
        })
    }

    async fn create_product(
        &self,
        request: Request<CreateProductRequest>,
    ) -> Result<CreateProductResponse, Status> {
        let req = request.into_inner();
        Self::validate_create(&req)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let now = prost_types::Timestamp::from(SystemTime::now());
        let product = Product {
            id,
            name: req.name,
            description: req.description,
            price: req.price,
            currency: req.currency,
            stock_quantity: req.stock_quantity,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };

        self.products.insert(id, product.clone());
        debug!(product_id = id, "product created");

        Ok(CreateProductResponse {
            product: Some(product),
        })
    }

    async fn delete_product(
        &self,
        request: Request<DeleteProductRequest>,
    ) -> Result<DeleteProductResponse, Status> {
        let id = Self::require_id(request.get_ref().id)?;
        let removed = self.products.remove(&id).is_some();
        debug!(product_id = id, removed, "product delete");

        Ok(DeleteProductResponse { success: removed })
    }
}
