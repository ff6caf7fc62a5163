//! Typed facade over the product table and the image bucket.
//!
//! Workflows (catalog, admin form, admin listing) only talk to [`ProductBackend`], so
//! they can run against the bundled SQLite/filesystem stores or against a test double.

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{CreateProductRequest, Product, UpdateProductRequest};
use crate::storage::ImageStore;

/// Product repository contract.
#[async_trait]
pub trait ProductBackend: Send + Sync {
    /// All products, newest first. An empty list is a success, not an error.
    async fn list_products(&self) -> Result<Vec<Product>, AppError>;

    /// A single product; `NotFound` if no record matches.
    async fn get_product(&self, id: &str) -> Result<Product, AppError>;

    /// Insert a product; the store assigns id and timestamps.
    async fn create_product(&self, fields: &CreateProductRequest) -> Result<Product, AppError>;

    /// Partial update; unspecified fields are left untouched.
    async fn update_product(
        &self,
        id: &str,
        fields: &UpdateProductRequest,
    ) -> Result<Product, AppError>;

    async fn delete_product(&self, id: &str) -> Result<(), AppError>;

    /// Store an image under `name` (already made unique by the caller) and return its URL.
    async fn upload_image(&self, bytes: &[u8], name: &str) -> Result<String, AppError>;

    /// Remove a previously uploaded image by name.
    async fn remove_image(&self, name: &str) -> Result<(), AppError>;
}

/// [`ProductBackend`] over the SQLite repository and the filesystem image store.
#[derive(Clone)]
pub struct StoreClient {
    repo: Arc<Repository>,
    images: Arc<ImageStore>,
}

impl StoreClient {
    pub fn new(repo: Arc<Repository>, images: Arc<ImageStore>) -> Self {
        Self { repo, images }
    }
}

#[async_trait]
impl ProductBackend for StoreClient {
    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        self.repo.list_products().await
    }

    async fn get_product(&self, id: &str) -> Result<Product, AppError> {
        self.repo
            .get_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
    }

    async fn create_product(&self, fields: &CreateProductRequest) -> Result<Product, AppError> {
        self.repo.create_product(fields).await
    }

    async fn update_product(
        &self,
        id: &str,
        fields: &UpdateProductRequest,
    ) -> Result<Product, AppError> {
        self.repo.update_product(id, fields).await
    }

    async fn delete_product(&self, id: &str) -> Result<(), AppError> {
        self.repo.delete_product(id).await
    }

    async fn upload_image(&self, bytes: &[u8], name: &str) -> Result<String, AppError> {
        self.images.upload(bytes, name).await
    }

    async fn remove_image(&self, name: &str) -> Result<(), AppError> {
        self.images.remove(name).await
    }
}
