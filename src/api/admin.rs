//! Admin product management endpoints. Every route here sits behind `require_admin`.

use std::time::Duration;

use axum::{
    extract::{Multipart, Path, Query, State},
    Extension,
};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult, ValidJson};
use crate::admin::{
    reconcile_orphans, Confirmation, DeleteOutcome, FormMode, ListingView, ProductForm,
    ProductListing, StagedImage, ORPHAN_GRACE,
};
use crate::auth::AdminContext;
use crate::client::ProductBackend;
use crate::errors::AppError;
use crate::models::{CategoryQuery, CreateProductRequest, Product, UpdateProductRequest};
use crate::storage::unique_name;
use crate::AppState;

/// Product written by a form submission plus the re-fetched list.
///
/// The write is already committed when the list is fetched, so a failed re-fetch leaves
/// `listing` empty and reports the error in `refreshError` instead of failing the request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponse {
    pub product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<ListingView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_error: Option<String>,
}

impl FormResponse {
    async fn after_write(product: Product, backend: &dyn ProductBackend) -> Self {
        match ProductListing::load(backend).await {
            Ok(listing) => Self {
                product,
                listing: Some(listing.view()),
                refresh_error: None,
            },
            Err(err) => {
                tracing::warn!(
                    product_id = %product.id,
                    "Product saved but re-fetch failed: {}",
                    err
                );
                Self {
                    product,
                    listing: None,
                    refresh_error: Some(err.to_string()),
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ReconcileReport {
    pub removed: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    pub confirm: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileQuery {
    /// Only images at least this old are considered
    pub min_age_secs: Option<u64>,
}

/// GET /api/admin/products - Management list with dashboard stats.
pub async fn list_admin_products(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<ListingView> {
    let filter = query.filter()?;
    let mut listing = ProductListing::load(state.backend.as_ref()).await?;
    listing.set_filter(filter);
    success(listing.view())
}

/// POST /api/admin/products - Create a product from the multipart form.
///
/// A missing `available` field means available. An unchecked HTML checkbox sends nothing,
/// so a client that wants a draft must send `available=false` explicitly.
pub async fn create_product_form(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    multipart: Multipart,
) -> ApiResult<FormResponse> {
    let form = read_product_form(
        ProductForm::default(),
        multipart,
        state.config.max_upload_bytes,
    )
    .await?;
    let outcome = form.submit(state.backend.as_ref(), &FormMode::Create).await?;
    tracing::info!(
        product_id = %outcome.product().id,
        by = %admin.identity.email,
        "Product created"
    );

    success(FormResponse::after_write(outcome.product().clone(), state.backend.as_ref()).await)
}

/// PUT /api/admin/products/:id/form - Edit a product from the multipart form.
pub async fn edit_product_form(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<FormResponse> {
    let existing = state.backend.get_product(&id).await?;
    // Fields left out of the submission keep their stored values.
    let form = read_product_form(
        ProductForm::from_product(&existing),
        multipart,
        state.config.max_upload_bytes,
    )
    .await?;
    let outcome = form
        .submit(state.backend.as_ref(), &FormMode::edit(&existing))
        .await?;
    tracing::info!(
        product_id = %id,
        by = %admin.identity.email,
        "Product updated"
    );

    success(FormResponse::after_write(outcome.product().clone(), state.backend.as_ref()).await)
}

/// PATCH /api/admin/products/:id - Partial update from JSON.
pub async fn patch_product(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Path(id): Path<String>,
    ValidJson(request): ValidJson<UpdateProductRequest>,
) -> ApiResult<Product> {
    let product = state.backend.update_product(&id, &request).await?;
    tracing::info!(
        product_id = %id,
        by = %admin.identity.email,
        "Product patched"
    );
    success(product)
}

/// POST /api/admin/products/json - Create a product from JSON.
pub async fn create_product_json(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    ValidJson(request): ValidJson<CreateProductRequest>,
) -> ApiResult<Product> {
    let product = state.backend.create_product(&request).await?;
    tracing::info!(
        product_id = %product.id,
        by = %admin.identity.email,
        "Product created"
    );
    success(product)
}

/// DELETE /api/admin/products/:id?confirm=true - Delete a product.
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<ListingView> {
    let view = delete_confirmed(state.backend.as_ref(), &id, query.confirm).await?;
    tracing::info!(
        product_id = %id,
        by = %admin.identity.email,
        "Product deleted"
    );
    success(view)
}

/// The confirmation check comes before any backend call, including the list fetch.
async fn delete_confirmed(
    backend: &dyn ProductBackend,
    id: &str,
    confirm: Option<bool>,
) -> Result<ListingView, AppError> {
    let mut listing = ProductListing::default();
    match listing
        .delete(backend, id, Confirmation::from_flag(confirm))
        .await?
    {
        DeleteOutcome::Deleted => Ok(listing.view()),
        DeleteOutcome::Cancelled => Err(AppError::ConfirmationRequired(
            "Deleting a product requires confirm=true".to_string(),
        )),
    }
}

/// POST /api/admin/images - Upload a single image.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<UploadedImage> {
    let mut staged = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            staged = read_image_field(field, state.config.max_upload_bytes).await?;
        }
    }
    let image =
        staged.ok_or_else(|| AppError::Validation("An image file is required".to_string()))?;

    let name = unique_name(&image.file_name);
    let url = state.backend.upload_image(&image.bytes, &name).await?;
    success(UploadedImage { name, url })
}

/// POST /api/admin/storage/reconcile - Remove images no product references.
pub async fn reconcile_storage(
    State(state): State<AppState>,
    Query(query): Query<ReconcileQuery>,
) -> ApiResult<ReconcileReport> {
    let grace = query
        .min_age_secs
        .map(Duration::from_secs)
        .unwrap_or(ORPHAN_GRACE);
    let removed = reconcile_orphans(&state.repo, &state.images, grace).await?;
    success(ReconcileReport { removed })
}

/// Apply the multipart fields of a submission on top of `form`.
///
/// Fields that are not sent keep the value already in `form`. For `available` that is
/// `true` on create (the `ProductForm` default) and the stored value on edit.
async fn read_product_form(
    mut form: ProductForm,
    mut multipart: Multipart,
    max_image_bytes: usize,
) -> Result<ProductForm, AppError> {
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "image" {
            form.image = read_image_field(field, max_image_bytes).await?;
            continue;
        }

        let value = field.text().await?;
        match name.as_str() {
            "title" => form.title = value,
            "description" => form.description = value,
            "price" => form.price = value,
            "currency" => form.currency = value,
            "category" => form.category = value,
            "available" => form.available = parse_flag(&value)?,
            "link" => form.link = value,
            "rating" => form.rating = value,
            "reviews" => form.reviews = value,
            other => tracing::debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// An empty file input (no file chosen) stages nothing.
async fn read_image_field(
    field: axum::extract::multipart::Field<'_>,
    max_bytes: usize,
) -> Result<Option<StagedImage>, AppError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await?;

    if file_name.is_empty() && bytes.is_empty() {
        return Ok(None);
    }
    StagedImage::new(file_name, content_type, bytes.to_vec(), max_bytes).map(Some)
}

fn parse_flag(value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" | "" => Ok(false),
        other => Err(AppError::Validation(format!(
            "Invalid availability value '{}'",
            other
        ))),
    }
}
