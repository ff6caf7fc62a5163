//! Public catalog endpoints.

use axum::extract::{Path, Query, State};

use super::{success, ApiResult};
use crate::catalog::CatalogReadModel;
use crate::models::{CatalogView, CategoryQuery, CategorySummary, Product};
use crate::AppState;

/// GET /api/catalog - Storefront catalog, optionally filtered by category.
///
/// Backend failures are not errors here: the bundled catalog is served instead.
pub async fn get_catalog(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<CatalogView> {
    let filter = query.filter()?;
    let mut model = CatalogReadModel::activate(state.backend.as_ref()).await;
    let items = model.filtered(filter);
    model.deactivate();
    let view = model.into_view();

    success(CatalogView { items, ..view })
}

/// GET /api/catalog/categories - Categories present in the catalog.
pub async fn get_categories(State(state): State<AppState>) -> ApiResult<Vec<CategorySummary>> {
    let model = CatalogReadModel::activate(state.backend.as_ref()).await;
    success(model.categories())
}

/// GET /api/products/:id - Get a single product.
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Product> {
    success(state.backend.get_product(&id).await?)
}
