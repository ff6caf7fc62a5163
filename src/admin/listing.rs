//! Admin product list with category filter and confirmed deletion.
//!
//! Mutations are never applied locally: after a delete the whole list is fetched again, so
//! the list always shows what the store holds. A failed re-fetch does not undo a committed
//! delete; the stale list is kept and the error is reported alongside it.

use serde::Serialize;

use crate::client::ProductBackend;
use crate::errors::AppError;
use crate::models::{CatalogStats, CategoryFilter, Product};

/// Answer to the "are you sure?" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl Confirmation {
    pub fn from_flag(confirmed: Option<bool>) -> Self {
        if confirmed == Some(true) {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// Serializable snapshot of the listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    pub products: Vec<Product>,
    pub category: String,
    pub stats: CatalogStats,
    /// Set when the list could not be re-fetched after a write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductListing {
    products: Vec<Product>,
    filter: CategoryFilter,
    refresh_error: Option<String>,
}

impl ProductListing {
    /// Fetch the list for a freshly opened screen.
    pub async fn load(backend: &dyn ProductBackend) -> Result<Self, AppError> {
        let mut listing = Self::default();
        listing.refresh(backend).await?;
        Ok(listing)
    }

    /// Replace the list with the store's current contents.
    pub async fn refresh(&mut self, backend: &dyn ProductBackend) -> Result<(), AppError> {
        self.products = backend.list_products().await?;
        self.refresh_error = None;
        Ok(())
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
    }

    /// Products matching the current filter, in list order.
    pub fn filtered(&self) -> Vec<Product> {
        self.filter.apply(self.products(), |p| p.category)
    }

    /// Dashboard counters over the whole list, ignoring the filter.
    pub fn stats(&self) -> CatalogStats {
        CatalogStats::from_products(self.products())
    }

    /// Delete after explicit confirmation, then re-fetch the list.
    pub async fn delete(
        &mut self,
        backend: &dyn ProductBackend,
        id: &str,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, AppError> {
        if confirmation == Confirmation::Declined {
            tracing::debug!(product_id = %id, "Delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        backend.delete_product(id).await?;
        if let Err(err) = self.refresh(backend).await {
            tracing::warn!(product_id = %id, "Product deleted but re-fetch failed: {}", err);
            self.refresh_error = Some(err.to_string());
        }
        Ok(DeleteOutcome::Deleted)
    }

    pub fn view(&self) -> ListingView {
        ListingView {
            products: self.filtered(),
            category: match self.filter {
                CategoryFilter::All => "all".to_string(),
                CategoryFilter::Only(category) => category.as_str().to_string(),
            },
            stats: self.stats(),
            error: self.refresh_error.clone(),
        }
    }
}
