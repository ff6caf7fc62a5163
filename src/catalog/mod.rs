//! Public catalog read model.
//!
//! Maps stored products into display items and degrades to the bundled catalog when the
//! product table is unavailable. Each fetch is tagged with a sequence number; only the most
//! recently started fetch may update the view, and nothing updates it after deactivation.

mod fallback;

pub use fallback::fallback_products;

use crate::client::ProductBackend;
use crate::errors::AppError;
use crate::models::{
    Category, CatalogItem, CatalogView, CategoryFilter, CategorySummary, Product, Provenance,
};

/// Handle for one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

pub struct CatalogReadModel {
    view: CatalogView,
    issued: u64,
    active: bool,
}

impl Default for CatalogReadModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogReadModel {
    pub fn new() -> Self {
        Self {
            view: CatalogView {
                items: Vec::new(),
                provenance: Provenance::Live,
                error: None,
            },
            issued: 0,
            active: true,
        }
    }

    /// Create the model and run its first fetch.
    pub async fn activate(backend: &dyn ProductBackend) -> Self {
        let mut model = Self::new();
        model.refetch(backend).await;
        model
    }

    pub fn view(&self) -> &CatalogView {
        &self.view
    }

    pub fn into_view(self) -> CatalogView {
        self.view
    }

    /// Start a fetch. Any earlier ticket becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Apply a fetch result. Returns `false` when the result was discarded because a newer
    /// fetch was started or the model was deactivated.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Product>, AppError>,
    ) -> bool {
        if !self.active || ticket.0 != self.issued {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.issued,
                "Discarding superseded catalog fetch"
            );
            return false;
        }

        self.view = match result {
            Ok(products) => CatalogView {
                items: products.iter().map(CatalogItem::from).collect(),
                provenance: Provenance::Live,
                error: None,
            },
            Err(e) => {
                tracing::warn!("Catalog fetch failed, serving bundled catalog: {}", e);
                CatalogView {
                    items: fallback_products().iter().map(CatalogItem::from).collect(),
                    provenance: Provenance::Fallback,
                    error: Some(e.message()),
                }
            }
        };
        true
    }

    /// Fetch the product list and apply it.
    pub async fn refetch(&mut self, backend: &dyn ProductBackend) -> &CatalogView {
        let ticket = self.begin_fetch();
        let result = backend.list_products().await;
        self.complete(ticket, result);
        self.view()
    }

    /// Stop accepting results, e.g. when the page showing the catalog goes away.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Items matching `filter`, in catalog order.
    pub fn filtered(&self, filter: CategoryFilter) -> Vec<CatalogItem> {
        filter.apply(&self.view.items, |item| item.category)
    }

    /// Known categories present in the catalog, in enumeration order.
    pub fn categories(&self) -> Vec<CategorySummary> {
        Category::ALL
            .iter()
            .filter_map(|category| {
                let count = self
                    .view
                    .items
                    .iter()
                    .filter(|item| item.category == *category)
                    .count();
                (count > 0).then(|| CategorySummary {
                    category: *category,
                    label: category.label().to_string(),
                    count,
                })
            })
            .collect()
    }
}
