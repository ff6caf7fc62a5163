//! Public catalog view-model.

use serde::Serialize;

use super::{Category, Currency, Product};

/// Image shown when a product has none.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.png";
/// Link used when a product has none.
pub const PLACEHOLDER_LINK: &str = "#";

/// Where the items of a catalog view came from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Fallback,
}

/// A product shaped for display.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    /// Kept verbatim, embedded line breaks included
    pub description: String,
    pub price: f64,
    pub currency: Currency,
    pub display_price: String,
    pub category: Category,
    pub category_label: String,
    pub image: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<i64>,
    pub available: bool,
}

impl From<&Product> for CatalogItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price,
            currency: product.currency,
            display_price: product.currency.format(product.price),
            category: product.category,
            category_label: product.category.label().to_string(),
            image: non_empty(&product.image_url).unwrap_or(PLACEHOLDER_IMAGE).to_string(),
            link: non_empty(&product.link).unwrap_or(PLACEHOLDER_LINK).to_string(),
            rating: product.rating,
            reviews: product.reviews,
            available: product.available,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// The catalog as currently displayed.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub items: Vec<CatalogItem>,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A category present in the catalog.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: Category,
    pub label: String,
    pub count: usize,
}
