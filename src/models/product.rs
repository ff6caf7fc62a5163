//! Product record and the request bodies that create or change it.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;

/// Product category. Unrecognised values read back from storage map to `Unknown`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Shoes,
    Perfumes,
    Clothes,
    Accessories,
    #[serde(other)]
    Unknown,
}

impl Category {
    /// The fixed enumeration, in display order.
    pub const ALL: [Category; 4] = [
        Category::Shoes,
        Category::Perfumes,
        Category::Clothes,
        Category::Accessories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Shoes => "shoes",
            Category::Perfumes => "perfumes",
            Category::Clothes => "clothes",
            Category::Accessories => "accessories",
            Category::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Shoes => "Shoes",
            Category::Perfumes => "Perfumes",
            Category::Clothes => "Clothes",
            Category::Accessories => "Accessories",
            Category::Unknown => "Other",
        }
    }

    /// Lenient parse used on read paths.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "shoes" => Category::Shoes,
            "perfumes" => Category::Perfumes,
            "clothes" => Category::Clothes,
            "accessories" => Category::Accessories,
            _ => Category::Unknown,
        }
    }

    /// Strict parse used on write paths.
    pub fn parse_known(s: &str) -> Result<Self, AppError> {
        match Self::parse(s) {
            Category::Unknown => Err(AppError::Validation(format!(
                "Unknown category '{}'. Expected one of: shoes, perfumes, clothes, accessories",
                s.trim()
            ))),
            category => Ok(category),
        }
    }
}

/// Price currency. NGN when not given.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Currency {
    #[default]
    NGN,
    USD,
    EUR,
    GBP,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::NGN => "NGN",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
        }
    }

    /// Format an amount in en-US currency style, e.g. `$1,234.50` or `NGN 85,000.00`.
    pub fn format(&self, amount: f64) -> String {
        let cents = (amount.abs() * 100.0).round() as u64;
        let whole = group_thousands(cents / 100);
        let sign = if amount < 0.0 { "-" } else { "" };
        let number = format!("{}.{:02}", whole, cents % 100);
        match self {
            Currency::USD => format!("{}${}", sign, number),
            Currency::EUR => format!("{}€{}", sign, number),
            Currency::GBP => format!("{}£{}", sign, number),
            Currency::NGN => format!("{}NGN {}", sign, number),
        }
    }
}

impl FromStr for Currency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NGN" => Ok(Currency::NGN),
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            _ => Err(AppError::Validation(format!(
                "Unsupported currency '{}'",
                s.trim()
            ))),
        }
    }
}

fn group_thousands(mut value: u64) -> String {
    let mut groups = Vec::new();
    loop {
        if value < 1000 {
            groups.push(value.to_string());
            break;
        }
        groups.push(format!("{:03}", value % 1000));
        value /= 1000;
    }
    groups.reverse();
    groups.join(",")
}

/// A stored product record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub currency: Currency,
    pub category: Category,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a new product.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub currency: Currency,
    pub category: Category,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_available() -> bool {
    true
}

impl CreateProductRequest {
    /// Check required fields and value ranges.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::Validation("Description is required".to_string()));
        }
        if self.category == Category::Unknown {
            return Err(AppError::Validation("Category is required".to_string()));
        }
        validate_price(self.price)?;
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        if let Some(reviews) = self.reviews {
            validate_reviews(reviews)?;
        }
        Ok(())
    }
}

/// Request body for a partial update. Absent fields are left untouched;
/// optional attributes can be cleared with an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub link: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub rating: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub reviews: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
}

impl UpdateProductRequest {
    /// Check the fields that are present.
    pub fn validate(&self) -> Result<(), AppError> {
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(AppError::Validation("Title cannot be empty".to_string()));
        }
        if matches!(&self.description, Some(d) if d.trim().is_empty()) {
            return Err(AppError::Validation(
                "Description cannot be empty".to_string(),
            ));
        }
        if self.category == Some(Category::Unknown) {
            return Err(AppError::Validation("Unknown category".to_string()));
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(Some(rating)) = self.rating {
            validate_rating(rating)?;
        }
        if let Some(Some(reviews)) = self.reviews {
            validate_reviews(reviews)?;
        }
        Ok(())
    }

    /// Apply this patch on top of an existing record.
    #[cfg(test)]
    pub fn apply_to(&self, existing: &Product) -> Product {
        Product {
            id: existing.id.clone(),
            title: self.title.clone().unwrap_or_else(|| existing.title.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| existing.description.clone()),
            price: self.price.unwrap_or(existing.price),
            currency: self.currency.unwrap_or(existing.currency),
            category: self.category.unwrap_or(existing.category),
            available: self.available.unwrap_or(existing.available),
            link: self.link.clone().unwrap_or_else(|| existing.link.clone()),
            rating: self.rating.unwrap_or(existing.rating),
            reviews: self.reviews.unwrap_or(existing.reviews),
            image_url: self
                .image_url
                .clone()
                .unwrap_or_else(|| existing.image_url.clone()),
            created_at: existing.created_at.clone(),
            updated_at: existing.updated_at.clone(),
        }
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation(
            "Price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

fn validate_rating(rating: f64) -> Result<(), AppError> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(AppError::Validation(
            "Rating must be between 0 and 5".to_string(),
        ));
    }
    Ok(())
}

fn validate_reviews(reviews: i64) -> Result<(), AppError> {
    if reviews < 0 {
        return Err(AppError::Validation(
            "Review count cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// Category filter used by the catalog and the admin listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Parse `all` or a category name.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        if s.trim().eq_ignore_ascii_case("all") || s.trim().is_empty() {
            return Ok(CategoryFilter::All);
        }
        Category::parse_known(s).map(CategoryFilter::Only)
    }

    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }

    /// Keep the items whose category matches, preserving order.
    pub fn apply<T, F>(&self, items: &[T], category_of: F) -> Vec<T>
    where
        T: Clone,
        F: Fn(&T) -> Category,
    {
        items
            .iter()
            .filter(|item| self.matches(category_of(item)))
            .cloned()
            .collect()
    }
}

/// Query string carrying an optional category filter.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

impl CategoryQuery {
    pub fn filter(&self) -> Result<CategoryFilter, AppError> {
        self.category
            .as_deref()
            .map(CategoryFilter::parse)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

/// Summary counters shown on the admin dashboard.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_products: usize,
    pub active_products: usize,
    pub draft_products: usize,
    /// Sum of prices of available products
    pub total_value: f64,
}

impl CatalogStats {
    pub fn from_products(products: &[Product]) -> Self {
        let active_products = products.iter().filter(|p| p.available).count();
        Self {
            total_products: products.len(),
            active_products,
            draft_products: products.len() - active_products,
            total_value: products
                .iter()
                .filter(|p| p.available)
                .map(|p| p.price)
                .sum(),
        }
    }
}
