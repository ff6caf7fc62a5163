//! Create/edit product form.
//!
//! The form keeps raw text input so a failed submission can be retried unchanged. Submission
//! uploads a staged image first, then writes the record. If the write fails the fresh upload is
//! removed again.

use crate::client::ProductBackend;
use crate::errors::AppError;
use crate::models::{Category, CreateProductRequest, Currency, Product, UpdateProductRequest};
use crate::storage::{unique_name, validate_image};

/// An image file picked in the form but not yet uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl StagedImage {
    /// Stage a file, rejecting non-images and files over `max_bytes`.
    pub fn new(
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
        max_bytes: usize,
    ) -> Result<Self, AppError> {
        validate_image(content_type.as_deref(), bytes.len(), max_bytes)?;
        Ok(Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        })
    }
}

/// What a submission writes to.
#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    Edit {
        id: String,
        existing_image: Option<String>,
    },
}

impl FormMode {
    pub fn edit(product: &Product) -> Self {
        FormMode::Edit {
            id: product.id.clone(),
            existing_image: product.image_url.clone(),
        }
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    /// Reset the form, refresh the list and switch to it.
    Created(Product),
    /// Go back to the management list.
    Updated(Product),
}

impl FormOutcome {
    pub fn product(&self) -> &Product {
        match self {
            FormOutcome::Created(product) | FormOutcome::Updated(product) => product,
        }
    }
}

/// Validated, typed form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub currency: Currency,
    pub category: Category,
    pub available: bool,
    pub link: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<i64>,
}

impl ProductFields {
    fn into_create(self, image_url: Option<String>) -> CreateProductRequest {
        CreateProductRequest {
            title: self.title,
            description: self.description,
            price: self.price,
            currency: self.currency,
            category: self.category,
            available: self.available,
            link: self.link,
            rating: self.rating,
            reviews: self.reviews,
            image_url,
        }
    }

    /// The form always writes its whole field set; blank optionals clear stored values.
    fn into_update(self, image_url: Option<String>) -> UpdateProductRequest {
        UpdateProductRequest {
            title: Some(self.title),
            description: Some(self.description),
            price: Some(self.price),
            currency: Some(self.currency),
            category: Some(self.category),
            available: Some(self.available),
            link: Some(self.link),
            rating: Some(self.rating),
            reviews: Some(self.reviews),
            image_url: Some(image_url),
        }
    }
}

/// Raw admin form input.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductForm {
    pub title: String,
    pub description: String,
    pub price: String,
    pub currency: String,
    pub category: String,
    pub available: bool,
    pub link: String,
    pub rating: String,
    pub reviews: String,
    pub image: Option<StagedImage>,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            price: String::new(),
            currency: Currency::default().as_str().to_string(),
            category: String::new(),
            available: true,
            link: String::new(),
            rating: String::new(),
            reviews: String::new(),
            image: None,
        }
    }
}

impl ProductForm {
    /// Prefill the form from a stored product for editing.
    pub fn from_product(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            currency: product.currency.as_str().to_string(),
            category: match product.category {
                Category::Unknown => String::new(),
                category => category.as_str().to_string(),
            },
            available: product.available,
            link: product.link.clone().unwrap_or_default(),
            rating: product.rating.map(|r| r.to_string()).unwrap_or_default(),
            reviews: product.reviews.map(|r| r.to_string()).unwrap_or_default(),
            image: None,
        }
    }

    /// Check required fields and parse numbers. Invalid numbers are rejected, not coerced.
    pub fn validate(&self) -> Result<ProductFields, AppError> {
        let title = required(&self.title, "Title")?;
        required(&self.description, "Description")?;
        let price_raw = required(&self.price, "Price")?;
        let category_raw = required(&self.category, "Category")?;

        let price: f64 = parse_number(&price_raw, "Price")?;
        let category = Category::parse_known(&category_raw)?;
        let currency = match self.currency.trim() {
            "" => Currency::default(),
            raw => raw.parse::<Currency>()?,
        };

        let link = optional(&self.link);
        let rating = optional(&self.rating)
            .map(|raw| parse_number::<f64>(&raw, "Rating"))
            .transpose()?;
        let reviews = optional(&self.reviews)
            .map(|raw| parse_number::<i64>(&raw, "Reviews"))
            .transpose()?;

        let fields = ProductFields {
            title,
            description: self.description.clone(),
            price,
            currency,
            category,
            available: self.available,
            link,
            rating,
            reviews,
        };
        // Reuse the record-level range checks.
        fields.clone().into_create(None).validate()?;
        Ok(fields)
    }

    /// Validate, upload the staged image if any, then create or update the record.
    pub async fn submit(
        &self,
        backend: &dyn ProductBackend,
        mode: &FormMode,
    ) -> Result<FormOutcome, AppError> {
        let fields = self.validate()?;

        let uploaded = match &self.image {
            Some(image) => {
                let name = unique_name(&image.file_name);
                let url = backend.upload_image(&image.bytes, &name).await?;
                Some((name, url))
            }
            None => None,
        };

        let image_url = match (&uploaded, mode) {
            (Some((_, url)), _) => Some(url.clone()),
            (None, FormMode::Edit { existing_image, .. }) => existing_image.clone(),
            (None, FormMode::Create) => None,
        };

        let result = match mode {
            FormMode::Create => backend
                .create_product(&fields.into_create(image_url))
                .await
                .map(FormOutcome::Created),
            FormMode::Edit { id, .. } => backend
                .update_product(id, &fields.into_update(image_url))
                .await
                .map(FormOutcome::Updated),
        };

        if let (Err(e), Some((name, _))) = (&result, &uploaded) {
            tracing::warn!(
                name = %name,
                "Product write failed after upload, removing image: {}",
                e
            );
            if let Err(cleanup) = backend.remove_image(name).await {
                tracing::warn!(name = %name, "Could not remove orphaned image: {}", cleanup);
            }
        }

        result
    }
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_number<T: std::str::FromStr>(raw: &str, field: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("{} must be a valid number", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeBackend;

    fn filled() -> ProductForm {
        ProductForm {
            title: "Test Shoe".to_string(),
            description: "Light\nand fast".to_string(),
            price: "10000".to_string(),
            currency: "NGN".to_string(),
            category: "shoes".to_string(),
            ..ProductForm::default()
        }
    }

    fn png() -> StagedImage {
        StagedImage::new("shoe.png", Some("image/png".to_string()), vec![1, 2, 3], 1024).unwrap()
    }

    #[test]
    fn test_required_fields() {
        for field in ["title", "description", "price", "category"] {
            let mut form = filled();
            match field {
                "title" => form.title = " ".to_string(),
                "description" => form.description.clear(),
                "price" => form.price.clear(),
                _ => form.category.clear(),
            }
            assert!(
                matches!(form.validate(), Err(AppError::Validation(_))),
                "{} should be required",
                field
            );
        }
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let mut form = filled();
        form.price = "ten".to_string();
        assert_eq!(
            form.validate().unwrap_err(),
            AppError::Validation("Price must be a valid number".to_string())
        );

        let mut form = filled();
        form.rating = "great".to_string();
        assert!(form.validate().is_err());

        let mut form = filled();
        form.reviews = "1.5".to_string();
        assert!(form.validate().is_err());

        let mut form = filled();
        form.rating = "7".to_string();
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_validate_parses_fields() {
        let mut form = filled();
        form.currency = String::new();
        form.rating = "4.5".to_string();
        form.reviews = "12".to_string();
        form.link = "  ".to_string();

        let fields = form.validate().unwrap();
        assert_eq!(fields.price, 10000.0);
        assert_eq!(fields.currency, Currency::NGN);
        assert_eq!(fields.category, Category::Shoes);
        assert_eq!(fields.rating, Some(4.5));
        assert_eq!(fields.reviews, Some(12));
        assert_eq!(fields.link, None);
        assert_eq!(fields.description, "Light\nand fast");
    }

    #[test]
    fn test_staged_image_validation() {
        assert!(StagedImage::new("a.txt", Some("text/plain".into()), vec![1], 10).is_err());
        assert!(StagedImage::new("a.png", Some("image/png".into()), vec![0; 11], 10).is_err());
    }

    #[tokio::test]
    async fn test_create_without_image() {
        let backend = FakeBackend::default();
        let outcome = filled().submit(&backend, &FormMode::Create).await.unwrap();

        let FormOutcome::Created(product) = outcome else {
            panic!("expected a create");
        };
        assert!(!product.id.is_empty());
        assert_eq!(product.image_url, None);
        assert!(product.available);
        assert_eq!(backend.calls(), vec!["create"]);

        let listed = backend.list_products().await.unwrap();
        assert_eq!(listed[0].id, product.id);
    }

    #[tokio::test]
    async fn test_upload_happens_before_create() {
        let backend = FakeBackend::default();
        let mut form = filled();
        form.image = Some(png());

        let outcome = form.submit(&backend, &FormMode::Create).await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("upload:"));
        assert!(calls[0].ends_with("-shoe.png"));
        assert_eq!(calls[1], "create");

        let name = calls[0].trim_start_matches("upload:");
        assert_eq!(
            outcome.product().image_url.as_deref(),
            Some(format!("https://cdn.test/product-images/{}", name).as_str())
        );
    }

    #[tokio::test]
    async fn test_failed_create_removes_fresh_upload() {
        let backend = FakeBackend::default();
        *backend.fail_create.lock().unwrap() = true;
        let mut form = filled();
        form.image = Some(png());

        let err = form.submit(&backend, &FormMode::Create).await.unwrap_err();
        assert!(matches!(err, AppError::Repository(_)));
        assert!(backend.images().is_empty());

        let calls = backend.calls();
        assert!(calls[0].starts_with("upload:"));
        assert_eq!(calls[1], "create");
        assert!(calls[2].starts_with("remove:"));

        // Input stays put for a retry.
        assert_eq!(form.title, "Test Shoe");
        assert!(form.image.is_some());
    }

    #[tokio::test]
    async fn test_failed_upload_skips_write() {
        let backend = FakeBackend::default();
        *backend.fail_upload.lock().unwrap() = true;
        let mut form = filled();
        form.image = Some(png());

        let err = form.submit(&backend, &FormMode::Create).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_keeps_existing_image_without_new_file() {
        let backend = FakeBackend::default();
        let mut create = filled();
        create.image = Some(png());
        let created = create
            .submit(&backend, &FormMode::Create)
            .await
            .unwrap()
            .product()
            .clone();

        let mut form = ProductForm::from_product(&created);
        form.price = "12500".to_string();
        let outcome = form
            .submit(&backend, &FormMode::edit(&created))
            .await
            .unwrap();

        let FormOutcome::Updated(updated) = outcome else {
            panic!("expected an update");
        };
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.price, 12500.0);
        assert_eq!(updated.image_url, created.image_url);
        assert_eq!(updated.title, created.title);
    }

    #[tokio::test]
    async fn test_edit_missing_product_is_not_found() {
        let backend = FakeBackend::default();
        let mode = FormMode::Edit {
            id: "missing".to_string(),
            existing_image: None,
        };
        let err = filled().submit(&backend, &mode).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_blank_form_defaults() {
        let form = ProductForm::default();
        assert_eq!(form.currency, "NGN");
        assert!(form.available);
        assert!(form.image.is_none());
        assert!(matches!(form.validate(), Err(AppError::Validation(_))));
    }
}
