//! Product table repository.
//!
//! Uses prepared statements; every write returns the stored record.

use chrono::{SecondsFormat, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::errors::AppError;
use crate::models::{Category, CreateProductRequest, Currency, Product, UpdateProductRequest};

const PRODUCT_COLUMNS: &str = "id, title, description, price, currency, category, available, \
     link, rating, reviews, image_url, created_at, updated_at";

/// Current time as a fixed-width RFC 3339 string, so text ordering matches time ordering.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Database repository for product records.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all products, newest first.
    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM products ORDER BY created_at DESC, seq DESC",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(product_from_row).collect())
    }

    /// Get a product by ID.
    pub async fn get_product(&self, id: &str) -> Result<Option<Product>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM products WHERE id = ?",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(product_from_row))
    }

    /// Create a new product. The identifier and timestamps are assigned here.
    pub async fn create_product(
        &self,
        request: &CreateProductRequest,
    ) -> Result<Product, AppError> {
        request.validate()?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = now_timestamp();

        sqlx::query(
            "INSERT INTO products (id, title, description, price, currency, category, available, link, rating, reviews, image_url, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.price)
        .bind(request.currency.as_str())
        .bind(request.category.as_str())
        .bind(request.available as i32)
        .bind(&request.link)
        .bind(request.rating)
        .bind(request.reviews)
        .bind(&request.image_url)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        tracing::info!(product_id = %id, title = %request.title, "Product created");

        Ok(Product {
            id,
            title: request.title.clone(),
            description: request.description.clone(),
            price: request.price,
            currency: request.currency,
            category: request.category,
            available: request.available,
            link: request.link.clone(),
            rating: request.rating,
            reviews: request.reviews,
            image_url: request.image_url.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Partially update a product. Only the columns present in the request are written,
    /// in a single statement, so concurrent patches of different fields do not overwrite
    /// each other.
    pub async fn update_product(
        &self,
        id: &str,
        request: &UpdateProductRequest,
    ) -> Result<Product, AppError> {
        request.validate()?;

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE products SET updated_at = ");
        query.push_bind(now_timestamp());
        if let Some(title) = &request.title {
            query.push(", title = ").push_bind(title.clone());
        }
        if let Some(description) = &request.description {
            query.push(", description = ").push_bind(description.clone());
        }
        if let Some(price) = request.price {
            query.push(", price = ").push_bind(price);
        }
        if let Some(currency) = request.currency {
            query.push(", currency = ").push_bind(currency.as_str());
        }
        if let Some(category) = request.category {
            query.push(", category = ").push_bind(category.as_str());
        }
        if let Some(available) = request.available {
            query.push(", available = ").push_bind(available as i32);
        }
        if let Some(link) = &request.link {
            query.push(", link = ").push_bind(link.clone());
        }
        if let Some(rating) = request.rating {
            query.push(", rating = ").push_bind(rating);
        }
        if let Some(reviews) = request.reviews {
            query.push(", reviews = ").push_bind(reviews);
        }
        if let Some(image_url) = &request.image_url {
            query.push(", image_url = ").push_bind(image_url.clone());
        }
        query.push(" WHERE id = ").push_bind(id.to_string());

        let result = query.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Product {} not found", id)));
        }

        tracing::info!(product_id = %id, "Product updated");
        self.get_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
    }

    /// Delete a product.
    pub async fn delete_product(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Product {} not found", id)));
        }

        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Image URLs referenced by any product.
    pub async fn referenced_image_urls(&self) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT image_url FROM products WHERE image_url IS NOT NULL")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("image_url")).collect())
    }
}

fn product_from_row(row: &sqlx::sqlite::SqliteRow) -> Product {
    let available: i32 = row.get("available");
    let currency: String = row.get("currency");
    let category: String = row.get("category");
    Product {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        price: row.get("price"),
        currency: currency.parse::<Currency>().unwrap_or_default(),
        category: Category::parse(&category),
        available: available != 0,
        link: row.get("link"),
        rating: row.get("rating"),
        reviews: row.get("reviews"),
        image_url: row.get("image_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("test.sqlite")).await.unwrap();
        (Repository::new(pool), dir)
    }

    fn request(title: &str, category: Category) -> CreateProductRequest {
        CreateProductRequest {
            title: title.to_string(),
            description: "Line one\nLine two".to_string(),
            price: 10000.0,
            currency: Currency::NGN,
            category,
            available: true,
            link: Some("https://example.com/item".to_string()),
            rating: Some(4.5),
            reviews: Some(12),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let (repo, _dir) = repo().await;
        let created = repo
            .create_product(&request("Test Shoe", Category::Shoes))
            .await
            .unwrap();
        assert!(!created.id.is_empty());

        let fetched = repo.get_product(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.description, "Line one\nLine two");
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (repo, _dir) = repo().await;
        let first = repo
            .create_product(&request("First", Category::Shoes))
            .await
            .unwrap();
        let second = repo
            .create_product(&request("Second", Category::Perfumes))
            .await
            .unwrap();

        let listed = repo.list_products().await.unwrap();
        let ids: Vec<_> = listed.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_partial_update_leaves_other_fields() {
        let (repo, _dir) = repo().await;
        let created = repo
            .create_product(&request("Watch", Category::Accessories))
            .await
            .unwrap();

        let patch = UpdateProductRequest {
            price: Some(25000.0),
            ..Default::default()
        };
        repo.update_product(&created.id, &patch).await.unwrap();

        let fetched = repo.get_product(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.price, 25000.0);
        assert_eq!(fetched.title, created.title);
        assert_eq!(fetched.description, created.description);
        assert_eq!(fetched.link, created.link);
        assert_eq!(fetched.rating, created.rating);
        assert_eq!(fetched.reviews, created.reviews);
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_patches_of_different_fields_both_stick() {
        let (repo, _dir) = repo().await;
        for round in 0..20 {
            let created = repo
                .create_product(&request(&format!("Item {}", round), Category::Accessories))
                .await
                .unwrap();

            let price_repo = repo.clone();
            let price_id = created.id.clone();
            let price = tokio::spawn(async move {
                let patch = UpdateProductRequest {
                    price: Some(99.0),
                    ..Default::default()
                };
                price_repo.update_product(&price_id, &patch).await
            });
            let title_repo = repo.clone();
            let title_id = created.id.clone();
            let title = tokio::spawn(async move {
                let patch = UpdateProductRequest {
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                };
                title_repo.update_product(&title_id, &patch).await
            });
            price.await.unwrap().unwrap();
            title.await.unwrap().unwrap();

            let fetched = repo.get_product(&created.id).await.unwrap().unwrap();
            assert_eq!(fetched.price, 99.0, "round {}", round);
            assert_eq!(fetched.title, "Renamed", "round {}", round);
            assert_eq!(fetched.description, created.description);
        }
    }

    #[tokio::test]
    async fn test_patch_null_clears_optional_columns() {
        let (repo, _dir) = repo().await;
        let created = repo
            .create_product(&request("Bag", Category::Accessories))
            .await
            .unwrap();

        let patch = UpdateProductRequest {
            link: Some(None),
            rating: Some(None),
            ..Default::default()
        };
        let updated = repo.update_product(&created.id, &patch).await.unwrap();
        assert_eq!(updated.link, None);
        assert_eq!(updated.rating, None);
        assert_eq!(updated.reviews, Some(12));
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_missing_ids() {
        let (repo, _dir) = repo().await;
        assert!(repo.get_product("missing").await.unwrap().is_none());
        assert!(matches!(
            repo.update_product("missing", &UpdateProductRequest::default())
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repo.delete_product("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_from_listing() {
        let (repo, _dir) = repo().await;
        let keep = repo
            .create_product(&request("Keep", Category::Clothes))
            .await
            .unwrap();
        let gone = repo
            .create_product(&request("Gone", Category::Clothes))
            .await
            .unwrap();

        repo.delete_product(&gone.id).await.unwrap();

        let listed = repo.list_products().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep.id);
    }

    #[tokio::test]
    async fn test_invalid_create_is_rejected() {
        let (repo, _dir) = repo().await;
        let mut bad = request("", Category::Shoes);
        bad.title = String::new();
        assert!(matches!(
            repo.create_product(&bad).await,
            Err(AppError::Validation(_))
        ));
        assert!(repo.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_stored_category_reads_as_unknown() {
        let (repo, _dir) = repo().await;
        let created = repo
            .create_product(&request("Odd", Category::Shoes))
            .await
            .unwrap();
        sqlx::query("UPDATE products SET category = 'gadgets', currency = 'XYZ' WHERE id = ?")
            .bind(&created.id)
            .execute(&repo.pool)
            .await
            .unwrap();

        let fetched = repo.get_product(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.category, Category::Unknown);
        assert_eq!(fetched.currency, Currency::NGN);
    }
}
