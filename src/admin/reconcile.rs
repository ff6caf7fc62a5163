//! Out-of-band cleanup of images that no product references.

use std::time::Duration;

use crate::db::Repository;
use crate::errors::AppError;
use crate::storage::ImageStore;

/// Images younger than this may belong to a form submission still in flight.
pub const ORPHAN_GRACE: Duration = Duration::from_secs(10 * 60);

/// Delete stored images older than `grace` that no product points at. Returns removed names.
pub async fn reconcile_orphans(
    repo: &Repository,
    images: &ImageStore,
    grace: Duration,
) -> Result<Vec<String>, AppError> {
    let referenced: Vec<String> = repo
        .referenced_image_urls()
        .await?
        .iter()
        .filter_map(|url| images.name_from_url(url))
        .collect();

    let mut removed = Vec::new();
    for name in images.list_older_than(grace).await? {
        if referenced.contains(&name) {
            continue;
        }
        images.remove(&name).await?;
        removed.push(name);
    }

    if !removed.is_empty() {
        tracing::info!(count = removed.len(), "Removed orphaned product images");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::models::{Category, CreateProductRequest, Currency};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_only_unreferenced_images_are_removed() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("db.sqlite")).await.unwrap();
        let repo = Repository::new(pool);
        let images = ImageStore::open(&dir.path().join("uploads"), "http://shop.test", 1024)
            .await
            .unwrap();

        let kept_url = images.upload(b"kept", "1-kept.png").await.unwrap();
        images.upload(b"orphan", "2-orphan.png").await.unwrap();

        repo.create_product(&CreateProductRequest {
            title: "Watch".to_string(),
            description: "Swiss".to_string(),
            price: 1.0,
            currency: Currency::USD,
            category: Category::Accessories,
            available: true,
            link: None,
            rating: None,
            reviews: None,
            image_url: Some(kept_url),
        })
        .await
        .unwrap();

        let removed = reconcile_orphans(&repo, &images, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(removed, vec!["2-orphan.png"]);
        assert_eq!(
            images.list_older_than(Duration::ZERO).await.unwrap(),
            vec!["1-kept.png"]
        );
    }

    #[tokio::test]
    async fn test_grace_period_spares_fresh_uploads() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("db.sqlite")).await.unwrap();
        let repo = Repository::new(pool);
        let images = ImageStore::open(&dir.path().join("uploads"), "http://shop.test", 1024)
            .await
            .unwrap();
        images.upload(b"fresh", "3-fresh.png").await.unwrap();

        let removed = reconcile_orphans(&repo, &images, ORPHAN_GRACE).await.unwrap();
        assert!(removed.is_empty());
    }
}
