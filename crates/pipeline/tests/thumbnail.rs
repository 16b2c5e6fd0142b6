//! Integration tests for thumbnail storage and assignment.

use std::sync::Arc;

use assert_matches::assert_matches;
use idioms_cloud::openai::{ImageGenerator, OpenAiError};
use idioms_cloud::storage::{FetchedImage, ImageSource, InMemoryStorage, ObjectStorage, StorageError};
use idioms_db::models::idiom::CreateIdiom;
use idioms_db::repositories::IdiomRepo;
use idioms_pipeline::thumbnail::ThumbnailService;
use idioms_pipeline::PipelineError;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct FixedImage;

#[async_trait::async_trait]
impl ImageGenerator for FixedImage {
    async fn generate_image(&self, _prompt: &str) -> Result<String, OpenAiError> {
        Ok("https://images.test/generated".to_string())
    }
}

struct JpegSource;

#[async_trait::async_trait]
impl ImageSource for JpegSource {
    async fn fetch(&self, _url: &str) -> Result<FetchedImage, StorageError> {
        Ok(FetchedImage {
            bytes: vec![0xFF, 0xD8, 0xFF],
            content_type: Some("image/jpeg".to_string()),
        })
    }
}

struct BrokenStorage;

#[async_trait::async_trait]
impl ObjectStorage for BrokenStorage {
    async fn put_object(&self, key: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<(), StorageError> {
        Err(StorageError::Upload {
            key: key.to_string(),
            message: "bucket unavailable".to_string(),
        })
    }
}

fn service(pool: &PgPool, storage: Arc<dyn ObjectStorage>) -> ThumbnailService {
    ThumbnailService::new(pool.clone(), storage, Arc::new(FixedImage), Arc::new(JpegSource))
}

async fn seed(pool: &PgPool) {
    IdiomRepo::create_with_examples(
        pool,
        &CreateIdiom {
            id: "hit-the-hay".into(),
            idiom: "Hit the hay".into(),
            meaning_brief: "go to bed".into(),
            meaning_full: "go to bed to sleep".into(),
            description: None,
            published_at: None,
            examples: vec![],
        },
    )
    .await
    .unwrap()
    .unwrap();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upload_stores_and_assigns(pool: PgPool) {
    seed(&pool).await;
    let storage = Arc::new(InMemoryStorage::new());

    let key = service(&pool, storage.clone())
        .upload("hit-the-hay", Some("cover.PNG"), None, vec![1, 2, 3])
        .await
        .unwrap()
        .unwrap();
    assert!(key.ends_with("/hit-the-hay.png"));

    let stored = storage.get(&key).await.unwrap();
    assert_eq!(stored.content_type, "image/png");
    let idiom = IdiomRepo::find_by_id(&pool, "hit-the-hay").await.unwrap().unwrap();
    assert_eq!(idiom.thumbnail.as_deref(), Some(key.as_str()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upload_for_unknown_idiom_stores_nothing(pool: PgPool) {
    let storage = Arc::new(InMemoryStorage::new());

    let key = service(&pool, storage.clone())
        .upload("missing", Some("cover.png"), None, vec![1])
        .await
        .unwrap();
    assert!(key.is_none());
    assert!(storage.keys().await.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_upload_leaves_thumbnail_unassigned(pool: PgPool) {
    seed(&pool).await;

    let result = service(&pool, Arc::new(BrokenStorage))
        .upload("hit-the-hay", Some("cover.png"), None, vec![1])
        .await;
    assert_matches!(result, Err(PipelineError::Storage(StorageError::Upload { .. })));

    let idiom = IdiomRepo::find_by_id(&pool, "hit-the-hay").await.unwrap().unwrap();
    assert!(idiom.thumbnail.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_upload_keeps_previous_thumbnail(pool: PgPool) {
    seed(&pool).await;
    let storage = Arc::new(InMemoryStorage::new());
    let previous = service(&pool, storage)
        .upload("hit-the-hay", Some("old.png"), None, vec![1])
        .await
        .unwrap()
        .unwrap();

    let result = service(&pool, Arc::new(BrokenStorage))
        .upload("hit-the-hay", Some("new.webp"), None, vec![2])
        .await;
    assert_matches!(result, Err(PipelineError::Storage(StorageError::Upload { .. })));

    let idiom = IdiomRepo::find_by_id(&pool, "hit-the-hay").await.unwrap().unwrap();
    assert_eq!(idiom.thumbnail.as_deref(), Some(previous.as_str()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upload_from_url_uses_response_content_type(pool: PgPool) {
    seed(&pool).await;
    let storage = Arc::new(InMemoryStorage::new());

    let key = service(&pool, storage.clone())
        .upload_from_url("hit-the-hay", "https://images.test/some-image")
        .await
        .unwrap()
        .unwrap();
    assert!(key.ends_with("/hit-the-hay.jpg"));
    assert_eq!(storage.get(&key).await.unwrap().bytes, vec![0xFF, 0xD8, 0xFF]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_generate_draft_overwrites_draft_slot(pool: PgPool) {
    let storage = Arc::new(InMemoryStorage::new());
    let thumbnails = service(&pool, storage.clone());

    assert_eq!(thumbnails.generate_draft("a sleepy farmer").await.unwrap(), "drafts/output.jpg");
    assert_eq!(thumbnails.generate_draft("a sleepy cat").await.unwrap(), "drafts/output.jpg");
    assert_eq!(storage.keys().await, vec!["drafts/output.jpg".to_string()]);
}
