//! Thumbnail storage and assignment.

use std::sync::Arc;

use chrono::Utc;
use idioms_cloud::openai::ImageGenerator;
use idioms_cloud::storage::{ImageSource, ObjectStorage};
use idioms_core::thumbnail::{
    content_type_for_extension, draft_key, extension_from_content_type, extension_from_filename,
    thumbnail_key, DEFAULT_EXTENSION,
};
use idioms_db::repositories::IdiomRepo;
use sqlx::PgPool;

use crate::error::PipelineError;

pub struct ThumbnailService {
    pool: PgPool,
    storage: Arc<dyn ObjectStorage>,
    images: Arc<dyn ImageGenerator>,
    source: Arc<dyn ImageSource>,
}

impl ThumbnailService {
    pub fn new(
        pool: PgPool,
        storage: Arc<dyn ObjectStorage>,
        images: Arc<dyn ImageGenerator>,
        source: Arc<dyn ImageSource>,
    ) -> Self {
        Self {
            pool,
            storage,
            images,
            source,
        }
    }

    /// Store an uploaded file as the idiom's thumbnail.
    ///
    /// The extension comes from the file name, then the declared content
    /// type. Returns the stored key, or `None` if the idiom does not exist.
    pub async fn upload(
        &self,
        idiom_id: &str,
        filename: Option<&str>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Option<String>, PipelineError> {
        let extension = filename
            .and_then(extension_from_filename)
            .or_else(|| content_type.and_then(extension_from_content_type))
            .unwrap_or(DEFAULT_EXTENSION);
        self.store_and_assign(idiom_id, extension, bytes).await
    }

    /// Download an image and store it as the idiom's thumbnail.
    pub async fn upload_from_url(
        &self,
        idiom_id: &str,
        url: &str,
    ) -> Result<Option<String>, PipelineError> {
        let image = self.source.fetch(url).await?;
        let extension = image
            .content_type
            .as_deref()
            .and_then(extension_from_content_type)
            .or_else(|| extension_from_filename(url))
            .unwrap_or(DEFAULT_EXTENSION);
        self.store_and_assign(idiom_id, extension, image.bytes).await
    }

    /// Generate an image for `prompt` and store it in the draft slot.
    /// Returns the draft key.
    pub async fn generate_draft(&self, prompt: &str) -> Result<String, PipelineError> {
        let url = self.images.generate_image(prompt).await?;
        let image = self.source.fetch(&url).await?;
        let extension = image
            .content_type
            .as_deref()
            .and_then(extension_from_content_type)
            .unwrap_or(DEFAULT_EXTENSION);

        let key = draft_key(extension);
        self.storage
            .put_object(&key, image.bytes, content_type_for_extension(extension))
            .await?;

        tracing::info!(key = %key, "Draft thumbnail stored");
        Ok(key)
    }

    /// Upload the blob, then point the idiom at it. A failed upload leaves
    /// the previous thumbnail in place.
    async fn store_and_assign(
        &self,
        idiom_id: &str,
        extension: &str,
        bytes: Vec<u8>,
    ) -> Result<Option<String>, PipelineError> {
        if !IdiomRepo::exists(&self.pool, idiom_id).await? {
            tracing::warn!(idiom_id, "Thumbnail for unknown idiom ignored");
            return Ok(None);
        }

        let key = thumbnail_key(idiom_id, extension, Utc::now());
        self.storage
            .put_object(&key, bytes, content_type_for_extension(extension))
            .await?;

        if IdiomRepo::set_thumbnail(&self.pool, idiom_id, &key).await?.is_none() {
            tracing::warn!(idiom_id, key = %key, "Idiom vanished after upload, blob left unassigned");
            return Ok(None);
        }

        tracing::info!(idiom_id, key = %key, "Thumbnail assigned");
        Ok(Some(key))
    }
}
