//! Response payload types for the idiom endpoints.
//!
//! Every content endpoint answers `200 OK`. When the operation fails the
//! payload field is `null` (or the cursor tokens are), never an HTTP error
//! status. [`or_null`] is the single place where that degradation happens.

use idioms_core::pagination::cursor::PageTokens;
use idioms_db::models::idiom::Idiom;
use serde::Serialize;

use crate::error::AppResult;

/// Log a failed operation and degrade it to an absent payload.
pub fn or_null<T>(result: AppResult<T>, operation: &'static str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(operation, error = %e, "Request failed, answering with empty payload");
            None
        }
    }
}

/// Tokens for the pages around a listing page.
#[derive(Debug, Default, Serialize)]
pub struct PageCursor {
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl From<PageTokens> for PageCursor {
    fn from(tokens: PageTokens) -> Self {
        Self {
            next: Some(tokens.next),
            previous: Some(tokens.previous),
        }
    }
}

/// `{ idioms, cursor: { next, previous } }`
#[derive(Debug, Serialize)]
pub struct IdiomPage {
    pub idioms: Option<Vec<Idiom>>,
    pub cursor: PageCursor,
}

impl IdiomPage {
    pub fn empty() -> Self {
        Self {
            idioms: None,
            cursor: PageCursor::default(),
        }
    }
}

/// `{ idioms }`
#[derive(Debug, Serialize)]
pub struct IdiomList {
    pub idioms: Option<Vec<Idiom>>,
}

/// `{ idiom }`
#[derive(Debug, Serialize)]
pub struct IdiomResponse {
    pub idiom: Option<Idiom>,
}

/// `{ rows }`
#[derive(Debug, Serialize)]
pub struct InsertedRows {
    pub rows: Option<u64>,
}

/// `{ idiomId, thumbnail }`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailResponse {
    pub idiom_id: String,
    pub thumbnail: Option<String>,
}

/// `{ idiomId, thumbnailPrompt }`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailPromptResponse {
    pub idiom_id: String,
    pub thumbnail_prompt: Option<String>,
}

/// `{ image }`
#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub image: Option<String>,
}

/// `{ id, description }`
#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub id: String,
    pub description: Option<String>,
}
