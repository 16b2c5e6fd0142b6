//! Idiom entity model and DTOs.

use idioms_core::pagination::Keyset;
use idioms_core::types::{IdiomId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `idioms` table, optionally enriched with its examples.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Idiom {
    pub id: IdiomId,
    pub idiom: String,
    pub meaning_brief: String,
    pub meaning_full: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub thumbnail_prompt: Option<String>,
    pub created_at: Timestamp,
    pub published_at: Option<Timestamp>,
    /// Insertion-ordered surrogate key, used to break ordering ties.
    pub num_id: i64,
    /// Example sentences in insertion order. Only populated by lookups that
    /// explicitly load them.
    #[sqlx(skip)]
    pub examples: Vec<String>,
}

impl Keyset for Idiom {
    fn idiom_text(&self) -> &str {
        &self.idiom
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// DTO for inserting a fully generated idiom together with its examples.
#[derive(Debug, Clone)]
pub struct CreateIdiom {
    pub id: IdiomId,
    pub idiom: String,
    pub meaning_brief: String,
    pub meaning_full: String,
    pub description: Option<String>,
    pub published_at: Option<Timestamp>,
    pub examples: Vec<String>,
}

/// DTO for replacing an idiom's meanings and example sentences.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceIdiomExamples {
    pub meaning_brief: String,
    pub meaning_full: String,
    #[serde(default)]
    pub examples: Vec<String>,
}
