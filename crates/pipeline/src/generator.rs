//! Idiom content generation.
//!
//! The external API call always happens outside any database transaction;
//! only the final write is atomic.

use std::sync::Arc;

use chrono::Utc;
use idioms_cloud::openai::TextGenerator;
use idioms_core::generation::{
    description_prompt, examples_prompt, new_idiom_prompt, parse_generated_description,
    parse_generated_idiom,
};
use idioms_core::types::IdiomId;
use idioms_db::models::idiom::{CreateIdiom, Idiom, ReplaceIdiomExamples};
use idioms_db::models::idiom_input::IdiomInput;
use idioms_db::repositories::{IdiomInputRepo, IdiomRepo};
use sqlx::PgPool;

use crate::error::PipelineError;

/// What one queue tick did with the oldest input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueOutcome {
    /// Nothing was queued.
    Empty,
    /// A new idiom was generated and published; the input was removed.
    Generated(IdiomId),
    /// The idiom already existed; the input was removed.
    Duplicate(IdiomId),
    /// Generation failed permanently; the input was removed.
    Discarded { input_id: IdiomId, reason: String },
}

pub struct IdiomGenerator {
    pool: PgPool,
    text: Arc<dyn TextGenerator>,
}

impl IdiomGenerator {
    pub fn new(pool: PgPool, text: Arc<dyn TextGenerator>) -> Self {
        Self { pool, text }
    }

    /// Generate, validate and persist a new idiom for `input`.
    ///
    /// The idiom is published immediately. Fails with
    /// [`PipelineError::Duplicate`] when the id already exists, either before
    /// the API call or at insert time.
    pub async fn generate_from_input(&self, input: &IdiomInput) -> Result<Idiom, PipelineError> {
        if IdiomRepo::exists(&self.pool, &input.id).await? {
            return Err(PipelineError::Duplicate(input.id.clone()));
        }

        let content = self
            .text
            .complete(&new_idiom_prompt(&input.idiom, &input.meaning))
            .await?;
        let generated = parse_generated_idiom(&content, true)?;

        let create = CreateIdiom {
            id: input.id.clone(),
            idiom: input.idiom.trim().to_string(),
            meaning_brief: generated.meaning_brief,
            meaning_full: generated.meaning_full,
            description: generated.description,
            published_at: Some(Utc::now()),
            examples: generated.examples,
        };

        IdiomRepo::create_with_examples(&self.pool, &create)
            .await?
            .ok_or_else(|| PipelineError::Duplicate(input.id.clone()))
    }

    /// Process the oldest queued input.
    ///
    /// The input is deleted on success, on a duplicate and on any permanent
    /// failure. Transient failures are returned and leave the input queued.
    pub async fn process_next_input(&self) -> Result<QueueOutcome, PipelineError> {
        let Some(input) = IdiomInputRepo::oldest(&self.pool).await? else {
            return Ok(QueueOutcome::Empty);
        };

        let outcome = match self.generate_from_input(&input).await {
            Ok(idiom) => {
                tracing::info!(idiom_id = %idiom.id, examples = idiom.examples.len(), "Idiom generated");
                QueueOutcome::Generated(idiom.id)
            }
            Err(PipelineError::Duplicate(id)) => {
                tracing::info!(idiom_id = %id, "Idiom already exists, discarding input");
                QueueOutcome::Duplicate(id)
            }
            Err(e) if e.is_permanent() => {
                tracing::warn!(input_id = %input.id, error = %e, "Discarding input after permanent failure");
                QueueOutcome::Discarded {
                    input_id: input.id.clone(),
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                tracing::warn!(input_id = %input.id, error = %e, "Generation failed, input kept for retry");
                return Err(e);
            }
        };

        IdiomInputRepo::delete(&self.pool, &input.id).await?;
        Ok(outcome)
    }

    /// Regenerate meanings and examples of an existing idiom.
    ///
    /// `meaning_hint` steers the generation; the current brief meaning is used
    /// when absent.
    pub async fn regenerate_examples(
        &self,
        id: &str,
        meaning_hint: Option<&str>,
    ) -> Result<Idiom, PipelineError> {
        let idiom = IdiomRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(id.to_string()))?;

        let hint = meaning_hint
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(&idiom.meaning_brief);
        let content = self.text.complete(&examples_prompt(&idiom.idiom, hint)).await?;
        let generated = parse_generated_idiom(&content, false)?;

        let replacement = ReplaceIdiomExamples {
            meaning_brief: generated.meaning_brief,
            meaning_full: generated.meaning_full,
            examples: generated.examples,
        };
        let updated = IdiomRepo::replace_examples(&self.pool, id, &replacement)
            .await?
            .ok_or_else(|| PipelineError::NotFound(id.to_string()))?;

        tracing::info!(idiom_id = %id, examples = updated.examples.len(), "Examples regenerated");
        Ok(updated)
    }

    /// Generate a situational description and publish the idiom.
    pub async fn generate_description(&self, id: &str) -> Result<Idiom, PipelineError> {
        let idiom = IdiomRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(id.to_string()))?;

        let content = self
            .text
            .complete(&description_prompt(&idiom.idiom, &idiom.meaning_brief))
            .await?;
        let description = parse_generated_description(&content)?;

        let updated = IdiomRepo::update_description(&self.pool, id, &description, Utc::now())
            .await?
            .ok_or_else(|| PipelineError::NotFound(id.to_string()))?;

        tracing::info!(idiom_id = %id, "Description generated");
        Ok(updated)
    }
}
