//! Queue of idioms awaiting generation.

use idioms_core::idiom_id::to_idiom_id;
use idioms_core::types::{IdiomId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// A row from the `idiom_inputs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdiomInput {
    /// Derived from `idiom` with `to_idiom_id`, so it equals the id of the
    /// idiom the input will produce.
    pub id: IdiomId,
    pub idiom: String,
    pub meaning: String,
    pub created_at: Timestamp,
}

/// DTO for enqueuing an idiom. The id is derived on insert.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateIdiomInput {
    #[validate(custom(function = "has_idiom_id"))]
    pub idiom: String,
    #[serde(default)]
    pub meaning: String,
}

/// The text must yield a non-empty id, i.e. contain a letter or digit.
fn has_idiom_id(value: &str) -> Result<(), ValidationError> {
    if to_idiom_id(value).is_empty() {
        return Err(ValidationError::new("idiom_without_id"));
    }
    Ok(())
}
