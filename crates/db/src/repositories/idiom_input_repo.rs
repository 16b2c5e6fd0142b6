//! Repository for the `idiom_inputs` queue table.

use idioms_core::idiom_id::to_idiom_id;
use sqlx::PgPool;

use crate::models::idiom_input::{CreateIdiomInput, IdiomInput};

/// Column list for the `idiom_inputs` table.
const COLUMNS: &str = "id, idiom, meaning, created_at";

pub struct IdiomInputRepo;

impl IdiomInputRepo {
    /// Enqueue inputs, deriving each id from the idiom text.
    ///
    /// Inputs whose id is already queued (or repeated within `inputs`) are
    /// skipped. Returns the number of rows actually inserted.
    pub async fn create_many(
        pool: &PgPool,
        inputs: &[CreateIdiomInput],
    ) -> Result<u64, sqlx::Error> {
        if inputs.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = inputs.iter().map(|i| to_idiom_id(&i.idiom)).collect();
        let idioms: Vec<&str> = inputs.iter().map(|i| i.idiom.trim()).collect();
        let meanings: Vec<&str> = inputs.iter().map(|i| i.meaning.trim()).collect();

        let result = sqlx::query(
            "INSERT INTO idiom_inputs (id, idiom, meaning) \
             SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[]) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&ids)
        .bind(&idioms)
        .bind(&meanings)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// The oldest queued input, if any.
    pub async fn oldest(pool: &PgPool) -> Result<Option<IdiomInput>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM idiom_inputs ORDER BY created_at ASC, id ASC LIMIT 1"
        );
        sqlx::query_as::<_, IdiomInput>(&query)
            .fetch_optional(pool)
            .await
    }

    /// Remove an input from the queue. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM idiom_inputs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*)::BIGINT FROM idiom_inputs")
            .fetch_one(pool)
            .await
    }
}
