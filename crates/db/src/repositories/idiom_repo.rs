//! Repository for the `idioms` and `idiom_examples` tables.
//!
//! Listing and search share one keyset-paginated query shape: an inner
//! query scans from the cursor boundary in the resolved inner direction and
//! applies the limit, and an outer query re-sorts that bounded set in the
//! caller's requested direction.

use idioms_core::pagination::filter::QueryFilter;
use idioms_core::pagination::BoundaryValue;
use idioms_core::search::contains_pattern;
use idioms_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::idiom::{CreateIdiom, Idiom, ReplaceIdiomExamples};

/// Column list for the `idioms` table.
const COLUMNS: &str = "id, idiom, meaning_brief, meaning_full, description, \
    thumbnail, thumbnail_prompt, created_at, published_at, num_id";

/// Publish time with creation time as fallback.
const PUBLISHED_OR_CREATED: &str = "COALESCE(published_at, created_at)";

/// Provides paginated listing, lookups and transactional writes for idioms.
pub struct IdiomRepo;

impl IdiomRepo {
    /// Execute a resolved pagination plan.
    ///
    /// Rows come back in the filter's outer order regardless of whether the
    /// page was reached through a "next" or a "previous" cursor.
    pub async fn list_page(
        pool: &PgPool,
        filter: &QueryFilter,
        thumbnail_only: bool,
    ) -> Result<Vec<Idiom>, sqlx::Error> {
        let (query, bind_values) = build_page_query(filter, thumbnail_only);
        bind_idiom_values(sqlx::query_as::<_, Idiom>(&query), &bind_values)
            .fetch_all(pool)
            .await
    }

    /// Find an idiom by id without its examples.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Idiom>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM idioms WHERE id = $1");
        sqlx::query_as::<_, Idiom>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an idiom by id, enriched with its examples in insertion order.
    pub async fn find_with_examples(
        pool: &PgPool,
        id: &str,
    ) -> Result<Option<Idiom>, sqlx::Error> {
        let Some(mut idiom) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        idiom.examples = Self::examples(pool, id).await?;
        Ok(Some(idiom))
    }

    /// Example sentences of an idiom in insertion order.
    pub async fn examples(pool: &PgPool, id: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT expression FROM idiom_examples WHERE idiom_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    pub async fn exists(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM idioms WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Thumbnail-bearing idioms adjacent to `id` in publish order: up to
    /// `per_side` later and `per_side` earlier, merged newest first.
    ///
    /// Returns an empty list for an unknown id.
    pub async fn related(
        pool: &PgPool,
        id: &str,
        per_side: i64,
    ) -> Result<Vec<Idiom>, sqlx::Error> {
        let query = format!(
            "WITH target AS ( \
                SELECT {PUBLISHED_OR_CREATED} AS at FROM idioms WHERE id = $1 \
             ) \
             SELECT {COLUMNS} FROM ( \
                (SELECT {COLUMNS} FROM idioms, target \
                 WHERE thumbnail IS NOT NULL AND id <> $1 AND {PUBLISHED_OR_CREATED} > target.at \
                 ORDER BY {PUBLISHED_OR_CREATED} ASC, num_id ASC LIMIT $2) \
                UNION ALL \
                (SELECT {COLUMNS} FROM idioms, target \
                 WHERE thumbnail IS NOT NULL AND id <> $1 AND {PUBLISHED_OR_CREATED} < target.at \
                 ORDER BY {PUBLISHED_OR_CREATED} DESC, num_id DESC LIMIT $2) \
             ) AS related \
             ORDER BY {PUBLISHED_OR_CREATED} DESC, num_id DESC"
        );
        sqlx::query_as::<_, Idiom>(&query)
            .bind(id)
            .bind(per_side)
            .fetch_all(pool)
            .await
    }

    /// The latest `count` idioms that have a thumbnail.
    pub async fn featured(pool: &PgPool, count: i64) -> Result<Vec<Idiom>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM idioms \
             WHERE thumbnail IS NOT NULL \
             ORDER BY {PUBLISHED_OR_CREATED} DESC, num_id DESC \
             LIMIT $1"
        );
        sqlx::query_as::<_, Idiom>(&query)
            .bind(count)
            .fetch_all(pool)
            .await
    }

    /// Insert an idiom and its examples atomically.
    ///
    /// Returns `None` without writing anything when an idiom with the same id
    /// or text already exists.
    pub async fn create_with_examples(
        pool: &PgPool,
        input: &CreateIdiom,
    ) -> Result<Option<Idiom>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO idioms \
                (id, idiom, meaning_brief, meaning_full, description, published_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let idiom = sqlx::query_as::<_, Idiom>(&insert_query)
            .bind(&input.id)
            .bind(&input.idiom)
            .bind(&input.meaning_brief)
            .bind(&input.meaning_full)
            .bind(&input.description)
            .bind(input.published_at)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(mut idiom) = idiom else {
            return Ok(None);
        };

        Self::insert_examples(&mut tx, &idiom.id, &input.examples).await?;
        tx.commit().await?;

        idiom.examples = input.examples.clone();
        Ok(Some(idiom))
    }

    /// Replace meanings and all example rows of an idiom atomically.
    ///
    /// Returns `None` if no idiom with the given `id` exists.
    pub async fn replace_examples(
        pool: &PgPool,
        id: &str,
        input: &ReplaceIdiomExamples,
    ) -> Result<Option<Idiom>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let update_query = format!(
            "UPDATE idioms SET meaning_brief = $2, meaning_full = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let idiom = sqlx::query_as::<_, Idiom>(&update_query)
            .bind(id)
            .bind(&input.meaning_brief)
            .bind(&input.meaning_full)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(mut idiom) = idiom else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM idiom_examples WHERE idiom_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_examples(&mut tx, id, &input.examples).await?;
        tx.commit().await?;

        idiom.examples = input.examples.clone();
        Ok(Some(idiom))
    }

    /// Store a generated description and publish the idiom.
    pub async fn update_description(
        pool: &PgPool,
        id: &str,
        description: &str,
        published_at: Timestamp,
    ) -> Result<Option<Idiom>, sqlx::Error> {
        let query = format!(
            "UPDATE idioms SET description = $2, published_at = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Idiom>(&query)
            .bind(id)
            .bind(description)
            .bind(published_at)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_thumbnail_prompt(
        pool: &PgPool,
        id: &str,
        prompt: &str,
    ) -> Result<Option<Idiom>, sqlx::Error> {
        let query = format!(
            "UPDATE idioms SET thumbnail_prompt = $2 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Idiom>(&query)
            .bind(id)
            .bind(prompt)
            .fetch_optional(pool)
            .await
    }

    /// Point an idiom at a stored thumbnail key.
    /// Returns `None` if no idiom with the given `id` exists.
    pub async fn set_thumbnail(
        pool: &PgPool,
        id: &str,
        key: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<String>>(
            "UPDATE idioms SET thumbnail = $2 WHERE id = $1 RETURNING thumbnail",
        )
        .bind(id)
        .bind(key)
        .fetch_optional(pool)
        .await
        .map(Option::flatten)
    }

    /// Insert example rows in slice order.
    async fn insert_examples(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        idiom_id: &str,
        examples: &[String],
    ) -> Result<(), sqlx::Error> {
        if examples.is_empty() {
            return Ok(());
        }
        sqlx::query(
            "INSERT INTO idiom_examples (idiom_id, expression) \
             SELECT $1, e.expression \
             FROM UNNEST($2::text[]) WITH ORDINALITY AS e(expression, position) \
             ORDER BY e.position",
        )
        .bind(idiom_id)
        .bind(examples)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built page queries.
#[derive(Debug, Clone, PartialEq)]
enum BindValue {
    BigInt(i64),
    Text(String),
    Timestamp(Timestamp),
}

/// Build the two-level page query for `filter`.
///
/// Only the sort column and direction keywords are interpolated, and both
/// come from closed enums. Every user-supplied value is bound.
fn build_page_query(filter: &QueryFilter, thumbnail_only: bool) -> (String, Vec<BindValue>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    let column = filter.order_by.as_sql();

    if let Some(boundary) = filter.boundary() {
        conditions.push(format!("{column} {} ${bind_idx}", filter.operator().as_sql()));
        bind_idx += 1;
        bind_values.push(match boundary {
            BoundaryValue::Idiom(idiom) => BindValue::Text(idiom.clone()),
            BoundaryValue::CreatedAt(created_at) => BindValue::Timestamp(*created_at),
        });
    }

    if thumbnail_only {
        conditions.push("thumbnail IS NOT NULL".to_string());
    }

    let terms = filter.keyword_terms();
    if !terms.is_empty() {
        let mut matches = Vec::with_capacity(terms.len());
        for term in terms {
            matches.push(format!("idiom ILIKE ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::Text(contains_pattern(term)));
        }
        conditions.push(format!("({})", matches.join(" OR ")));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {} ", conditions.join(" AND "))
    };

    let inner = filter.inner_direction().as_sql();
    let outer = filter.order_direction.as_sql();
    let query = format!(
        "SELECT {COLUMNS} FROM (\
            SELECT {COLUMNS} FROM idioms {where_clause}\
            ORDER BY {column} {inner}, num_id {inner} \
            LIMIT ${bind_idx}\
         ) AS page \
         ORDER BY {column} {outer}, num_id {outer}"
    );
    bind_values.push(BindValue::BigInt(filter.count));

    (query, bind_values)
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_idiom_values<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

#[cfg(test)]
mod tests {
    use idioms_core::pagination::cursor::Cursor;
    use idioms_core::pagination::filter::ListParams;
    use idioms_core::pagination::{SortColumn, SortDirection};

    use super::*;

    const SELECT: &str = "SELECT id, idiom, meaning_brief, meaning_full, description, \
        thumbnail, thumbnail_prompt, created_at, published_at, num_id";

    #[test]
    fn first_page_has_no_predicates() {
        let filter = QueryFilter::first_page(SortColumn::CreatedAt, SortDirection::Desc, 20);
        let (query, binds) = build_page_query(&filter, false);

        assert_eq!(
            query,
            format!(
                "{SELECT} FROM ({SELECT} FROM idioms ORDER BY created_at DESC, num_id DESC LIMIT $1) \
                 AS page ORDER BY created_at DESC, num_id DESC"
            )
        );
        assert_eq!(binds, vec![BindValue::BigInt(20)]);
    }

    #[test]
    fn previous_cursor_reverses_inner_order_only() {
        let cursor = Cursor::new(BoundaryValue::Idiom("m".into()), false);
        let filter = QueryFilter::first_page(SortColumn::Idiom, SortDirection::Desc, 5).with_cursor(cursor);
        let (query, binds) = build_page_query(&filter, true);

        assert!(query.contains("WHERE idiom > $1 AND thumbnail IS NOT NULL ORDER BY idiom ASC, num_id ASC LIMIT $2"));
        assert!(query.ends_with("AS page ORDER BY idiom DESC, num_id DESC"));
        assert_eq!(binds, vec![BindValue::Text("m".into()), BindValue::BigInt(5)]);
    }

    #[test]
    fn keyword_terms_are_or_combined_and_bound() {
        let params = ListParams {
            keyword: Some("a piece of_cake".into()),
            ..Default::default()
        };
        let filter = QueryFilter::build(&params, 10);
        let (query, binds) = build_page_query(&filter, false);

        assert!(query.contains("WHERE (idiom ILIKE $1 OR idiom ILIKE $2) ORDER BY"));
        assert!(query.contains("LIMIT $3)"));
        assert_eq!(
            binds,
            vec![
                BindValue::Text("%piece%".into()),
                BindValue::Text("%of\\_cake%".into()),
                BindValue::BigInt(10),
            ]
        );
    }

    #[test]
    fn short_keywords_add_no_predicate() {
        let filter = QueryFilter::first_page(SortColumn::CreatedAt, SortDirection::Asc, 10).with_keyword("a b");
        let (query, _) = build_page_query(&filter, false);
        assert!(!query.contains("ILIKE"));
        assert!(!query.contains("WHERE"));
    }

    #[test]
    fn keyword_and_boundary_are_anded() {
        let at = chrono::Utc::now();
        let cursor = Cursor::new(BoundaryValue::CreatedAt(at), true);
        let filter = QueryFilter::first_page(SortColumn::CreatedAt, SortDirection::Asc, 10)
            .with_cursor(cursor)
            .with_keyword("beans");
        let (query, binds) = build_page_query(&filter, true);

        assert!(query.contains(
            "WHERE created_at > $1 AND thumbnail IS NOT NULL AND (idiom ILIKE $2) ORDER BY created_at ASC"
        ));
        assert_eq!(binds[0], BindValue::Timestamp(at));
    }
}
