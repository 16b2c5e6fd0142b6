//! Handlers for the public `/idioms` endpoints.
//!
//! All of them answer `200 OK`; failures are logged and produce `null`
//! payload fields.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use idioms_core::pagination::cursor::encode_page;
use idioms_core::pagination::filter::{ListParams, QueryFilter};
use idioms_db::models::idiom::Idiom;
use idioms_db::repositories::IdiomRepo;

use crate::error::{AppError, AppResult};
use crate::response::{or_null, IdiomList, IdiomPage, IdiomResponse, PageCursor};
use crate::state::AppState;

/// GET /idioms
///
/// Thumbnail-bearing idioms, keyset paginated.
pub async fn list_idioms(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Json<IdiomPage> {
    let mut filter = resolve_filter(params, state.config.listing.public_page_size);
    filter.keyword = None;
    Json(load_page(&state, &filter, true, "list idioms").await)
}

/// GET /idioms/search
///
/// Like [`list_idioms`], narrowed by the `keyword` terms.
pub async fn search_idioms(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Json<IdiomPage> {
    let filter = resolve_filter(params, state.config.listing.search_page_size);
    Json(load_page(&state, &filter, true, "search idioms").await)
}

/// GET /idioms/featured
pub async fn featured_idioms(State(state): State<AppState>) -> Json<IdiomList> {
    let result = IdiomRepo::featured(&state.pool, state.config.listing.featured_page_size)
        .await
        .map_err(AppError::from);
    Json(IdiomList {
        idioms: or_null(result, "featured idioms"),
    })
}

/// GET /idioms/{id}
///
/// The idiom with its examples, or `{"idiom": null}`.
pub async fn get_idiom(State(state): State<AppState>, Path(id): Path<String>) -> Json<IdiomResponse> {
    let result = IdiomRepo::find_with_examples(&state.pool, &id)
        .await
        .map_err(AppError::from);
    Json(IdiomResponse {
        idiom: or_null(result, "get idiom").flatten(),
    })
}

/// GET /idioms/{id}/related
///
/// Thumbnail-bearing neighbours in publish order, newest first.
pub async fn related_idioms(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<IdiomList> {
    let result = IdiomRepo::related(&state.pool, &id, state.config.listing.related_per_side)
        .await
        .map_err(AppError::from);
    Json(IdiomList {
        idioms: or_null(result, "related idioms"),
    })
}

// ---------------------------------------------------------------------------
// Shared with the admin listing
// ---------------------------------------------------------------------------

/// Resolve query parameters into a plan. Unreadable parameters and unusable
/// tokens fall back to the first page with defaults.
pub(crate) fn resolve_filter(
    params: Result<Query<ListParams>, QueryRejection>,
    default_count: i64,
) -> QueryFilter {
    let params = params
        .map(|Query(params)| params)
        .unwrap_or_else(|rejection| {
            tracing::debug!(error = %rejection, "Unreadable listing parameters, using defaults");
            ListParams::default()
        });

    let filter = QueryFilter::build(&params, default_count);
    if let Some(e) = filter.cursor_error() {
        tracing::debug!(error = %e, "Ignoring pagination token");
    }
    filter
}

/// Run the paged query and attach the surrounding tokens. Empty pages carry
/// no tokens.
pub(crate) async fn load_page(
    state: &AppState,
    filter: &QueryFilter,
    thumbnail_only: bool,
    operation: &'static str,
) -> IdiomPage {
    match or_null(fetch_page(state, filter, thumbnail_only).await, operation) {
        Some((idioms, cursor)) => IdiomPage {
            idioms: Some(idioms),
            cursor,
        },
        None => IdiomPage::empty(),
    }
}

async fn fetch_page(
    state: &AppState,
    filter: &QueryFilter,
    thumbnail_only: bool,
) -> AppResult<(Vec<Idiom>, PageCursor)> {
    let idioms = IdiomRepo::list_page(&state.pool, filter, thumbnail_only).await?;
    let cursor = encode_page(&idioms, filter.order_by)
        .map(PageCursor::from)
        .unwrap_or_default();
    Ok((idioms, cursor))
}
