//! Route definitions for the `/idioms` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{admin, idioms};
use crate::state::AppState;

/// Public read-only routes.
///
/// ```text
/// GET /idioms                 -> list_idioms
/// GET /idioms/search          -> search_idioms
/// GET /idioms/featured        -> featured_idioms
/// GET /idioms/{id}            -> get_idiom
/// GET /idioms/{id}/related    -> related_idioms
/// ```
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/idioms", get(idioms::list_idioms))
        .route("/idioms/search", get(idioms::search_idioms))
        .route("/idioms/featured", get(idioms::featured_idioms))
        .route("/idioms/{id}", get(idioms::get_idiom))
        .route("/idioms/{id}/related", get(idioms::related_idioms))
}

/// Admin routes. Each handler also requires an admin token.
///
/// ```text
/// GET  /idioms/admin              -> list_all_idioms
/// POST /idioms/inputs             -> create_inputs
/// POST /idioms/thumbnail/file     -> upload_thumbnail_file
/// POST /idioms/thumbnail/url      -> upload_thumbnail_url
/// POST /idioms/thumbnail/draft    -> generate_draft
/// POST /idioms/{id}/thumbnail     -> update_thumbnail_prompt
/// POST /idioms/{id}/examples      -> regenerate_examples
/// PUT  /idioms/{id}/examples      -> replace_examples
/// POST /idioms/{id}/description   -> generate_description
/// ```
pub fn admin_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/idioms/admin", get(admin::list_all_idioms))
        .route("/idioms/inputs", post(admin::create_inputs))
        .route("/idioms/thumbnail/file", post(admin::upload_thumbnail_file))
        .route("/idioms/thumbnail/url", post(admin::upload_thumbnail_url))
        .route("/idioms/thumbnail/draft", post(admin::generate_draft))
        .route("/idioms/{id}/thumbnail", post(admin::update_thumbnail_prompt))
        .route(
            "/idioms/{id}/examples",
            post(admin::regenerate_examples).put(admin::replace_examples),
        )
        .route("/idioms/{id}/description", post(admin::generate_description))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
