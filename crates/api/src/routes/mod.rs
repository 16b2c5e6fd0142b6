pub mod health;
pub mod idioms;

use axum::Router;

use crate::state::AppState;

/// Build the content route tree. Admin routes are only mounted when
/// `admin_enabled` is set.
///
/// Route hierarchy:
///
/// ```text
/// /idioms                         list (thumbnail only)
/// /idioms/search                  keyword search
/// /idioms/featured                latest with thumbnail
/// /idioms/{id}                    single idiom with examples
/// /idioms/{id}/related            neighbours in publish order
///
/// /idioms/admin                   list, no thumbnail filter        (admin)
/// /idioms/inputs                  enqueue inputs (POST)            (admin)
/// /idioms/thumbnail/file          multipart upload (POST)          (admin)
/// /idioms/thumbnail/url           import by URL (POST)             (admin)
/// /idioms/thumbnail/draft         draft from prompt (POST)         (admin)
/// /idioms/{id}/thumbnail          thumbnail prompt (POST)          (admin)
/// /idioms/{id}/examples           regenerate (POST), replace (PUT) (admin)
/// /idioms/{id}/description        generate (POST)                  (admin)
/// ```
pub fn api_routes(admin_enabled: bool, max_upload_bytes: usize) -> Router<AppState> {
    let router = Router::new().merge(idioms::public_router());
    if admin_enabled {
        router.merge(idioms::admin_router(max_upload_bytes))
    } else {
        router
    }
}
