//! Handlers for the admin-only `/idioms` endpoints.
//!
//! Every handler takes [`RequireAdmin`], so a missing or non-admin token is
//! rejected with 401/403 before any work happens. Past that point the
//! handlers keep the public contract: `200 OK` with `null` payload fields on
//! failure.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use idioms_core::error::CoreError;
use idioms_core::pagination::filter::ListParams;
use idioms_db::models::idiom::ReplaceIdiomExamples;
use idioms_db::models::idiom_input::CreateIdiomInput;
use idioms_db::repositories::{IdiomInputRepo, IdiomRepo};
use serde::Deserialize;
use validator::Validate;

use super::idioms::{load_page, resolve_filter};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::{
    or_null, DescriptionResponse, DraftResponse, IdiomPage, IdiomResponse, InsertedRows,
    ThumbnailPromptResponse, ThumbnailResponse,
};
use crate::state::AppState;

/// Body of `POST /idioms/thumbnail/url`. `imageUrl` is base64 encoded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailUrlRequest {
    pub idiom_id: String,
    pub image_url: String,
}

/// Body of `POST /idioms/{id}/thumbnail`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailPromptRequest {
    pub thumbnail_prompt: String,
}

/// Body of `POST /idioms/thumbnail/draft`.
#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub prompt: String,
}

/// Query of `POST /idioms/{id}/examples`.
#[derive(Debug, Default, Deserialize)]
pub struct RegenerateParams {
    /// Steers the regenerated meaning; defaults to the current brief meaning.
    pub meaning: Option<String>,
}

// ---------------------------------------------------------------------------
// Listing and ingestion
// ---------------------------------------------------------------------------

/// GET /idioms/admin
///
/// Paginated listing without the thumbnail restriction.
pub async fn list_all_idioms(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Json<IdiomPage> {
    let mut filter = resolve_filter(params, state.config.listing.admin_page_size);
    filter.keyword = None;
    Json(load_page(&state, &filter, false, "admin list idioms").await)
}

/// POST /idioms/inputs
///
/// Enqueue idioms for generation. Returns the number of new rows; inputs
/// whose id is already queued are skipped.
pub async fn create_inputs(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    payload: Result<Json<Vec<CreateIdiomInput>>, JsonRejection>,
) -> Json<InsertedRows> {
    let result = async {
        let Json(inputs) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
        insert_inputs(&state, &inputs).await
    }
    .await;

    let rows = or_null(result, "create idiom inputs");
    if let Some(rows) = rows {
        tracing::info!(subject = %admin.subject, rows, "Idiom inputs enqueued");
    }
    Json(InsertedRows { rows })
}

async fn insert_inputs(state: &AppState, inputs: &[CreateIdiomInput]) -> AppResult<u64> {
    for input in inputs {
        input
            .validate()
            .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;
    }
    Ok(IdiomInputRepo::create_many(&state.pool, inputs).await?)
}

// ---------------------------------------------------------------------------
// Thumbnails
// ---------------------------------------------------------------------------

/// Parts of a `multipart/form-data` thumbnail upload.
#[derive(Debug, Default)]
struct ThumbnailUpload {
    idiom_id: Option<String>,
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Option<Vec<u8>>,
}

/// POST /idioms/thumbnail/file
///
/// Multipart form with an `idiomId` field and a `thumbnail` file.
pub async fn upload_thumbnail_file(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Json<ThumbnailResponse> {
    let upload = or_null(read_upload(&mut multipart).await, "read thumbnail form")
        .unwrap_or_default();
    let idiom_id = upload.idiom_id.clone().unwrap_or_default();

    let thumbnail = or_null(store_upload(&state, upload).await, "upload thumbnail").flatten();
    Json(ThumbnailResponse {
        idiom_id,
        thumbnail,
    })
}

async fn read_upload(multipart: &mut Multipart) -> AppResult<ThumbnailUpload> {
    let mut upload = ThumbnailUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("idiomId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                upload.idiom_id = Some(text.trim().to_string());
            }
            Some("thumbnail") => {
                upload.filename = field.file_name().map(str::to_string);
                upload.content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                upload.bytes = Some(data.to_vec());
            }
            _ => {}
        }
    }

    Ok(upload)
}

async fn store_upload(state: &AppState, upload: ThumbnailUpload) -> AppResult<Option<String>> {
    let idiom_id = upload
        .idiom_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing idiomId field".into()))?;
    let bytes = upload
        .bytes
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing thumbnail file".into()))?;

    Ok(state
        .thumbnails
        .upload(
            &idiom_id,
            upload.filename.as_deref(),
            upload.content_type.as_deref(),
            bytes,
        )
        .await?)
}

/// POST /idioms/thumbnail/url
///
/// Download the image behind the base64-encoded `imageUrl` and assign it.
pub async fn upload_thumbnail_url(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    payload: Result<Json<ThumbnailUrlRequest>, JsonRejection>,
) -> Json<ThumbnailResponse> {
    let request = or_null(
        payload.map_err(|e| AppError::BadRequest(e.body_text())),
        "read thumbnail url request",
    );
    let Some(Json(request)) = request else {
        return Json(ThumbnailResponse {
            idiom_id: String::new(),
            thumbnail: None,
        });
    };

    let result = async {
        let url = decode_image_url(&request.image_url)?;
        Ok::<_, AppError>(state.thumbnails.upload_from_url(&request.idiom_id, &url).await?)
    }
    .await;

    Json(ThumbnailResponse {
        thumbnail: or_null(result, "thumbnail from url").flatten(),
        idiom_id: request.idiom_id,
    })
}

/// POST /idioms/{id}/thumbnail
///
/// Store the prompt used to generate the idiom's thumbnail.
pub async fn update_thumbnail_prompt(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ThumbnailPromptRequest>, JsonRejection>,
) -> Json<ThumbnailPromptResponse> {
    let result = async {
        let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
        let updated = IdiomRepo::update_thumbnail_prompt(&state.pool, &id, &request.thumbnail_prompt)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::NotFound {
                    entity: "Idiom",
                    id: id.clone(),
                })
            })?;
        Ok::<_, AppError>(updated.thumbnail_prompt)
    }
    .await;

    Json(ThumbnailPromptResponse {
        thumbnail_prompt: or_null(result, "update thumbnail prompt").flatten(),
        idiom_id: id,
    })
}

/// POST /idioms/thumbnail/draft
///
/// Generate an image from a prompt into the shared draft slot.
pub async fn generate_draft(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    payload: Result<Json<DraftRequest>, JsonRejection>,
) -> Json<DraftResponse> {
    let result = async {
        let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
        if request.prompt.trim().is_empty() {
            return Err(AppError::Core(CoreError::Validation("Empty prompt".into())));
        }
        Ok::<_, AppError>(state.thumbnails.generate_draft(request.prompt.trim()).await?)
    }
    .await;

    Json(DraftResponse {
        image: or_null(result, "generate draft thumbnail"),
    })
}

// ---------------------------------------------------------------------------
// Examples and description
// ---------------------------------------------------------------------------

/// POST /idioms/{id}/examples
///
/// Regenerate meanings and examples through the generation API.
pub async fn regenerate_examples(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<RegenerateParams>, QueryRejection>,
) -> Json<IdiomResponse> {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let result = state
        .generator
        .regenerate_examples(&id, params.meaning.as_deref())
        .await
        .map_err(AppError::from);

    Json(IdiomResponse {
        idiom: or_null(result, "regenerate examples"),
    })
}

/// PUT /idioms/{id}/examples
///
/// Replace meanings and examples with the supplied ones.
pub async fn replace_examples(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ReplaceIdiomExamples>, JsonRejection>,
) -> Json<IdiomResponse> {
    let result = async {
        let Json(replacement) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok::<_, AppError>(IdiomRepo::replace_examples(&state.pool, &id, &replacement).await?)
    }
    .await;

    Json(IdiomResponse {
        idiom: or_null(result, "replace examples").flatten(),
    })
}

/// POST /idioms/{id}/description
///
/// Generate a description and publish the idiom.
pub async fn generate_description(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<DescriptionResponse> {
    let result = state
        .generator
        .generate_description(&id)
        .await
        .map_err(AppError::from);

    Json(DescriptionResponse {
        description: or_null(result, "generate description").and_then(|idiom| idiom.description),
        id,
    })
}

// ---- private helpers ----

/// Decode a base64 image URL (standard or URL-safe alphabet).
fn decode_image_url(encoded: &str) -> AppResult<String> {
    let encoded = encoded.trim();
    let bytes = STANDARD
        .decode(encoded)
        .or_else(|_| URL_SAFE.decode(encoded))
        .map_err(|e| AppError::BadRequest(format!("imageUrl is not valid base64: {e}")))?;
    let url = String::from_utf8(bytes)
        .map_err(|_| AppError::BadRequest("imageUrl is not valid UTF-8".into()))?;

    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AppError::BadRequest("imageUrl must be an http(s) URL".into()));
    }
    Ok(url.to_string())
}
