use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use idioms_api::auth::jwt::{generate_access_token, JwtConfig};
use idioms_api::config::{GenerationTaskConfig, ListingConfig, ServerConfig, StorageConfig};
use idioms_api::router::build_app_router;
use idioms_api::state::AppState;
use idioms_cloud::openai::{ImageGenerator, OpenAiConfig, OpenAiError, TextGenerator};
use idioms_cloud::storage::{FetchedImage, ImageSource, InMemoryStorage, StorageError};
use idioms_core::generation::ChatPrompt;
use idioms_pipeline::generator::IdiomGenerator;
use idioms_pipeline::thumbnail::ThumbnailService;
use sqlx::PgPool;
use tower::ServiceExt;

const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with admin routes enabled and small pages.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        admin_enabled: true,
        max_upload_bytes: 1024 * 1024,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        listing: ListingConfig {
            public_page_size: 2,
            admin_page_size: 2,
            search_page_size: 2,
            featured_page_size: 3,
            related_per_side: 4,
        },
        generation: GenerationTaskConfig {
            enabled: false,
            interval: Duration::from_secs(60),
        },
        openai: OpenAiConfig::default(),
        storage: StorageConfig::default(),
    }
}

// ---------------------------------------------------------------------------
// Fakes for external collaborators
// ---------------------------------------------------------------------------

/// Always answers with the same completion.
pub struct CannedText(pub String);

#[async_trait::async_trait]
impl TextGenerator for CannedText {
    async fn complete(&self, _prompt: &ChatPrompt) -> Result<String, OpenAiError> {
        Ok(self.0.clone())
    }
}

/// Fails every completion as if the API were down.
pub struct UnavailableText;

#[async_trait::async_trait]
impl TextGenerator for UnavailableText {
    async fn complete(&self, _prompt: &ChatPrompt) -> Result<String, OpenAiError> {
        Err(OpenAiError::ApiError {
            status: 503,
            body: "unavailable".into(),
        })
    }
}

pub struct FixedImage;

#[async_trait::async_trait]
impl ImageGenerator for FixedImage {
    async fn generate_image(&self, _prompt: &str) -> Result<String, OpenAiError> {
        Ok("https://images.test/generated.png".to_string())
    }
}

/// Serves a tiny PNG for any URL.
pub struct PngSource;

#[async_trait::async_trait]
impl ImageSource for PngSource {
    async fn fetch(&self, _url: &str) -> Result<FetchedImage, StorageError> {
        Ok(FetchedImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            content_type: Some("image/png".to_string()),
        })
    }
}

/// A completion that satisfies every generation prompt.
pub fn canned_completion() -> String {
    r#"{"idiom":"Hit the hay","meaningBrief":"To go to bed.","meaningFull":"To go to bed in order to sleep.","description":"A farmer yawns and heads upstairs.","examples":["I'm going to hit the hay.","She hit the hay at nine."]}"#
        .to_string()
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// Handles on the fakes behind a test app.
pub struct TestApp {
    pub router: Router,
    pub storage: Arc<InMemoryStorage>,
}

/// Build the full application router over `pool` with a canned generator.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Arc::new(CannedText(canned_completion())), test_config()).router
}

/// Build the full application router with a custom text generator and config.
pub fn build_test_app_with(
    pool: PgPool,
    text: Arc<dyn TextGenerator>,
    config: ServerConfig,
) -> TestApp {
    let storage = Arc::new(InMemoryStorage::new());
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        generator: Arc::new(IdiomGenerator::new(pool.clone(), text)),
        thumbnails: Arc::new(ThumbnailService::new(
            pool,
            storage.clone(),
            Arc::new(FixedImage),
            Arc::new(PngSource),
        )),
    };

    TestApp {
        router: build_app_router(state, &config),
        storage,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// A valid `Authorization` header value for the given role.
pub fn bearer(role: &str) -> String {
    let token = generate_access_token("tester", role, &test_config().jwt).unwrap();
    format!("Bearer {token}")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_as_admin(app: Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", bearer("admin"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a JSON body with the given method, optionally as `role`.
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    role: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(role) = role {
        builder = builder.header("authorization", bearer(role));
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
