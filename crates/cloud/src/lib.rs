//! Clients for the external services the idioms backend depends on: an
//! OpenAI-compatible text/image generation API and S3-compatible object
//! storage for thumbnails.
//!
//! Each client sits behind an `async_trait` seam so the pipeline and the
//! HTTP layer can be exercised with in-process fakes.

pub mod openai;
pub mod storage;
