//! Content generation pipeline.
//!
//! [`generator::IdiomGenerator`] turns queued inputs into published idioms
//! and regenerates content for existing ones; [`thumbnail::ThumbnailService`]
//! stores thumbnail images and assigns them to idioms.

pub mod error;
pub mod generator;
pub mod thumbnail;

pub use error::PipelineError;
