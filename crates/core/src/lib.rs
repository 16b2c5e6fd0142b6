//! Domain logic for the idioms service.
//!
//! Everything here is free of I/O so it can be shared by the repository
//! layer, the generation pipeline and the HTTP handlers.

pub mod error;
pub mod generation;
pub mod idiom_id;
pub mod pagination;
pub mod search;
pub mod thumbnail;
pub mod types;
