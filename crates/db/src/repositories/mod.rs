//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod idiom_input_repo;
pub mod idiom_repo;

pub use idiom_input_repo::IdiomInputRepo;
pub use idiom_repo::IdiomRepo;
