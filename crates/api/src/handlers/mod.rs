pub mod admin;
pub mod idioms;
