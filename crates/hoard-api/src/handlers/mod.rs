//! Request handlers organized by resource.

pub mod cache;
pub mod health;
pub mod upload;
