//! HTTP API server for Hoard.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{RouterOptions, create_router};
pub use state::AppState;
