//! HTTP API: `POST /embed`, `POST /compare`, `GET /health`.
pub mod errors;
pub mod handlers;
pub mod server;
pub mod types;

pub use errors::{ApiError, ErrorResponse};
pub use server::{ApiContext, ApiServer};
