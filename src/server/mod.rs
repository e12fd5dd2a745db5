//! HTTP Server Module
//!
//! Exposes the store over HTTP:
//!
//! | Route | Operation |
//! |---|---|
//! | `GET/PUT/DELETE /key/{*name}` | point read, write, delete |
//! | `GET /iterate` | one page of a range scan |
//! | `POST /batch` | atomic batch of puts and deletes |
//! | `GET /property/{name}` | engine property lookup |
//! | `POST /snapshot` | point-in-time export to a new store |
//!
//! ## Architecture
//! - axum router on a multi-threaded tokio runtime
//! - Store calls on the blocking pool
//! - Errors mapped to status codes in one place ([`ApiError`])

mod error;
mod handlers;
mod request;
mod response;
mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use request::{BatchBody, IterateParams, SnapshotBody};
pub use response::{IterateEntry, IterateResponse};
pub use server::{build_router, Server};
