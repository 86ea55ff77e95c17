//! Videostore API Library
//!
//! This crate provides the HTTP handlers, middleware, the file service and
//! application setup.

mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
pub mod services;
pub mod setup;
mod telemetry;
mod utils;

pub mod error;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use services::FileService;
pub use state::AppState;
