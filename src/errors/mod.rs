//! HTTP error types shared by the REST handlers.

pub mod app_error;

pub use app_error::{AppError, AppResult};
