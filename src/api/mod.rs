//! HTTP client for the MySodexo JSON API.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
