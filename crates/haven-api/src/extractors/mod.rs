//! Axum extractors for authentication and client metadata.

pub mod auth;
pub mod client;

pub use auth::CurrentUser;
pub use client::ClientMeta;
