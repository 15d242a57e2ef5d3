//! # haven-api
//!
//! HTTP API layer for Haven built on Axum.
//!
//! Routes, DTOs, extractors, guards, and the mapping from domain errors
//! to HTTP responses. All state lives in [`AppState`]; handlers receive
//! it through Axum's `State` extractor.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
