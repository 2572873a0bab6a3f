//! Shared frontend utilities for API access, configuration, and errors.
//!
//! Centralizing these helpers keeps network behavior consistent and avoids
//! duplicated logic in features. These utilities do not handle secrets
//! directly, but callers must still avoid logging credential material.

#[cfg(target_arch = "wasm32")]
pub mod api;
pub mod config;
pub mod errors;

pub const GIT_COMMIT_HASH: &str = env!("IDM_WEB_GIT_SHA");

#[cfg(target_arch = "wasm32")]
pub use api::{
    get_empty_with_headers, get_json_with_headers, post_json_capturing_header,
    post_json_with_headers_response,
};
pub use errors::AppError;
