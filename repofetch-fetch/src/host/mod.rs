//! Host implementations of [`FetchTarget`](crate::FetchTarget).
//!
//! - [`http`] - HTTP target with URL templates and domain allowlist

pub mod http;

pub use http::HttpTarget;
