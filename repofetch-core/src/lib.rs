// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `repofetch` Core
//!
//! Core types, models, and traits shared by the `repofetch` crates.
//!
//! - [`Repository`] - The repository descriptor
//! - [`CoreError`] - Errors surfaced to repository readers
//! - [`RepositoryBackend`] - Trait for anything that can read a repository
//! - [`RepositoryService`] - Read-through service over a backend

pub mod error;
pub mod models;
pub mod service;
pub mod traits;

pub use error::CoreError;
pub use models::Repository;
pub use service::RepositoryService;
pub use traits::RepositoryBackend;
