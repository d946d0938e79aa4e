//! Domain models for repofetch.
//!
//! ## Submodules
//!
//! - [`repository`] - The repository descriptor returned by remote hosts

mod repository;

pub use repository::Repository;
