//! Remote source adapter for achievement showcase repositories.
//!
//! `RemoteSource` is the seam the load pipeline talks to. `GithubClient`
//! implements it over `raw.githubusercontent.com` for file contents and the
//! GitHub REST API for directory listings and repository metadata.

pub mod client;
pub mod error;
pub mod source;

pub use client::GithubClient;
pub use error::ApiError;
pub use source::{ItemPayload, RemoteSource};
