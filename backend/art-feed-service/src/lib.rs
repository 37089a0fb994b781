/// Art Feed Service Library
///
/// Data-access layer for the art feed: image posts with likes and comments,
/// plus email/password accounts. Every operation goes through an explicitly
/// constructed [`backend::BackendClient`], which can be the in-memory backend
/// or the managed one (Postgres documents, S3 images, Postgres accounts).
///
/// # Modules
///
/// - `backend`: document/blob/auth ports and their implementations
/// - `repository`: posts and comments collections
/// - `services`: image upload, auth session, profile picture, feed conventions
/// - `domain`: stored document shapes
/// - `security`: password hashing and credential rules
/// - `error`: error types
/// - `config`: configuration management
pub mod backend;
pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod security;
pub mod services;

pub use backend::BackendClient;
pub use config::Config;
pub use error::{ServiceError, ServiceResult};
