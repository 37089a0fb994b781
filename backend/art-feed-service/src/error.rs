/// Error types for art-feed-service
use thiserror::Error;

/// Rejections raised by the auth provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("email address is already registered")]
    EmailAlreadyInUse,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("password is too weak: {0}")]
    WeakPassword(String),

    #[error("invalid email address")]
    InvalidEmail,

    #[error("no authenticated session")]
    NoSession,

    #[error("user not found")]
    UserNotFound,
}

impl AuthFailure {
    /// Stable error code, logged alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthFailure::InvalidCredentials => "auth/invalid-credential",
            AuthFailure::WeakPassword(_) => "auth/weak-password",
            AuthFailure::InvalidEmail => "auth/invalid-email",
            AuthFailure::NoSession => "auth/no-current-user",
            AuthFailure::UserNotFound => "auth/user-not-found",
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Auth error ({code}): {0}", code = .0.code())]
    Auth(#[from] AuthFailure),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Short machine-readable category for log fields
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Database(_) | ServiceError::Migration(_) => "database",
            ServiceError::Storage(_) => "storage",
            ServiceError::Io(_) => "io",
            ServiceError::Serialization(_) => "serialization",
            ServiceError::Auth(failure) => failure.code(),
            ServiceError::NotFound(_) => "not-found",
            ServiceError::InvalidInput(_) => "invalid-input",
            ServiceError::Unavailable(_) => "unavailable",
            ServiceError::Internal(_) => "internal",
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
