/// Password hashing and verification using Argon2id
use crate::config::AuthConfig;
use crate::error::{AuthFailure, ServiceError, ServiceResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::ValidateEmail;

/// Hash a password using Argon2id with a random per-password salt.
///
/// Returns a PHC-formatted string safe for storage.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServiceError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its PHC hash.
///
/// `Ok(false)` means the password is wrong; `Err` means the stored hash is unusable.
pub fn verify_password(password: &str, password_hash: &str) -> ServiceResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| ServiceError::Internal(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ServiceError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// Check an email/password pair before an account is created.
pub fn validate_credentials(email: &str, password: &str, rules: &AuthConfig) -> ServiceResult<()> {
    if !normalize_email(email).validate_email() {
        return Err(AuthFailure::InvalidEmail.into());
    }

    if password.chars().count() < rules.min_password_length {
        return Err(AuthFailure::WeakPassword(format!(
            "Password must be at least {} characters",
            rules.min_password_length
        ))
        .into());
    }

    Ok(())
}

/// Emails are compared case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
