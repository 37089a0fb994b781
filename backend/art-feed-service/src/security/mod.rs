pub mod password;

pub use password::{hash_password, normalize_email, validate_credentials, verify_password};
