/// Postgres-backed email/password accounts.
///
/// The provider keeps the signed-in account for this process in memory, the
/// way a client SDK holds its current user.
use super::AuthProvider;
use crate::config::AuthConfig;
use crate::domain::{ProfileUpdate, UserProfile};
use crate::error::{AuthFailure, ServiceResult};
use crate::security::password;
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    uid: String,
    email: String,
    password_hash: String,
    display_name: Option<String>,
    photo_url: Option<String>,
}

impl From<AccountRow> for UserProfile {
    fn from(row: AccountRow) -> Self {
        UserProfile {
            uid: row.uid,
            email: row.email,
            display_name: row.display_name,
            photo_url: row.photo_url,
        }
    }
}

pub struct PgAuthProvider {
    pool: PgPool,
    rules: AuthConfig,
    session: RwLock<Option<UserProfile>>,
}

impl PgAuthProvider {
    pub fn new(pool: PgPool, rules: AuthConfig) -> Self {
        Self {
            pool,
            rules,
            session: RwLock::new(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<AccountRow>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT uid, email, password_hash, display_name, photo_url
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl AuthProvider for PgAuthProvider {
    async fn create_account(&self, email: &str, pw: &str) -> ServiceResult<UserProfile> {
        password::validate_credentials(email, pw, &self.rules)?;

        let email = password::normalize_email(email);
        let password_hash = password::hash_password(pw)?;

        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (uid, email, password_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING uid, email, password_hash, display_name, photo_url
            "#,
        )
        .bind(Uuid::new_v4().simple().to_string())
        .bind(&email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthFailure::EmailAlreadyInUse)?;

        let profile = UserProfile::from(row);
        *self.session.write().await = Some(profile.clone());
        Ok(profile)
    }

    async fn sign_in(&self, email: &str, pw: &str) -> ServiceResult<UserProfile> {
        let row = self
            .find_by_email(&password::normalize_email(email))
            .await?
            .ok_or(AuthFailure::InvalidCredentials)?;

        if !password::verify_password(pw, &row.password_hash)? {
            return Err(AuthFailure::InvalidCredentials.into());
        }

        let profile = UserProfile::from(row);
        *self.session.write().await = Some(profile.clone());
        Ok(profile)
    }

    async fn sign_out(&self) -> ServiceResult<()> {
        *self.session.write().await = None;
        Ok(())
    }

    async fn current_user(&self) -> Option<UserProfile> {
        self.session.read().await.clone()
    }

    async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> ServiceResult<UserProfile> {
        // COALESCE keeps the stored value for fields the update leaves alone
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE accounts
            SET display_name = COALESCE($2, display_name),
                photo_url = CASE WHEN $3 THEN $4 ELSE photo_url END,
                updated_at = NOW()
            WHERE uid = $1
            RETURNING uid, email, password_hash, display_name, photo_url
            "#,
        )
        .bind(uid)
        .bind(update.display_name.as_deref())
        .bind(update.photo_url.is_some())
        .bind(update.photo_url.clone().flatten())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthFailure::UserNotFound)?;

        let profile = UserProfile::from(row);
        let mut session = self.session.write().await;
        if session.as_ref().map(|current| current.uid == uid).unwrap_or(false) {
            *session = Some(profile.clone());
        }
        Ok(profile)
    }
}
